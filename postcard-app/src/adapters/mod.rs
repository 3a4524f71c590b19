//! Platform-agnostic storage adapters for desktop and CLI frontends.

mod json_file_store;

pub use json_file_store::JsonFileStore;

#[cfg(feature = "sqlite-store")]
mod sqlite;

#[cfg(feature = "sqlite-store")]
pub use sqlite::SqliteStore;
