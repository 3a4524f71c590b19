//! Postcard Tracker Core Library
//!
//! Client-side persistent data layer for the postcard tracker, including:
//! - Typed persistent values over an injected key-value store (`PersistentValueStore`)
//! - Location geocoding with a persisted cache (`GeocodeCache`)
//! - The postcard collection with its one-time seed migration (`PostcardRepository`)
//! - The create/edit workflow (`PostcardService`)
//!
//! This library is platform-independent: durable storage is abstracted behind
//! `KeyValueStore`, geocoding behind `Geocoder`. When a platform has no
//! durable storage, pass `StorageHandle::unavailable()` and everything keeps
//! working in memory.

pub mod error;
pub mod services;
pub mod traits;
pub mod types;
pub mod utils;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult};
pub use services::{
    GeocodeCache, MigrationResult, PersistentValueStore, PostcardRepository, PostcardService,
    ServiceContext, StorageHandle, StorageKeys,
};
pub use traits::{Geocoder, InMemoryKeyValueStore, KeyValueStore, StorageObserver};
