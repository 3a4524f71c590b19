//! Storage layer abstraction trait definition

mod key_value_store;
mod storage_observer;

pub use key_value_store::{InMemoryKeyValueStore, KeyValueStore};
pub use storage_observer::{NoopStorageObserver, StorageObserver};

// Re-export the geocoding abstraction so callers need only this crate
pub use postcard_geocoder::Geocoder;
