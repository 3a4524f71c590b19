//! 通用持久化值存储
//!
//! Typed JSON values on top of a `KeyValueStore`, with default-on-first-use
//! semantics. Every failure is contained here: reads degrade to the default,
//! writes report to the log and the `StorageObserver` and return `false`.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CoreError;
use crate::traits::{KeyValueStore, NoopStorageObserver, StorageObserver};

/// Injected storage handle
///
/// An absent backend means durable storage does not exist in this execution
/// context; every operation on top of it becomes a no-op.
#[derive(Clone)]
pub struct StorageHandle {
    backend: Option<Arc<dyn KeyValueStore>>,
    observer: Arc<dyn StorageObserver>,
}

impl StorageHandle {
    #[must_use]
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend: Some(backend),
            observer: Arc::new(NoopStorageObserver),
        }
    }

    /// Handle for contexts without durable storage
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            backend: None,
            observer: Arc::new(NoopStorageObserver),
        }
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn StorageObserver>) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    fn backend(&self) -> Option<&Arc<dyn KeyValueStore>> {
        self.backend.as_ref()
    }

    fn report_load_error(&self, key: &str, error: &CoreError) {
        log::error!("Failed to load stored value for key \"{key}\": {error}");
        self.observer.on_load_error(key, error);
    }

    fn report_save_error(&self, key: &str, error: &CoreError) {
        log::error!("Failed to save value for key \"{key}\": {error}");
        self.observer.on_save_error(key, error);
    }
}

/// Result of probing a key without writing a default
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue<T> {
    /// Never written, removed, or no storage in this context
    Missing,
    /// Parsed value
    Present(T),
    /// Exists but could not be read or parsed (left untouched)
    Unreadable,
}

impl<T> StoredValue<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Present(value) => Some(value),
            Self::Missing | Self::Unreadable => None,
        }
    }
}

/// Typed value store over a `StorageHandle`
pub struct PersistentValueStore<T> {
    handle: StorageHandle,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for PersistentValueStore<T> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            _value: PhantomData,
        }
    }
}

impl<T> PersistentValueStore<T>
where
    T: Serialize + DeserializeOwned,
{
    #[must_use]
    pub fn new(handle: StorageHandle) -> Self {
        Self {
            handle,
            _value: PhantomData,
        }
    }

    #[must_use]
    pub fn handle(&self) -> &StorageHandle {
        &self.handle
    }

    /// Probe a key without side effects
    pub async fn read(&self, key: &str) -> StoredValue<T> {
        let Some(backend) = self.handle.backend() else {
            return StoredValue::Missing;
        };

        let text = match backend.get(key).await {
            Ok(Some(text)) => text,
            Ok(None) => return StoredValue::Missing,
            Err(e) => {
                self.handle.report_load_error(key, &e);
                return StoredValue::Unreadable;
            }
        };

        match serde_json::from_str(&text) {
            Ok(value) => StoredValue::Present(value),
            Err(e) => {
                self.handle.report_load_error(key, &CoreError::from(e));
                StoredValue::Unreadable
            }
        }
    }

    /// Stored value, or `default`
    ///
    /// A missing key gets `default` written to it. An unreadable one keeps its
    /// bytes: `default` is returned but not persisted over them.
    pub async fn load(&self, key: &str, default: T) -> T {
        match self.read(key).await {
            StoredValue::Present(value) => value,
            StoredValue::Missing => {
                self.save(key, &default).await;
                default
            }
            StoredValue::Unreadable => default,
        }
    }

    /// Serialize and write
    ///
    /// Returns whether the value reached storage. Failures are logged and
    /// reported to the observer, never propagated.
    pub async fn save(&self, key: &str, value: &T) -> bool {
        let Some(backend) = self.handle.backend() else {
            return false;
        };

        let text = match serde_json::to_string(value) {
            Ok(text) => text,
            Err(e) => {
                self.handle.report_save_error(key, &CoreError::from(e));
                return false;
            }
        };

        match backend.set(key, &text).await {
            Ok(()) => true,
            Err(e) => {
                self.handle.report_save_error(key, &e);
                false
            }
        }
    }

    /// Delete the stored value
    pub async fn remove(&self, key: &str) -> bool {
        let Some(backend) = self.handle.backend() else {
            return false;
        };
        match backend.remove(key).await {
            Ok(()) => true,
            Err(e) => {
                self.handle.report_save_error(key, &e);
                false
            }
        }
    }

    /// Stored text as-is, for inspection
    pub async fn load_raw(&self, key: &str) -> Option<String> {
        let backend = self.handle.backend()?;
        match backend.get(key).await {
            Ok(text) => text,
            Err(e) => {
                self.handle.report_load_error(key, &e);
                None
            }
        }
    }
}
