//! Observability channel for contained storage failures

use crate::error::CoreError;

/// Receives storage failures that the persistence layer swallows.
///
/// Failures never propagate past `PersistentValueStore`; they are logged and
/// then handed to the observer so a frontend can surface "changes could not
/// be saved" style warnings. Every method defaults to a no-op.
pub trait StorageObserver: Send + Sync {
    /// A stored value could not be read or parsed; the default was used instead.
    fn on_load_error(&self, _key: &str, _error: &CoreError) {}

    /// A value could not be written; the in-memory copy stays authoritative.
    fn on_save_error(&self, _key: &str, _error: &CoreError) {}
}

/// Observer for callers that only want the log output.
pub struct NoopStorageObserver;

impl StorageObserver for NoopStorageObserver {}
