//! Platform-agnostic application bootstrap for the postcard tracker.
//!
//! Provides `AppState` (service container), `AppStateBuilder` (adapter injection),
//! and `StartupHooks` (platform-specific startup callbacks).

pub mod adapters;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use postcard_core::error::{CoreError, CoreResult};
use postcard_core::services::{
    GeocodeCache, MigrationResult, PostcardRepository, PostcardService, ServiceContext,
    StorageHandle, StorageKeys,
};
use postcard_core::traits::{Geocoder, KeyValueStore, StorageObserver};
use postcard_geocoder::{NominatimConfig, NominatimGeocoder};

/// Platform-specific hooks for the startup sequence.
///
/// Frontends implement this to back up the stored postcards before the
/// one-time migration touches them. Use `NoopStartupHooks` if no backup is needed.
#[async_trait::async_trait]
pub trait StartupHooks: Send + Sync {
    /// Called before migration with the stored postcard JSON.
    /// Returns a backup identifier (e.g., file path) or `None` to skip backup.
    async fn backup_postcards(&self, _raw_json: &str) -> Option<String> {
        None
    }

    /// Called after the collection was migrated (or needed nothing) to clean up the backup.
    async fn cleanup_backup(&self, _backup_info: &str) {}

    /// Called when the stored collection could not be read, to keep the backup for manual recovery.
    async fn preserve_backup(&self, _backup_info: &str, _error: &str) {}
}

/// No-op startup hooks for frontends that don't need a backup.
pub struct NoopStartupHooks;

#[async_trait::async_trait]
impl StartupHooks for NoopStartupHooks {}

/// Platform-agnostic application state.
///
/// Holds all services and the `ServiceContext`. Every frontend constructs this
/// once at startup via `AppStateBuilder`.
pub struct AppState {
    /// Service context (storage, geocoder, key names)
    pub ctx: Arc<ServiceContext>,
    /// Postcard collection
    pub postcard_repository: Arc<PostcardRepository>,
    /// Location -> coordinates cache
    pub geocode_cache: Arc<GeocodeCache>,
    /// Create/edit workflow
    pub postcard_service: PostcardService,
    /// Whether the startup sequence has completed
    pub startup_completed: AtomicBool,
}

impl AppState {
    /// Run the startup sequence: backup → one-time migration.
    ///
    /// Without this the migration still runs, lazily, on first repository use.
    pub async fn run_startup(&self, hooks: &dyn StartupHooks) -> MigrationResult {
        // 1. Backup
        let backup_info = match self.postcard_repository.raw_snapshot().await {
            Some(raw_json) => hooks.backup_postcards(&raw_json).await,
            None => None,
        };

        // 2. Migrate
        let result = self.postcard_repository.initialize().await;
        match result {
            MigrationResult::CollectionUnreadable => {
                log::error!(
                    "Stored postcards are unreadable, starting empty and holding changes in memory"
                );
                if let Some(ref info) = backup_info {
                    hooks
                        .preserve_backup(info, "stored postcards could not be parsed")
                        .await;
                }
            }
            ref other => {
                log::info!("Postcard storage ready: {other:?}");
                if let Some(ref info) = backup_info {
                    hooks.cleanup_backup(info).await;
                }
            }
        }

        self.startup_completed.store(true, Ordering::SeqCst);
        result
    }
}

/// Builder for constructing `AppState` with platform-specific adapters.
///
/// # Optional
/// - `storage`: durable key-value backend; without one nothing persists
/// - `geocoder`: defaults to `NominatimGeocoder` built from `nominatim_config`
/// - `observer`: notified on storage load/save failures
/// - `keys`: storage key names, defaults to `StorageKeys::default()`
pub struct AppStateBuilder {
    storage: Option<Arc<dyn KeyValueStore>>,
    geocoder: Option<Arc<dyn Geocoder>>,
    observer: Option<Arc<dyn StorageObserver>>,
    keys: StorageKeys,
    nominatim_config: NominatimConfig,
}

impl AppStateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: None,
            geocoder: None,
            observer: None,
            keys: StorageKeys::default(),
            nominatim_config: NominatimConfig::default(),
        }
    }

    #[must_use]
    pub fn storage(mut self, storage: Arc<dyn KeyValueStore>) -> Self {
        self.storage = Some(storage);
        self
    }

    #[must_use]
    pub fn geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    #[must_use]
    pub fn observer(mut self, observer: Arc<dyn StorageObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    #[must_use]
    pub fn keys(mut self, keys: StorageKeys) -> Self {
        self.keys = keys;
        self
    }

    /// Configuration for the default geocoder (ignored if `geocoder` is set)
    #[must_use]
    pub fn nominatim_config(mut self, config: NominatimConfig) -> Self {
        self.nominatim_config = config;
        self
    }

    /// Build the `AppState`.
    ///
    /// # Errors
    /// Returns `CoreError::ValidationError` if the default geocoder configuration is invalid.
    pub fn build(self) -> CoreResult<AppState> {
        let mut storage = if let Some(backend) = self.storage {
            StorageHandle::new(backend)
        } else {
            log::warn!("No storage backend configured, postcards will not persist");
            StorageHandle::unavailable()
        };
        if let Some(observer) = self.observer {
            storage = storage.with_observer(observer);
        }

        let geocoder: Arc<dyn Geocoder> = match self.geocoder {
            Some(geocoder) => geocoder,
            None => Arc::new(NominatimGeocoder::new(self.nominatim_config).map_err(|e| {
                CoreError::ValidationError(format!("Invalid geocoder configuration: {e}"))
            })?),
        };

        let ctx = Arc::new(ServiceContext::new(storage, geocoder, self.keys));

        let postcard_repository = Arc::new(PostcardRepository::from_context(&ctx));
        let geocode_cache = Arc::new(GeocodeCache::from_context(&ctx));
        let postcard_service =
            PostcardService::new(Arc::clone(&postcard_repository), Arc::clone(&geocode_cache));

        Ok(AppState {
            ctx,
            postcard_repository,
            geocode_cache,
            postcard_service,
            startup_completed: AtomicBool::new(false),
        })
    }
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
