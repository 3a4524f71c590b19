#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Integration tests for `AppStateBuilder` and the `AppState` startup sequence.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use postcard_app::adapters::JsonFileStore;
use postcard_app::{AppStateBuilder, NoopStartupHooks, StartupHooks};
use postcard_core::error::CoreError;
use postcard_core::services::{MigrationResult, StorageKeys};
use postcard_core::traits::{Geocoder, InMemoryKeyValueStore, KeyValueStore, StorageObserver};
use postcard_core::types::{PostcardCategory, PostcardInput};
use postcard_geocoder::{GeocodeCandidate, GeocodeResult, NominatimConfig};
use tokio::sync::RwLock;

// ===== Mock Implementations =====

/// Geocoder that resolves every query to the same point.
struct FixedGeocoder {
    calls: AtomicUsize,
}

impl FixedGeocoder {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Geocoder for FixedGeocoder {
    fn id(&self) -> &'static str {
        "fixed"
    }

    async fn search(&self, query: &str, _limit: usize) -> GeocodeResult<Vec<GeocodeCandidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![GeocodeCandidate {
            place_id: 7,
            display_name: query.to_string(),
            lat: "45.4642".to_string(),
            lon: "9.19".to_string(),
        }])
    }
}

/// Records every hook invocation.
#[derive(Default)]
struct RecordingHooks {
    backups: RwLock<Vec<String>>,
    cleaned: RwLock<Vec<String>>,
    preserved: RwLock<Vec<(String, String)>>,
}

#[async_trait]
impl StartupHooks for RecordingHooks {
    async fn backup_postcards(&self, raw_json: &str) -> Option<String> {
        self.backups.write().await.push(raw_json.to_string());
        Some("backup-1".to_string())
    }

    async fn cleanup_backup(&self, backup_info: &str) {
        self.cleaned.write().await.push(backup_info.to_string());
    }

    async fn preserve_backup(&self, backup_info: &str, error: &str) {
        self.preserved
            .write()
            .await
            .push((backup_info.to_string(), error.to_string()));
    }
}

#[derive(Default)]
struct CountingObserver {
    load_errors: AtomicUsize,
}

impl StorageObserver for CountingObserver {
    fn on_load_error(&self, _key: &str, _error: &CoreError) {
        self.load_errors.fetch_add(1, Ordering::SeqCst);
    }
}

fn input(title: &str, location: &str) -> PostcardInput {
    PostcardInput {
        title: title.to_string(),
        location: location.to_string(),
        ..Default::default()
    }
}

// ===== Builder =====

#[tokio::test]
async fn build_without_storage_still_works() {
    let state = AppStateBuilder::new()
        .geocoder(Arc::new(FixedGeocoder::new()))
        .build()
        .unwrap();

    assert!(!state.ctx.storage.is_available());
    assert_eq!(state.postcard_repository.list().await.len(), 2);
}

#[tokio::test]
async fn build_with_default_geocoder() {
    let state = AppStateBuilder::default().build().unwrap();
    assert_eq!(state.ctx.geocoder.id(), "nominatim");
}

#[tokio::test]
async fn build_rejects_invalid_nominatim_config() {
    let result = AppStateBuilder::new()
        .nominatim_config(NominatimConfig::default().with_base_url("not a url"))
        .build();

    assert!(matches!(result, Err(CoreError::ValidationError(_))));
}

#[tokio::test]
async fn custom_keys_are_used() {
    let backend = InMemoryKeyValueStore::new();
    let keys = StorageKeys {
        postcards: "cards".to_string(),
        ..StorageKeys::default()
    };
    let state = AppStateBuilder::new()
        .storage(Arc::new(backend.clone()))
        .geocoder(Arc::new(FixedGeocoder::new()))
        .keys(keys)
        .build()
        .unwrap();

    state.run_startup(&NoopStartupHooks).await;

    assert!(backend.get("cards").await.unwrap().is_some());
    assert!(backend.get("postcards").await.unwrap().is_none());
}

// ===== Startup =====

#[tokio::test]
async fn startup_seeds_fresh_storage() {
    let backend = InMemoryKeyValueStore::new();
    let state = AppStateBuilder::new()
        .storage(Arc::new(backend.clone()))
        .geocoder(Arc::new(FixedGeocoder::new()))
        .build()
        .unwrap();
    let hooks = RecordingHooks::default();

    let result = state.run_startup(&hooks).await;

    assert_eq!(result, MigrationResult::Seeded { seeded: 2 });
    assert!(state.startup_completed.load(Ordering::SeqCst));
    // 首次启动没有可备份的数据
    assert!(hooks.backups.read().await.is_empty());
    assert_eq!(
        backend
            .get("postcardApp_seedMigrated")
            .await
            .unwrap()
            .as_deref(),
        Some("true")
    );
}

#[tokio::test]
async fn startup_backs_up_and_cleans_up_existing_data() {
    let raw = r#"[{"id":"old-1","title":"Old","location":"Rome","lat":null,"lng":null,"imageUrl":"","description":"","dateAdded":"2024-01-01T00:00:00.000Z"}]"#;
    let backend = InMemoryKeyValueStore::with_entries([("postcards", raw)]);
    let state = AppStateBuilder::new()
        .storage(Arc::new(backend))
        .geocoder(Arc::new(FixedGeocoder::new()))
        .build()
        .unwrap();
    let hooks = RecordingHooks::default();

    let result = state.run_startup(&hooks).await;

    assert_eq!(
        result,
        MigrationResult::Upgraded {
            normalized: 1,
            refreshed_images: 0
        }
    );
    assert_eq!(*hooks.backups.read().await, vec![raw.to_string()]);
    assert_eq!(*hooks.cleaned.read().await, vec!["backup-1".to_string()]);
    assert!(hooks.preserved.read().await.is_empty());

    let all = state.postcard_repository.list().await;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].category, PostcardCategory::Visited);
}

#[tokio::test]
async fn startup_preserves_backup_of_unreadable_data() {
    let backend = InMemoryKeyValueStore::with_entries([("postcards", "[{oops")]);
    let observer = Arc::new(CountingObserver::default());
    let state = AppStateBuilder::new()
        .storage(Arc::new(backend.clone()))
        .observer(observer.clone())
        .geocoder(Arc::new(FixedGeocoder::new()))
        .build()
        .unwrap();
    let hooks = RecordingHooks::default();

    let result = state.run_startup(&hooks).await;

    assert_eq!(result, MigrationResult::CollectionUnreadable);
    assert_eq!(hooks.preserved.read().await.len(), 1);
    assert!(hooks.cleaned.read().await.is_empty());
    assert!(observer.load_errors.load(Ordering::SeqCst) >= 1);
    assert_eq!(
        backend.get("postcards").await.unwrap().as_deref(),
        Some("[{oops")
    );
}

#[tokio::test]
async fn startup_preserves_backup_when_marker_set_and_data_corrupt() {
    let raw = r#"[{"id":1,"title":"Broken"}]"#;
    let backend = InMemoryKeyValueStore::with_entries([
        ("postcardApp_seedMigrated", "true"),
        ("postcards", raw),
    ]);
    let state = AppStateBuilder::new()
        .storage(Arc::new(backend.clone()))
        .geocoder(Arc::new(FixedGeocoder::new()))
        .build()
        .unwrap();
    let hooks = RecordingHooks::default();

    let result = state.run_startup(&hooks).await;

    assert_eq!(result, MigrationResult::CollectionUnreadable);
    assert_eq!(*hooks.backups.read().await, vec![raw.to_string()]);
    assert_eq!(hooks.preserved.read().await.len(), 1);
    assert!(hooks.cleaned.read().await.is_empty());

    // 新增的明信片只保存在内存中，不覆盖原数据
    state
        .postcard_service
        .create(input("Milan", "Milan, Italy"))
        .await
        .unwrap();
    assert_eq!(backend.get("postcards").await.unwrap().as_deref(), Some(raw));
}

#[tokio::test]
async fn startup_keeps_date_only_postcards() {
    let raw = r#"[{"id":"old-1","title":"Old","location":"Rome","lat":null,"lng":null,"imageUrl":"","description":"","dateAdded":"2024-01-01","category":"visited"}]"#;
    let backend = InMemoryKeyValueStore::with_entries([
        ("postcardApp_seedMigrated", "true"),
        ("postcards", raw),
    ]);
    let state = AppStateBuilder::new()
        .storage(Arc::new(backend))
        .geocoder(Arc::new(FixedGeocoder::new()))
        .build()
        .unwrap();
    let hooks = RecordingHooks::default();

    let result = state.run_startup(&hooks).await;

    assert_eq!(result, MigrationResult::AlreadyMigrated { normalized: 0 });
    assert_eq!(*hooks.cleaned.read().await, vec!["backup-1".to_string()]);
    let all = state.postcard_repository.list().await;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].date_added, "2024-01-01");
    assert!(all[0].added_at().is_some());
}

// ===== End to end =====

#[tokio::test]
async fn postcards_survive_restart_with_file_store() {
    let tmp = tempfile::tempdir().expect("failed to create temp dir");
    let path = tmp.path().join("storage.json");
    let geocoder = Arc::new(FixedGeocoder::new());

    let created = {
        let state = AppStateBuilder::new()
            .storage(Arc::new(JsonFileStore::new(&path)))
            .geocoder(geocoder.clone())
            .build()
            .unwrap();
        state.run_startup(&NoopStartupHooks).await;
        state.postcard_repository.remove("chicago-1").await;
        state
            .postcard_service
            .create(input("Milan", "Milan, Italy"))
            .await
            .unwrap()
    };

    let state = AppStateBuilder::new()
        .storage(Arc::new(JsonFileStore::new(&path)))
        .geocoder(geocoder.clone())
        .build()
        .unwrap();
    let result = state.run_startup(&NoopStartupHooks).await;

    assert_eq!(result, MigrationResult::AlreadyMigrated { normalized: 0 });
    let ids: Vec<_> = state
        .postcard_repository
        .list()
        .await
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, vec!["london-1".to_string(), created.id.clone()]);

    // 坐标已缓存，不再请求
    assert!(state.geocode_cache.resolve("  milan, italy").await.is_some());
    assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
}
