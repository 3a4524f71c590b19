//! 测试辅助模块
//!
//! 提供 mock 实现和便捷的测试工厂方法。

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use postcard_geocoder::{GeocodeCandidate, GeocodeError, GeocodeResult, Geocoder};
use tokio::sync::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::services::{StorageHandle, StorageKeys};
use crate::traits::{KeyValueStore, StorageObserver};
use crate::types::{PostcardCategory, PostcardRecord};

// ===== MockKeyValueStore =====

/// Key-value store with switchable read/write failures and a write log.
pub struct MockKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
    /// 如果 Some，get 时返回此错误
    read_error: RwLock<Option<String>>,
    /// 如果 Some，set/remove 时返回此错误（模拟配额不足）
    write_error: RwLock<Option<String>>,
    /// 仅对指定 key 的写入失败
    key_write_errors: RwLock<HashMap<String, String>>,
    /// 成功写入的 key，按顺序
    written: Mutex<Vec<String>>,
}

impl MockKeyValueStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            read_error: RwLock::new(None),
            write_error: RwLock::new(None),
            key_write_errors: RwLock::new(HashMap::new()),
            written: Mutex::new(Vec::new()),
        }
    }

    pub async fn set_read_error(&self, err: Option<String>) {
        *self.read_error.write().await = err;
    }

    pub async fn set_write_error(&self, err: Option<String>) {
        *self.write_error.write().await = err;
    }

    /// Fail writes to one key only
    pub async fn set_key_write_error(&self, key: &str, err: Option<String>) {
        let mut errors = self.key_write_errors.write().await;
        match err {
            Some(msg) => errors.insert(key.to_string(), msg),
            None => errors.remove(key),
        };
    }

    /// Successful writes so far
    pub fn write_count(&self) -> usize {
        self.written.lock().map(|v| v.len()).unwrap_or_default()
    }

    /// Keys of successful set/remove calls, in order
    pub fn written_keys(&self) -> Vec<String> {
        self.written.lock().map(|v| v.clone()).unwrap_or_default()
    }

    async fn check_write(&self, key: &str) -> CoreResult<()> {
        if let Some(ref msg) = *self.write_error.read().await {
            return Err(CoreError::StorageError(msg.clone()));
        }
        if let Some(msg) = self.key_write_errors.read().await.get(key) {
            return Err(CoreError::StorageError(msg.clone()));
        }
        Ok(())
    }

    fn record_write(&self, key: &str) {
        if let Ok(mut v) = self.written.lock() {
            v.push(key.to_string());
        }
    }
}

#[async_trait]
impl KeyValueStore for MockKeyValueStore {
    async fn get(&self, key: &str) -> CoreResult<Option<String>> {
        if let Some(ref msg) = *self.read_error.read().await {
            return Err(CoreError::StorageError(msg.clone()));
        }
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        self.check_write(key).await?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        self.record_write(key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> CoreResult<()> {
        self.check_write(key).await?;
        self.entries.write().await.remove(key);
        self.record_write(key);
        Ok(())
    }
}

// ===== RecordingObserver =====

/// Remembers which keys failed.
#[derive(Default)]
pub struct RecordingObserver {
    load_errors: Mutex<Vec<String>>,
    save_errors: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn load_errors(&self) -> Vec<String> {
        self.load_errors.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn save_errors(&self) -> Vec<String> {
        self.save_errors.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl StorageObserver for RecordingObserver {
    fn on_load_error(&self, key: &str, _error: &CoreError) {
        if let Ok(mut v) = self.load_errors.lock() {
            v.push(key.to_string());
        }
    }

    fn on_save_error(&self, key: &str, _error: &CoreError) {
        if let Ok(mut v) = self.save_errors.lock() {
            v.push(key.to_string());
        }
    }
}

// ===== MockGeocoder =====

/// Scripted geocoder that counts calls.
///
/// Answers are matched on the trimmed, lower-cased query; the raw query is
/// what gets recorded.
pub struct MockGeocoder {
    answers: RwLock<HashMap<String, Vec<GeocodeCandidate>>>,
    /// 如果 Some，search 时返回此错误
    failure: RwLock<Option<GeocodeError>>,
    calls: RwLock<Vec<(String, usize)>>,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self {
            answers: RwLock::new(HashMap::new()),
            failure: RwLock::new(None),
            calls: RwLock::new(Vec::new()),
        }
    }

    pub async fn answer(&self, query: &str, lat: &str, lon: &str) {
        self.answers
            .write()
            .await
            .entry(query.trim().to_lowercase())
            .or_default()
            .push(GeocodeCandidate {
                place_id: 1,
                display_name: query.to_string(),
                lat: lat.to_string(),
                lon: lon.to_string(),
            });
    }

    pub async fn set_failure(&self, failure: Option<GeocodeError>) {
        *self.failure.write().await = failure;
    }

    pub async fn calls(&self) -> Vec<(String, usize)> {
        self.calls.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    fn id(&self) -> &'static str {
        "mock"
    }

    async fn search(&self, query: &str, limit: usize) -> GeocodeResult<Vec<GeocodeCandidate>> {
        self.calls.write().await.push((query.to_string(), limit));
        if let Some(ref failure) = *self.failure.read().await {
            return Err(failure.clone());
        }
        let mut found = self
            .answers
            .read()
            .await
            .get(&query.trim().to_lowercase())
            .cloned()
            .unwrap_or_default();
        found.truncate(limit);
        Ok(found)
    }
}

// ===== 工厂方法 =====

/// Storage handle over a fresh `MockKeyValueStore`
pub fn mock_storage() -> (StorageHandle, Arc<MockKeyValueStore>) {
    let backend = Arc::new(MockKeyValueStore::new());
    (StorageHandle::new(backend.clone()), backend)
}

pub fn keys() -> StorageKeys {
    StorageKeys::default()
}

/// Stored postcard with the given id and optional category
pub fn record(id: &str, category: Option<PostcardCategory>) -> PostcardRecord {
    PostcardRecord {
        id: id.to_string(),
        title: format!("Postcard {id}"),
        location: "Lisbon, Portugal".to_string(),
        lat: None,
        lng: None,
        image_url: format!("https://example.com/{id}.jpg"),
        description: String::new(),
        date_added: "2025-06-15T15:06:40.000Z".to_string(),
        category,
    }
}

/// Write a postcard array the way an older app version would have
pub async fn write_postcards(backend: &dyn KeyValueStore, records: &[PostcardRecord]) {
    let json = serde_json::to_string(records).unwrap_or_default();
    let _ = backend.set(&StorageKeys::default().postcards, &json).await;
}

/// Read back the persisted postcard array
pub async fn stored_postcards(backend: &dyn KeyValueStore) -> Option<Vec<PostcardRecord>> {
    let text = backend
        .get(&StorageKeys::default().postcards)
        .await
        .ok()
        .flatten()?;
    serde_json::from_str(&text).ok()
}

/// Read back the persisted migration marker
pub async fn stored_marker(backend: &dyn KeyValueStore) -> Option<bool> {
    let text = backend
        .get(&StorageKeys::default().migration_marker)
        .await
        .ok()
        .flatten()?;
    serde_json::from_str(&text).ok()
}
