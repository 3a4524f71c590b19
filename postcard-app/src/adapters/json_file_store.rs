//! JSON 文件键值存储
//!
//! 所有键值保存在同一个 JSON 对象文件中（key -> 原始 JSON 文本）
//! 实现 postcard-core 的 KeyValueStore trait

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use postcard_core::error::{CoreError, CoreResult};
use postcard_core::traits::KeyValueStore;
use tokio::fs;
use tokio::sync::Mutex;

type Entries = BTreeMap<String, String>;

/// 基于 JSON 文件的键值存储
pub struct JsonFileStore {
    path: PathBuf,
    /// 内存缓存（首次访问时加载）
    cache: Mutex<Option<Entries>>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    /// 默认数据文件路径: `<data dir>/postcard-tracker/storage.json`
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("postcard-tracker")
            .join("storage.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 从文件加载
    async fn load_from_file(&self) -> CoreResult<Entries> {
        if !fs::try_exists(&self.path)
            .await
            .map_err(|e| CoreError::StorageError(e.to_string()))?
        {
            return Ok(Entries::new());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| CoreError::StorageError(e.to_string()))?;

        serde_json::from_str(&content).map_err(|e| {
            CoreError::SerializationError(format!(
                "Invalid storage file {}: {e}",
                self.path.display()
            ))
        })
    }

    /// 保存到文件（先写临时文件再重命名）
    async fn save_to_file(&self, entries: &Entries) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| CoreError::StorageError(format!("Failed to create directory: {e}")))?;
        }

        let content = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");

        fs::write(&tmp_path, content)
            .await
            .map_err(|e| CoreError::StorageError(e.to_string()))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| CoreError::StorageError(e.to_string()))?;

        log::debug!("Saved {} entries to {}", entries.len(), self.path.display());
        Ok(())
    }

    /// 确保锁内的缓存已加载，返回可变引用
    async fn ensure_cache_loaded<'a>(
        &self,
        cache: &'a mut Option<Entries>,
    ) -> CoreResult<&'a mut Entries> {
        if cache.is_none() {
            *cache = Some(self.load_from_file().await?);
        }
        Ok(cache.get_or_insert_with(Entries::new))
    }

    /// 写入修改后的副本，成功后才更新缓存
    async fn commit(&self, f: impl FnOnce(&mut Entries)) -> CoreResult<()> {
        let mut cache = self.cache.lock().await;
        let entries = self.ensure_cache_loaded(&mut cache).await?;

        let mut next = entries.clone();
        f(&mut next);
        self.save_to_file(&next).await?;

        *entries = next;
        Ok(())
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new(Self::default_path())
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> CoreResult<Option<String>> {
        let mut cache = self.cache.lock().await;
        let entries = self.ensure_cache_loaded(&mut cache).await?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        self.commit(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
        .await
    }

    async fn remove(&self, key: &str) -> CoreResult<()> {
        self.commit(|entries| {
            entries.remove(key);
        })
        .await
    }
}
