//! 业务逻辑服务层

mod geocode_cache;
mod migration_service;
mod postcard_repository;
mod postcard_service;
mod seed;
mod value_store;

pub use geocode_cache::{GeocodeCache, SUGGEST_LIMIT, SUGGEST_MIN_CHARS};
pub use migration_service::{
    merge_seed, normalize_categories, refresh_seed_images, MigrationResult, MigrationService,
};
pub use postcard_repository::PostcardRepository;
pub use postcard_service::PostcardService;
pub use seed::seed_postcards;
pub use value_store::{PersistentValueStore, StorageHandle, StoredValue};

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::traits::Geocoder;

/// Storage key names
///
/// Defaults match what earlier app versions wrote, so existing data is picked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageKeys {
    /// Postcard collection (JSON array)
    pub postcards: String,
    /// Geocode cache (JSON object)
    pub geocode_cache: String,
    /// One-time migration marker (JSON boolean)
    pub migration_marker: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            postcards: "postcards".to_string(),
            geocode_cache: "postcardApp_geocodeCache".to_string(),
            migration_marker: "postcardApp_seedMigrated".to_string(),
        }
    }
}

/// 服务上下文 - 持有所有依赖
///
/// 平台层需要创建此上下文，并注入平台特定的存储实现。
#[derive(Clone)]
pub struct ServiceContext {
    /// 持久化存储
    pub storage: StorageHandle,
    /// 地理编码服务
    pub geocoder: Arc<dyn Geocoder>,
    /// 存储键名
    pub keys: StorageKeys,
}

impl ServiceContext {
    /// 创建服务上下文
    #[must_use]
    pub fn new(storage: StorageHandle, geocoder: Arc<dyn Geocoder>, keys: StorageKeys) -> Self {
        Self {
            storage,
            geocoder,
            keys,
        }
    }
}
