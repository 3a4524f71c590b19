//! 地理编码缓存服务
//!
//! Location text -> coordinates, backed by a persisted map keyed on the
//! normalized location. Hits never touch the network. Lookups never fail
//! outward: anything that goes wrong is logged and becomes `None`.
//!
//! The map grows without bound and concurrent misses for the same key are not
//! coalesced; both would reach the geocoder.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::services::value_store::{PersistentValueStore, StorageHandle};
use crate::services::ServiceContext;
use crate::traits::Geocoder;
use crate::types::{
    normalize_location, Coordinates, GeocodeCacheEntry, GeocodeCacheMap, GeocodeCandidate,
};

/// Candidates returned by [`GeocodeCache::suggest`]
pub const SUGGEST_LIMIT: usize = 5;

/// Shorter (trimmed) queries get no suggestions
pub const SUGGEST_MIN_CHARS: usize = 3;

/// 地理编码缓存
pub struct GeocodeCache {
    geocoder: Arc<dyn Geocoder>,
    store: PersistentValueStore<GeocodeCacheMap>,
    key: String,
    /// 内存缓存（首次使用时加载）
    entries: RwLock<Option<GeocodeCacheMap>>,
}

impl GeocodeCache {
    #[must_use]
    pub fn new(storage: StorageHandle, geocoder: Arc<dyn Geocoder>, key: impl Into<String>) -> Self {
        Self {
            geocoder,
            store: PersistentValueStore::new(storage),
            key: key.into(),
            entries: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn from_context(ctx: &ServiceContext) -> Self {
        Self::new(
            ctx.storage.clone(),
            ctx.geocoder.clone(),
            ctx.keys.geocode_cache.clone(),
        )
    }

    /// 确保写锁内的缓存已加载，返回可变引用
    async fn ensure_loaded<'a>(
        &self,
        slot: &'a mut Option<GeocodeCacheMap>,
    ) -> &'a mut GeocodeCacheMap {
        if slot.is_none() {
            let loaded = self.store.load(&self.key, HashMap::new()).await;
            log::debug!("Loaded {} geocode cache entries", loaded.len());
            *slot = Some(loaded);
        }
        slot.get_or_insert_with(HashMap::new)
    }

    async fn read_entries<R>(&self, f: impl FnOnce(&GeocodeCacheMap) -> R) -> R {
        // 先检查缓存（读锁）
        {
            let guard = self.entries.read().await;
            if let Some(ref entries) = *guard {
                return f(entries);
            }
        }

        let mut guard = self.entries.write().await;
        f(self.ensure_loaded(&mut guard).await)
    }

    /// Coordinates for a free-text location
    ///
    /// Blank input returns `None` without any lookup. A miss queries the
    /// geocoder with the text as given and caches the first result.
    pub async fn resolve(&self, location: &str) -> Option<Coordinates> {
        let key = normalize_location(location)?;

        let hit = self
            .read_entries(|entries| entries.get(&key).map(GeocodeCacheEntry::coordinates))
            .await;
        if hit.is_some() {
            log::debug!("Geocode cache hit: {key}");
            return hit;
        }

        // 网络请求期间不持有锁
        let coordinates = self.lookup(location).await?;

        let mut slot = self.entries.write().await;
        let entries = self.ensure_loaded(&mut slot).await;
        entries.insert(key, GeocodeCacheEntry::new(coordinates, Utc::now()));
        self.store.save(&self.key, entries).await;

        Some(coordinates)
    }

    async fn lookup(&self, location: &str) -> Option<Coordinates> {
        log::info!("Geocoding \"{location}\" via {}", self.geocoder.id());

        let candidates = match self.geocoder.search(location, 1).await {
            Ok(candidates) => candidates,
            Err(e) => {
                log::warn!("Geocoding failed for \"{location}\": {e}");
                return None;
            }
        };

        let Some(first) = candidates.first() else {
            log::warn!("No geocoding results for \"{location}\"");
            return None;
        };

        match first.coordinates() {
            Ok(coordinates) => Some(coordinates),
            Err(e) => {
                log::warn!("Unusable geocoding result for \"{location}\": {e}");
                None
            }
        }
    }

    /// Search-as-you-type candidates (not cached)
    pub async fn suggest(&self, query: &str) -> Vec<GeocodeCandidate> {
        let query = query.trim();
        if query.chars().count() < SUGGEST_MIN_CHARS {
            return Vec::new();
        }

        match self.geocoder.search(query, SUGGEST_LIMIT).await {
            Ok(candidates) => candidates,
            Err(e) => {
                log::warn!("Location suggestions failed for \"{query}\": {e}");
                Vec::new()
            }
        }
    }

    /// 清空缓存（内存与持久化）
    pub async fn clear(&self) {
        let mut slot = self.entries.write().await;
        *slot = Some(HashMap::new());
        self.store.remove(&self.key).await;
        log::info!("Geocode cache cleared");
    }

    /// Cached entry for a location, if any
    pub async fn cached(&self, location: &str) -> Option<GeocodeCacheEntry> {
        let key = normalize_location(location)?;
        self.read_entries(|entries| entries.get(&key).copied()).await
    }

    pub async fn len(&self) -> usize {
        self.read_entries(|entries| entries.len()).await
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
