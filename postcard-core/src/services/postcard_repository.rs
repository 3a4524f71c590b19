//! 明信片仓库
//!
//! In-memory collection backed by the postcards key. The one-time migration
//! runs on first use, exactly once per repository instance. After that the
//! in-memory collection is authoritative: every mutation is applied there
//! first and then persisted, and a failed write does not roll it back.
//!
//! If the stored collection could not be read, mutations stay in memory until
//! the caller opts in with [`PostcardRepository::overwrite_unreadable`] or
//! wipes it with [`PostcardRepository::clear`].

use tokio::sync::RwLock;

use crate::services::migration_service::{MigrationResult, MigrationService};
use crate::services::value_store::{PersistentValueStore, StorageHandle};
use crate::services::{ServiceContext, StorageKeys};
use crate::types::{Postcard, PostcardCategory, PostcardRecord, PostcardUpdate};

struct RepositoryState {
    records: Vec<PostcardRecord>,
    migration: MigrationResult,
    /// false 时不写回（存储中的数据无法解析，避免覆盖）
    persist: bool,
}

impl RepositoryState {
    fn new(records: Vec<PostcardRecord>, migration: MigrationResult) -> Self {
        let persist = migration != MigrationResult::CollectionUnreadable;
        Self {
            records,
            migration,
            persist,
        }
    }
}

/// 明信片仓库
pub struct PostcardRepository {
    store: PersistentValueStore<Vec<PostcardRecord>>,
    migration: MigrationService,
    key: String,
    /// 内存状态（首次使用时迁移并加载）
    state: RwLock<Option<RepositoryState>>,
}

impl PostcardRepository {
    #[must_use]
    pub fn new(storage: StorageHandle, keys: StorageKeys) -> Self {
        Self {
            store: PersistentValueStore::new(storage.clone()),
            key: keys.postcards.clone(),
            migration: MigrationService::new(storage, keys),
            state: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn from_context(ctx: &ServiceContext) -> Self {
        Self::new(ctx.storage.clone(), ctx.keys.clone())
    }

    /// Replace the bundled seed set (before first use)
    #[must_use]
    pub fn with_seed(mut self, seed: Vec<PostcardRecord>) -> Self {
        self.migration = self.migration.with_seed(seed);
        self
    }

    /// 确保写锁内的状态已初始化，返回可变引用
    async fn ensure_initialized<'a>(
        &self,
        slot: &'a mut Option<RepositoryState>,
    ) -> &'a mut RepositoryState {
        if slot.is_none() {
            let (records, migration) = self.migration.run().await;
            log::debug!("Postcard repository ready with {} postcards", records.len());
            *slot = Some(RepositoryState::new(records, migration));
        }
        slot.get_or_insert_with(|| {
            RepositoryState::new(Vec::new(), MigrationResult::CollectionUnreadable)
        })
    }

    async fn save_records(&self, state: &RepositoryState) -> bool {
        if !state.persist {
            log::warn!("Stored postcards are unreadable, keeping changes in memory only");
            return false;
        }
        self.store.save(&self.key, &state.records).await
    }

    async fn read_records<R>(&self, f: impl FnOnce(&[PostcardRecord]) -> R) -> R {
        // 先检查缓存（读锁）
        {
            let guard = self.state.read().await;
            if let Some(ref state) = *guard {
                return f(&state.records);
            }
        }

        let mut guard = self.state.write().await;
        let state = self.ensure_initialized(&mut guard).await;
        f(&state.records)
    }

    /// Run the migration now instead of on first use
    pub async fn initialize(&self) -> MigrationResult {
        let mut guard = self.state.write().await;
        self.ensure_initialized(&mut guard).await.migration.clone()
    }

    /// What the migration did this session
    pub async fn migration_result(&self) -> MigrationResult {
        self.initialize().await
    }

    /// Whether mutations are being held back from storage
    pub async fn writes_suspended(&self) -> bool {
        let mut guard = self.state.write().await;
        !self.ensure_initialized(&mut guard).await.persist
    }

    /// Replace an unreadable stored collection with the in-memory one
    ///
    /// Returns whether the write reached storage.
    pub async fn overwrite_unreadable(&self) -> bool {
        let mut guard = self.state.write().await;
        let state = self.ensure_initialized(&mut guard).await;
        if !state.persist {
            log::warn!(
                "Overwriting unreadable stored postcards with {} in-memory postcards",
                state.records.len()
            );
            state.persist = true;
        }
        self.save_records(state).await
    }

    /// Append a postcard and persist
    ///
    /// Ids are not checked for duplicates.
    pub async fn add(&self, record: PostcardRecord) -> Postcard {
        let record = record.normalized();
        let mut guard = self.state.write().await;
        let state = self.ensure_initialized(&mut guard).await;

        state.records.push(record.clone());
        self.save_records(state).await;

        log::info!("Added postcard {}", record.id);
        Postcard::from(record)
    }

    /// Merge a partial update into the postcard with this id
    pub async fn update(&self, id: &str, update: &PostcardUpdate) -> Option<Postcard> {
        let mut guard = self.state.write().await;
        let state = self.ensure_initialized(&mut guard).await;

        let Some(record) = state.records.iter_mut().find(|r| r.id == id) else {
            log::warn!("Postcard {id} not found, nothing updated");
            return None;
        };
        update.apply_to(record);
        let updated = Postcard::from(record.clone());

        self.save_records(state).await;
        log::info!("Updated postcard {id}");
        Some(updated)
    }

    /// Delete by id. Absent ids are a no-op; returns whether anything was removed.
    pub async fn remove(&self, id: &str) -> bool {
        let mut guard = self.state.write().await;
        let state = self.ensure_initialized(&mut guard).await;

        let initial_len = state.records.len();
        state.records.retain(|r| r.id != id);
        if state.records.len() == initial_len {
            return false;
        }

        self.save_records(state).await;
        log::info!("Removed postcard {id}");
        true
    }

    pub async fn find_by_id(&self, id: &str) -> Option<Postcard> {
        self.read_records(|records| {
            records
                .iter()
                .find(|r| r.id == id)
                .cloned()
                .map(Postcard::from)
        })
        .await
    }

    /// Every postcard, in stored order
    pub async fn list(&self) -> Vec<Postcard> {
        self.read_records(|records| records.iter().cloned().map(Postcard::from).collect())
            .await
    }

    pub async fn list_by_category(&self, category: PostcardCategory) -> Vec<Postcard> {
        self.list()
            .await
            .into_iter()
            .filter(|p| p.category == category)
            .collect()
    }

    /// Postcards with both coordinates
    pub async fn list_mappable(&self) -> Vec<Postcard> {
        self.list()
            .await
            .into_iter()
            .filter(Postcard::is_mappable)
            .collect()
    }

    /// Stored JSON exactly as persisted
    pub async fn raw_snapshot(&self) -> Option<String> {
        self.store.load_raw(&self.key).await
    }

    /// Drop every postcard and the persisted collection
    ///
    /// The migration marker stays set, so nothing is seeded again. Unreadable
    /// stored bytes are removed too, after which writes resume.
    pub async fn clear(&self) -> bool {
        let mut guard = self.state.write().await;
        let state = self.ensure_initialized(&mut guard).await;

        state.records.clear();
        let removed = self.store.remove(&self.key).await;
        if removed {
            state.persist = true;
        }
        log::info!("Cleared all postcards");
        removed
    }
}
