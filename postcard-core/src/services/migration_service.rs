//! 明信片一次性迁移服务
//!
//! Brings a stored collection up to the current shape exactly once per
//! storage profile: seeds a first-time user, or fills in `category` and
//! refreshes seed image URLs for a user upgrading from an older version.
//!
//! A deleted seed postcard must never come back. Two rules guarantee it:
//! "first-time user" means the stored collection is absent or empty (not that
//! some seed id is missing), and the marker is written before any data is.

use crate::services::value_store::{PersistentValueStore, StorageHandle, StoredValue};
use crate::services::{seed, StorageKeys};
use crate::types::{PostcardCategory, PostcardRecord};

/// 迁移服务
pub struct MigrationService {
    postcards: PersistentValueStore<Vec<PostcardRecord>>,
    marker: PersistentValueStore<bool>,
    keys: StorageKeys,
    seed: Vec<PostcardRecord>,
}

impl MigrationService {
    #[must_use]
    pub fn new(storage: StorageHandle, keys: StorageKeys) -> Self {
        Self {
            postcards: PersistentValueStore::new(storage.clone()),
            marker: PersistentValueStore::new(storage),
            keys,
            seed: seed::seed_postcards(),
        }
    }

    /// Replace the bundled seed set
    #[must_use]
    pub fn with_seed(mut self, seed: Vec<PostcardRecord>) -> Self {
        self.seed = seed;
        self
    }

    /// Run the migration (or just the per-record normalization if it already ran)
    ///
    /// Returns the collection the repository should hold for this session.
    pub async fn run(&self) -> (Vec<PostcardRecord>, MigrationResult) {
        let postcards_key = self.keys.postcards.as_str();
        let marker_key = self.keys.migration_marker.as_str();

        let already_migrated = match self.marker.read(marker_key).await {
            StoredValue::Present(done) => done,
            StoredValue::Missing => false,
            // 无法判断时按已迁移处理，宁可不补种子
            StoredValue::Unreadable => {
                log::warn!("Migration marker unreadable, assuming migration already ran");
                true
            }
        };

        if already_migrated {
            let mut records = match self.postcards.read(postcards_key).await {
                StoredValue::Present(records) => records,
                StoredValue::Missing => {
                    self.postcards.save(postcards_key, &Vec::new()).await;
                    Vec::new()
                }
                StoredValue::Unreadable => {
                    log::warn!("Stored postcards unreadable, leaving data untouched");
                    return (Vec::new(), MigrationResult::CollectionUnreadable);
                }
            };
            let normalized = normalize_categories(&mut records);
            if normalized > 0 {
                log::info!("Filled in category on {normalized} postcards");
                self.postcards.save(postcards_key, &records).await;
            }
            return (records, MigrationResult::AlreadyMigrated { normalized });
        }

        let stored = self.postcards.read(postcards_key).await;

        // 先写标记，再改数据
        self.marker.save(marker_key, &true).await;

        match stored {
            StoredValue::Unreadable => {
                log::warn!("Stored postcards unreadable, skipping seed and leaving data untouched");
                (Vec::new(), MigrationResult::CollectionUnreadable)
            }
            StoredValue::Missing => self.seed_first_run(Vec::new()).await,
            StoredValue::Present(records) if records.is_empty() => {
                self.seed_first_run(records).await
            }
            StoredValue::Present(mut records) => {
                let normalized = normalize_categories(&mut records);
                let refreshed_images = refresh_seed_images(&mut records, &self.seed);
                self.postcards.save(postcards_key, &records).await;
                log::info!(
                    "Upgraded stored postcards: {normalized} categorized, {refreshed_images} images refreshed"
                );
                (
                    records,
                    MigrationResult::Upgraded {
                        normalized,
                        refreshed_images,
                    },
                )
            }
        }
    }

    async fn seed_first_run(
        &self,
        records: Vec<PostcardRecord>,
    ) -> (Vec<PostcardRecord>, MigrationResult) {
        let before = records.len();
        let mut records = merge_seed(records, &self.seed);
        normalize_categories(&mut records);
        self.postcards.save(&self.keys.postcards, &records).await;

        let seeded = records.len() - before;
        log::info!("First run: seeded {seeded} postcards");
        (records, MigrationResult::Seeded { seeded })
    }
}

/// Give every record without a category the default one
///
/// Returns how many records changed.
pub fn normalize_categories(records: &mut [PostcardRecord]) -> usize {
    let mut changed = 0;
    for record in records.iter_mut().filter(|r| r.needs_category()) {
        record.category = Some(PostcardCategory::default());
        changed += 1;
    }
    changed
}

/// Copy current seed image URLs onto stored records with a seed id
///
/// Returns how many records changed.
pub fn refresh_seed_images(records: &mut [PostcardRecord], seed: &[PostcardRecord]) -> usize {
    let mut changed = 0;
    for record in records.iter_mut() {
        if let Some(current) = seed.iter().find(|s| s.id == record.id) {
            if record.image_url != current.image_url {
                record.image_url.clone_from(&current.image_url);
                changed += 1;
            }
        }
    }
    changed
}

/// Append seed records whose id is not already present
#[must_use]
pub fn merge_seed(mut records: Vec<PostcardRecord>, seed: &[PostcardRecord]) -> Vec<PostcardRecord> {
    for s in seed {
        if !records.iter().any(|r| r.id == s.id) {
            records.push(s.clone());
        }
    }
    records
}

/// 迁移结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationResult {
    /// Marker was already set; only missing categories were filled in
    AlreadyMigrated { normalized: usize },

    /// First-time user received the seed set
    Seeded { seeded: usize },

    /// Existing collection from an older version was brought up to date
    Upgraded {
        normalized: usize,
        refreshed_images: usize,
    },

    /// Stored collection could not be read or parsed; nothing was seeded or
    /// overwritten, whether or not the marker was already set
    CollectionUnreadable,
}
