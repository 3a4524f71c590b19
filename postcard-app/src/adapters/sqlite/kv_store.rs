//! `KeyValueStore` implementation for `SqliteStore`.

use async_trait::async_trait;
use sea_orm::{ActiveValue::Set, EntityTrait};

use postcard_core::error::{CoreError, CoreResult};
use postcard_core::traits::KeyValueStore;

use super::entity::kv_entry;
use super::SqliteStore;

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> CoreResult<Option<String>> {
        let row = kv_entry::Entity::find_by_id(key.to_string())
            .one(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to query key {key}: {e}")))?;

        Ok(row.map(|m| m.value))
    }

    async fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        let active_model = kv_entry::ActiveModel {
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            updated_at: Set(chrono::Utc::now().to_rfc3339()),
        };

        kv_entry::Entity::insert(active_model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(kv_entry::Column::Key)
                    .update_columns([kv_entry::Column::Value, kv_entry::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to save key {key}: {e}")))?;

        log::debug!("Saved key {key} ({} bytes)", value.len());
        Ok(())
    }

    async fn remove(&self, key: &str) -> CoreResult<()> {
        kv_entry::Entity::delete_by_id(key.to_string())
            .exec(&self.db)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to delete key {key}: {e}")))?;
        Ok(())
    }
}
