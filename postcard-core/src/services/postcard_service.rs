//! 明信片管理服务（新建 / 编辑流程）

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::services::{GeocodeCache, PostcardRepository};
use crate::types::{
    Postcard, PostcardCategory, PostcardInput, PostcardOverview, PostcardRecord, PostcardUpdate,
};
use crate::utils::datetime::to_iso_string;

/// 明信片管理服务
pub struct PostcardService {
    repository: Arc<PostcardRepository>,
    geocode_cache: Arc<GeocodeCache>,
}

impl PostcardService {
    /// 创建明信片服务实例
    #[must_use]
    pub fn new(repository: Arc<PostcardRepository>, geocode_cache: Arc<GeocodeCache>) -> Self {
        Self {
            repository,
            geocode_cache,
        }
    }

    #[must_use]
    pub fn repository(&self) -> &Arc<PostcardRepository> {
        &self.repository
    }

    #[must_use]
    pub fn geocode_cache(&self) -> &Arc<GeocodeCache> {
        &self.geocode_cache
    }

    /// 新建明信片
    ///
    /// Coordinates come from the geocode cache; a location that cannot be
    /// resolved still produces a postcard, just not a mappable one.
    pub async fn create(&self, input: PostcardInput) -> CoreResult<Postcard> {
        let title = validate_title(&input.title)?;
        let coordinates = self.geocode_cache.resolve(&input.location).await;

        let record = PostcardRecord {
            id: Uuid::new_v4().to_string(),
            title,
            location: input.location.trim().to_string(),
            lat: coordinates.map(|c| c.lat),
            lng: coordinates.map(|c| c.lng),
            image_url: input.image_url,
            description: input.description,
            date_added: to_iso_string(&input.date_added.unwrap_or_else(Utc::now)),
            category: Some(input.category.unwrap_or_default()),
        };

        Ok(self.repository.add(record).await)
    }

    /// 编辑明信片
    ///
    /// If the location can't be resolved and its text did not change, the
    /// existing coordinates are kept.
    pub async fn edit(&self, id: &str, input: PostcardInput) -> CoreResult<Postcard> {
        let existing = self
            .repository
            .find_by_id(id)
            .await
            .ok_or_else(|| CoreError::PostcardNotFound(id.to_string()))?;
        let title = validate_title(&input.title)?;

        let location = input.location.trim().to_string();
        let coordinates = match self.geocode_cache.resolve(&location).await {
            Some(resolved) => Some(Some(resolved)),
            None if location == existing.location.trim() => None,
            None => Some(None),
        };

        let update = PostcardUpdate {
            title: Some(title),
            location: Some(location),
            coordinates,
            image_url: Some(input.image_url),
            description: Some(input.description),
            date_added: input.date_added,
            category: input.category,
        };

        self.repository
            .update(id, &update)
            .await
            .ok_or_else(|| CoreError::PostcardNotFound(id.to_string()))
    }

    /// 删除明信片
    pub async fn delete(&self, id: &str) -> bool {
        self.repository.remove(id).await
    }

    /// Postcards grouped by category
    pub async fn overview(&self) -> PostcardOverview {
        let mut overview = PostcardOverview::default();
        for postcard in self.repository.list().await {
            match postcard.category {
                PostcardCategory::Visited => overview.visited.push(postcard),
                PostcardCategory::Bucketlist => overview.bucketlist.push(postcard),
            }
        }
        overview
    }
}

fn validate_title(title: &str) -> CoreResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(CoreError::ValidationError(
            "Postcard title cannot be empty".to_string(),
        ));
    }
    Ok(title.to_string())
}
