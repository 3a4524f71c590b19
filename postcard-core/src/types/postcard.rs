//! 明信片类型定义

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use postcard_geocoder::Coordinates;

use crate::utils::datetime::{parse_iso, to_iso_string};

/// Whether a place has been visited or is still on the wish list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostcardCategory {
    /// Already been there (legacy records without a category land here)
    #[default]
    Visited,
    /// Future destination
    Bucketlist,
}

/// Postcard as persisted.
///
/// This is the storage shape: `category` may be missing on records written
/// before categories existed, and `lat`/`lng` are stored as two nullable
/// numbers. `date_added` is kept verbatim, so one odd date never makes the
/// whole collection unreadable. Readers should work with [`Postcard`] instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostcardRecord {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub date_added: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<PostcardCategory>,
}

impl PostcardRecord {
    /// Canonical stored form: category filled in, unpaired coordinates dropped.
    #[must_use]
    pub fn normalized(self) -> Self {
        Postcard::from(self).into()
    }

    /// Whether the record still lacks a category.
    #[must_use]
    pub fn needs_category(&self) -> bool {
        self.category.is_none()
    }
}

/// Postcard as seen by readers.
///
/// Always carries a category, and coordinates are either a full pair or
/// absent. Serializes to the same JSON shape as [`PostcardRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "PostcardRecord", into = "PostcardRecord")]
pub struct Postcard {
    pub id: String,
    pub title: String,
    pub location: String,
    pub coordinates: Option<Coordinates>,
    pub image_url: String,
    pub description: String,
    /// ISO-8601 text as stored
    pub date_added: String,
    pub category: PostcardCategory,
}

impl Postcard {
    /// Whether the postcard can be placed on a map.
    #[must_use]
    pub fn is_mappable(&self) -> bool {
        self.coordinates.is_some()
    }

    /// `date_added` as a timestamp, if it parses.
    #[must_use]
    pub fn added_at(&self) -> Option<DateTime<Utc>> {
        parse_iso(&self.date_added)
    }
}

impl From<PostcardRecord> for Postcard {
    fn from(record: PostcardRecord) -> Self {
        Self {
            coordinates: Coordinates::from_parts(record.lat, record.lng),
            category: record.category.unwrap_or_default(),
            id: record.id,
            title: record.title,
            location: record.location,
            image_url: record.image_url,
            description: record.description,
            date_added: record.date_added,
        }
    }
}

impl From<Postcard> for PostcardRecord {
    fn from(postcard: Postcard) -> Self {
        Self {
            id: postcard.id,
            title: postcard.title,
            location: postcard.location,
            lat: postcard.coordinates.map(|c| c.lat),
            lng: postcard.coordinates.map(|c| c.lng),
            image_url: postcard.image_url,
            description: postcard.description,
            date_added: postcard.date_added,
            category: Some(postcard.category),
        }
    }
}

/// Postcard partial update (unset fields are left alone)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostcardUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// `Some(None)` clears the coordinates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Option<Coordinates>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::utils::datetime::option"
    )]
    pub date_added: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<PostcardCategory>,
}

impl PostcardUpdate {
    /// Merge into an existing record. The id never changes.
    pub fn apply_to(&self, record: &mut PostcardRecord) {
        if let Some(ref title) = self.title {
            record.title.clone_from(title);
        }
        if let Some(ref location) = self.location {
            record.location.clone_from(location);
        }
        if let Some(coordinates) = self.coordinates {
            record.lat = coordinates.map(|c| c.lat);
            record.lng = coordinates.map(|c| c.lng);
        }
        if let Some(ref image_url) = self.image_url {
            record.image_url.clone_from(image_url);
        }
        if let Some(ref description) = self.description {
            record.description.clone_from(description);
        }
        if let Some(ref date_added) = self.date_added {
            record.date_added = to_iso_string(date_added);
        }
        if let Some(category) = self.category {
            record.category = Some(category);
        }
    }

    /// Whether applying this update would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.location.is_none()
            && self.coordinates.is_none()
            && self.image_url.is_none()
            && self.description.is_none()
            && self.date_added.is_none()
            && self.category.is_none()
    }
}

/// Producer input for the create/edit workflow
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostcardInput {
    pub title: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to `visited` on create, unchanged on edit
    #[serde(default)]
    pub category: Option<PostcardCategory>,
    /// User override of the date; now on create, unchanged on edit
    #[serde(default, with = "crate::utils::datetime::option")]
    pub date_added: Option<DateTime<Utc>>,
}

/// Postcards split the way the home page shows them
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostcardOverview {
    pub visited: Vec<Postcard>,
    pub bucketlist: Vec<Postcard>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy_json() -> &'static str {
        r#"{
            "id": "chicago-1",
            "title": "Chicago",
            "location": "Chicago, Illinois, USA",
            "lat": null,
            "lng": null,
            "imageUrl": "https://example.com/chicago.jpg",
            "description": "Sunrise over the Bean.",
            "dateAdded": "2025-03-17T00:00:00.000Z"
        }"#
    }

    #[test]
    fn legacy_record_parses_without_category() {
        let record: PostcardRecord = serde_json::from_str(legacy_json()).unwrap();
        assert!(record.needs_category());
        assert_eq!(record.lat, None);
    }

    #[test]
    fn view_defaults_category_to_visited() {
        let record: PostcardRecord = serde_json::from_str(legacy_json()).unwrap();
        let postcard = Postcard::from(record);
        assert_eq!(postcard.category, PostcardCategory::Visited);
        assert!(!postcard.is_mappable());
    }

    #[test]
    fn view_deserializes_legacy_json_directly() {
        let postcard: Postcard = serde_json::from_str(legacy_json()).unwrap();
        assert_eq!(postcard.category, PostcardCategory::Visited);
    }

    #[test]
    fn lone_latitude_is_not_mappable() {
        let mut record: PostcardRecord = serde_json::from_str(legacy_json()).unwrap();
        record.lat = Some(41.88);
        let normalized = record.normalized();
        assert_eq!(normalized.lat, None);
        assert_eq!(normalized.lng, None);
        assert_eq!(normalized.category, Some(PostcardCategory::Visited));
    }

    #[test]
    fn view_serializes_to_wire_shape() {
        let mut record: PostcardRecord = serde_json::from_str(legacy_json()).unwrap();
        record.lat = Some(41.88);
        record.lng = Some(-87.62);
        record.category = Some(PostcardCategory::Bucketlist);
        let json = serde_json::to_value(Postcard::from(record)).unwrap();

        assert_eq!(json["category"], "bucketlist");
        assert_eq!(json["lat"], 41.88);
        assert_eq!(json["lng"], -87.62);
        assert_eq!(json["imageUrl"], "https://example.com/chicago.jpg");
        assert_eq!(json["dateAdded"], "2025-03-17T00:00:00.000Z");
    }

    #[test]
    fn date_only_value_is_kept_verbatim() {
        let json = legacy_json().replace("2025-03-17T00:00:00.000Z", "2025-03-17");
        let postcard: Postcard = serde_json::from_str(&json).unwrap();

        assert_eq!(postcard.date_added, "2025-03-17");
        assert_eq!(
            postcard.added_at(),
            DateTime::<Utc>::from_timestamp(1_742_169_600, 0)
        );
        assert_eq!(serde_json::to_value(&postcard).unwrap()["dateAdded"], "2025-03-17");
    }

    #[test]
    fn missing_or_blank_date_still_parses() {
        let record: PostcardRecord = serde_json::from_str(r#"{"id":"x","dateAdded":""}"#).unwrap();
        assert_eq!(record.date_added, "");
        assert_eq!(Postcard::from(record).added_at(), None);

        let record: PostcardRecord = serde_json::from_str(r#"{"id":"y"}"#).unwrap();
        assert_eq!(record.date_added, "");
    }

    #[test]
    fn apply_to_partial_update() {
        let mut record: PostcardRecord = serde_json::from_str(legacy_json()).unwrap();
        let update = PostcardUpdate {
            title: Some("Windy City".to_string()),
            coordinates: Some(Some(Coordinates { lat: 41.88, lng: -87.62 })),
            ..Default::default()
        };
        update.apply_to(&mut record);

        assert_eq!(record.title, "Windy City");
        assert_eq!(record.lat, Some(41.88));
        assert_eq!(record.lng, Some(-87.62));
        // 未更新的字段保持不变
        assert_eq!(record.location, "Chicago, Illinois, USA");
        assert_eq!(record.id, "chicago-1");
    }

    #[test]
    fn apply_to_writes_iso_date() {
        let mut record: PostcardRecord = serde_json::from_str(legacy_json()).unwrap();
        let update = PostcardUpdate {
            date_added: DateTime::<Utc>::from_timestamp(1_749_513_600, 0),
            ..Default::default()
        };
        update.apply_to(&mut record);
        assert_eq!(record.date_added, "2025-06-10T00:00:00.000Z");
    }

    #[test]
    fn apply_to_can_clear_coordinates() {
        let mut record: PostcardRecord = serde_json::from_str(legacy_json()).unwrap();
        record.lat = Some(1.0);
        record.lng = Some(2.0);
        let update = PostcardUpdate {
            coordinates: Some(None),
            ..Default::default()
        };
        update.apply_to(&mut record);
        assert_eq!((record.lat, record.lng), (None, None));
    }

    #[test]
    fn empty_update_is_empty() {
        assert!(PostcardUpdate::default().is_empty());
        let update = PostcardUpdate {
            category: Some(PostcardCategory::Bucketlist),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }
}
