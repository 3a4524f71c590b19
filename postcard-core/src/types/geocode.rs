//! 地理编码缓存类型定义

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use postcard_geocoder::Coordinates;

/// One resolved location
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeocodeCacheEntry {
    pub lat: f64,
    pub lng: f64,
    /// When the lookup happened (older data stores `Date.now()` milliseconds)
    #[serde(with = "crate::utils::datetime")]
    pub timestamp: DateTime<Utc>,
}

impl GeocodeCacheEntry {
    #[must_use]
    pub fn new(coordinates: Coordinates, timestamp: DateTime<Utc>) -> Self {
        Self {
            lat: coordinates.lat,
            lng: coordinates.lng,
            timestamp,
        }
    }

    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

/// Persisted cache: normalized location key -> entry
pub type GeocodeCacheMap = HashMap<String, GeocodeCacheEntry>;

/// Cache key for a free-text location: trimmed and lower-cased.
///
/// Returns `None` for empty or whitespace-only input.
#[must_use]
pub fn normalize_location(location: &str) -> Option<String> {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}
