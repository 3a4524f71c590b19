//! 类型定义模块

mod geocode;
mod postcard;

pub use geocode::{normalize_location, GeocodeCacheEntry, GeocodeCacheMap};
pub use postcard::{
    Postcard, PostcardCategory, PostcardInput, PostcardOverview, PostcardRecord, PostcardUpdate,
};

// Re-export geocoder 库的公共类型
pub use postcard_geocoder::{Coordinates, GeocodeCandidate};
