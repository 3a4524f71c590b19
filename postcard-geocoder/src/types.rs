//! Geocoding data types.

use serde::{Deserialize, Serialize};

use crate::error::{GeocodeError, GeocodeResult};

/// A latitude/longitude pair in decimal degrees.
///
/// Both halves always travel together: a location either has a full pair or
/// no coordinates at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Build a pair, rejecting non-finite or out-of-range values.
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        valid.then_some(Self { lat, lng })
    }

    /// Pair two optional halves; a lone latitude or longitude yields `None`.
    #[must_use]
    pub fn from_parts(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        match (lat, lng) {
            (Some(lat), Some(lng)) => Some(Self { lat, lng }),
            _ => None,
        }
    }
}

/// One place returned by a geocoding search.
///
/// Mirrors the Nominatim JSON shape, where coordinates are decimal strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeCandidate {
    #[serde(default)]
    pub place_id: u64,
    #[serde(default)]
    pub display_name: String,
    pub lat: String,
    pub lon: String,
}

impl GeocodeCandidate {
    /// Parse the string coordinates into a validated pair.
    pub fn coordinates(&self) -> GeocodeResult<Coordinates> {
        let lat = self.lat.trim().parse::<f64>().ok();
        let lng = self.lon.trim().parse::<f64>().ok();

        lat.zip(lng)
            .and_then(|(lat, lng)| Coordinates::new(lat, lng))
            .ok_or_else(|| GeocodeError::InvalidCoordinates {
                lat: self.lat.clone(),
                lon: self.lon.clone(),
            })
    }
}
