//! # postcard-geocoder
//!
//! Turns free-text locations ("Chicago, Illinois, USA") into coordinates.
//!
//! The crate defines the [`Geocoder`] trait and one implementation,
//! [`NominatimGeocoder`], which queries an OpenStreetMap Nominatim instance.
//! Each call performs exactly one HTTP request; result caching lives in
//! `postcard-core`.
//!
//! ## Feature Flags
//!
//! - **`rustls`** *(default)*: Use rustls.
//! - **`native-tls`**: Use the platform's native TLS implementation.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use postcard_geocoder::{Geocoder, NominatimConfig, NominatimGeocoder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let geocoder = NominatimGeocoder::new(NominatimConfig::default())?;
//!     let results = geocoder.search("London, United Kingdom", 1).await?;
//!     if let Some(best) = results.first() {
//!         let coords = best.coordinates()?;
//!         println!("{} -> {}, {}", best.display_name, coords.lat, coords.lng);
//!     }
//!     Ok(())
//! }
//! ```

mod error;
mod http_client;
mod nominatim;
mod traits;
mod types;
mod utils;

pub use error::{GeocodeError, GeocodeResult};
pub use nominatim::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT, NominatimConfig, NominatimGeocoder};
pub use traits::Geocoder;
pub use types::{Coordinates, GeocodeCandidate};
