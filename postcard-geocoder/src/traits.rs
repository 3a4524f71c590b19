use async_trait::async_trait;

use crate::error::GeocodeResult;
use crate::types::GeocodeCandidate;

/// Free-text location lookup service.
///
/// Implementations perform exactly one request per call; caching and
/// deduplication belong to the caller.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Service identifier (used in logs)
    fn id(&self) -> &'static str;

    /// Search for places matching `query`, best match first.
    ///
    /// # Arguments
    /// * `query` - free-text location, passed through as typed by the user
    /// * `limit` - maximum number of results to request
    ///
    /// An empty `Vec` means the service answered but found nothing.
    async fn search(&self, query: &str, limit: usize) -> GeocodeResult<Vec<GeocodeCandidate>>;
}
