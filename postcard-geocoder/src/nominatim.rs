//! Nominatim (OpenStreetMap) geocoder.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::USER_AGENT;

use crate::error::{GeocodeError, GeocodeResult};
use crate::http_client::HttpUtils;
use crate::traits::Geocoder;
use crate::types::GeocodeCandidate;

/// Public Nominatim instance.
pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Client identification required by the Nominatim usage policy.
pub const DEFAULT_USER_AGENT: &str = "PostcardApp/1.0";

/// Shared HTTP client for Nominatim calls.
static HTTP_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(reqwest::Client::new);

/// Nominatim connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NominatimConfig {
    /// Service root, without the `/search` path
    pub base_url: String,
    /// Sent as the `User-Agent` header on every request
    pub user_agent: String,
    /// Per-request timeout; `None` leaves it to the transport default
    pub timeout: Option<Duration>,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
        }
    }
}

impl NominatimConfig {
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Geocoder backed by the Nominatim `/search` endpoint.
pub struct NominatimGeocoder {
    base_url: String,
    user_agent: String,
    timeout: Option<Duration>,
}

impl NominatimGeocoder {
    /// Create a geocoder from validated settings.
    ///
    /// # Errors
    /// Returns `GeocodeError::InvalidConfig` if the base URL is not an
    /// absolute http(s) URL or the user agent is blank.
    pub fn new(config: NominatimConfig) -> GeocodeResult<Self> {
        let parsed = url::Url::parse(&config.base_url).map_err(|e| GeocodeError::InvalidConfig {
            detail: format!("base_url {:?}: {e}", config.base_url),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(GeocodeError::InvalidConfig {
                detail: format!("base_url must be http(s), got {}", parsed.scheme()),
            });
        }

        let user_agent = config.user_agent.trim();
        if user_agent.is_empty() {
            return Err(GeocodeError::InvalidConfig {
                detail: "user_agent cannot be empty".to_string(),
            });
        }

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_agent: user_agent.to_string(),
            timeout: config.timeout,
        })
    }

    fn search_url(&self, query: &str, limit: usize) -> String {
        format!(
            "{}/search?format=json&q={}&limit={limit}",
            self.base_url,
            urlencoding::encode(query)
        )
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    fn id(&self) -> &'static str {
        "nominatim"
    }

    async fn search(&self, query: &str, limit: usize) -> GeocodeResult<Vec<GeocodeCandidate>> {
        let url = self.search_url(query, limit.max(1));

        let mut request = HTTP_CLIENT.get(&url).header(USER_AGENT, &self.user_agent);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }

        let body = HttpUtils::execute_request(request, self.id(), "GET", &url).await?;
        HttpUtils::parse_json(&body, self.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_public_instance() {
        let config = NominatimConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.user_agent, "PostcardApp/1.0");
        assert!(config.timeout.is_none());
    }

    #[test]
    fn search_url_encodes_query() {
        let geocoder = NominatimGeocoder::new(NominatimConfig::default()).unwrap();
        assert_eq!(
            geocoder.search_url("Paris, France", 1),
            "https://nominatim.openstreetmap.org/search?format=json&q=Paris%2C%20France&limit=1"
        );
    }

    #[test]
    fn trailing_slash_is_dropped() {
        let config = NominatimConfig::default().with_base_url("http://localhost:8080/");
        let geocoder = NominatimGeocoder::new(config).unwrap();
        assert!(
            geocoder
                .search_url("x", 5)
                .starts_with("http://localhost:8080/search?")
        );
    }

    #[test]
    fn rejects_blank_user_agent() {
        let config = NominatimConfig::default().with_user_agent("   ");
        let err = NominatimGeocoder::new(config).err().unwrap();
        assert!(matches!(err, GeocodeError::InvalidConfig { .. }));
    }

    #[test]
    fn rejects_non_http_base_url() {
        let config = NominatimConfig::default().with_base_url("ftp://example.com");
        assert!(NominatimGeocoder::new(config).is_err());

        let config = NominatimConfig::default().with_base_url("not a url");
        assert!(NominatimGeocoder::new(config).is_err());
    }
}
