use serde::{Deserialize, Serialize};

/// Unified error type for geocoding operations.
///
/// All variants are serializable for structured error reporting. The postcard
/// cache never surfaces these to its callers; they exist so the failure reason
/// can be logged and so direct users of a [`Geocoder`](crate::Geocoder) can
/// tell a transient outage from a bad query.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum GeocodeError {
    /// A network-level error occurred (DNS resolution failure, connection refused, etc.).
    NetworkError {
        /// Error details.
        detail: String,
    },

    /// The HTTP request timed out.
    Timeout {
        /// Error details.
        detail: String,
    },

    /// The service answered with a non-success HTTP status.
    HttpStatus {
        /// HTTP status code.
        status: u16,
        /// Response body (truncated), if any.
        body: Option<String>,
    },

    /// The response body could not be parsed.
    ParseError {
        /// Error details.
        detail: String,
    },

    /// A result carried coordinates that are not usable numbers.
    InvalidCoordinates {
        /// Raw latitude string from the service.
        lat: String,
        /// Raw longitude string from the service.
        lon: String,
    },

    /// The geocoder configuration is unusable (bad base URL, empty user agent).
    InvalidConfig {
        /// Which setting is wrong and why.
        detail: String,
    },
}

impl GeocodeError {
    /// Whether this error is caused by the query or the data rather than by the
    /// service being unreachable.
    ///
    /// Used to pick the log level: `warn` when `true`, `error` otherwise.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(self, Self::InvalidCoordinates { .. })
    }

    /// Whether a later identical request could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::NetworkError { .. } | Self::Timeout { .. } => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl std::fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetworkError { detail } => write!(f, "Network error: {detail}"),
            Self::Timeout { detail } => write!(f, "Request timed out: {detail}"),
            Self::HttpStatus { status, body } => {
                if let Some(body) = body {
                    write!(f, "HTTP {status}: {body}")
                } else {
                    write!(f, "HTTP {status}")
                }
            }
            Self::ParseError { detail } => write!(f, "Failed to parse response: {detail}"),
            Self::InvalidCoordinates { lat, lon } => {
                write!(f, "Invalid coordinates: lat={lat:?}, lon={lon:?}")
            }
            Self::InvalidConfig { detail } => write!(f, "Invalid geocoder config: {detail}"),
        }
    }
}

impl std::error::Error for GeocodeError {}

/// Geocoder Result type alias
pub type GeocodeResult<T> = std::result::Result<T, GeocodeError>;
