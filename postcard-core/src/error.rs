//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

// Re-export library error type
pub use postcard_geocoder::GeocodeError;

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Postcard not found
    #[error("Postcard not found: {0}")]
    PostcardNotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Geocoder error (converting from library)
    #[error("{0}")]
    Geocode(#[from] GeocodeError),
}

impl CoreError {
    /// Whether it is expected behavior (user input, missing record, etc.), used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::PostcardNotFound(_) | Self::ValidationError(_) => true,
            Self::Geocode(e) => e.is_expected(),
            Self::StorageError(_) | Self::SerializationError(_) => false,
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
