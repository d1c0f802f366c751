//! Error types for loading forecast results.

use thiserror::Error;

/// Result type alias using ForecastError.
pub type ForecastResult<T> = Result<T, ForecastError>;

/// Errors raised while reading a forecast results document.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Failed to read results document {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid results document: {0}")]
    InvalidDocument(#[from] serde_json::Error),
}
