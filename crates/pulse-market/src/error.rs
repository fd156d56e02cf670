//! Error types for market data operations

use thiserror::Error;

/// Market data and news feed errors
#[derive(Debug, Error)]
pub enum MarketError {
    /// API request failed or returned a non-success status
    #[error("API error: {0}")]
    Api(String),

    /// Network or HTTP error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for market operations
pub type Result<T> = std::result::Result<T, MarketError>;

impl From<MarketError> for pulse_core::PulseError {
    fn from(err: MarketError) -> Self {
        pulse_core::PulseError::upstream("market", err.to_string())
    }
}
