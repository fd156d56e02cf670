//! Error types for generation operations

use thiserror::Error;

/// Generation client errors
#[derive(Debug, Error)]
pub enum LlmError {
    /// Missing or invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// The API returned a non-success status
    #[error("API error: {0}")]
    Api(String),

    /// Network or HTTP error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response envelope could not be parsed
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Result type alias for generation operations
pub type Result<T> = std::result::Result<T, LlmError>;

impl From<LlmError> for pulse_core::PulseError {
    fn from(err: LlmError) -> Self {
        pulse_core::PulseError::upstream("generation", err.to_string())
    }
}
