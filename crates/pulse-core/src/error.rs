//! Error types shared across the pipeline

use thiserror::Error;

/// Errors produced by the core components
#[derive(Debug, Error)]
pub enum PulseError {
    /// Request could not be validated (empty query, unresolved symbol)
    #[error("validation error: {0}")]
    Validation(String),

    /// An upstream source failed or timed out
    #[error("upstream error from {source_name}: {reason}")]
    Upstream {
        source_name: String,
        reason: String,
    },

    /// Persistence layer failure
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl PulseError {
    /// Shorthand for an upstream failure tagged with its source
    pub fn upstream(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Upstream {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, PulseError>;
