//! Error types for storage operations

use thiserror::Error;

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A status transition was attempted from the wrong state
    #[error("job {id} is not in the required '{expected}' state")]
    InvalidTransition { id: i64, expected: &'static str },

    /// A worker run was closed twice
    #[error("worker run {id} is already closed")]
    RunAlreadyClosed { id: i64 },
}

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for pulse_core::PulseError {
    fn from(err: StoreError) -> Self {
        pulse_core::PulseError::Persistence(err.to_string())
    }
}
