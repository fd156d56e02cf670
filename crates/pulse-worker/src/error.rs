//! Error types for worker operations

use thiserror::Error;

/// Worker loop and pipeline errors
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Market data or news feed failure
    #[error(transparent)]
    Market(#[from] pulse_market::MarketError),

    /// Storage failure
    #[error(transparent)]
    Store(#[from] pulse_store::StoreError),

    /// Generation step failure
    #[error(transparent)]
    Llm(#[from] pulse_llm::LlmError),

    /// Content source crawl failure
    #[error("crawl error: {0}")]
    Crawl(String),

    /// Notification delivery failure
    #[error("notification error: {0}")]
    Notify(String),

    /// Network or HTTP error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Result type alias for worker operations
pub type Result<T> = std::result::Result<T, WorkerError>;
