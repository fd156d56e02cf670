//! Persistent storage for the market-pulse pipeline
//!
//! Four entities live here, all append-heavy and all on SQLite via sqlx:
//!
//! - [`jobs::JobQueue`]: the durable analysis-job queue with atomic,
//!   exclusive claim semantics
//! - [`research::ResearchStore`]: ingested articles, idempotent on the
//!   normalized URL
//! - [`runs::WorkerRunStore`]: one audit record per pipeline execution
//! - [`subscribers::SubscriberStore`]: the notification target list
//!
//! Mutual exclusion for claims is delegated entirely to the storage layer;
//! no application-level locking is added on top.

pub mod db;
pub mod error;
pub mod jobs;
pub mod models;
pub mod research;
pub mod runs;
pub mod subscribers;

pub use db::{connect, connect_in_memory};
pub use error::{Result, StoreError};
pub use jobs::JobQueue;
pub use models::{
    AnalysisJob, JobStatus, NewResearchItem, ResearchItem, ResearchStatus, RunStatus, Subscriber,
    WorkerRun,
};
pub use research::ResearchStore;
pub use runs::WorkerRunStore;
pub use subscribers::SubscriberStore;
