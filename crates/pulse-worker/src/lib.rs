//! Worker processes for the market-pulse pipeline
//!
//! Two independent loops live here:
//!
//! - [`analysis::AnalysisWorker`]: claims queued analysis jobs, gathers
//!   news/market context in parallel, generates the result text, finalizes
//!   the job, and notifies the requester.
//! - [`ingest::IngestionPipeline`]: one audited crawl -> dedup -> extract ->
//!   summarize -> persist pass over the external content source.
//!
//! Both isolate per-job / per-article failures; neither loop dies because
//! one unit of work went wrong.

pub mod analysis;
pub mod crawler;
pub mod error;
pub mod ingest;
pub mod notify;

pub use analysis::AnalysisWorker;
pub use crawler::{ArticlePage, CandidateLink, ContentSource, HttpContentSource};
pub use error::{Result, WorkerError};
pub use ingest::{IngestionPipeline, RunOutcome};
pub use notify::{NotificationSink, TelegramSink};
