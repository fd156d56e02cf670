//! Storage entities and their status enums
//!
//! Status values are stored as lowercase TEXT; list-valued research fields
//! are stored as JSON text columns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

/// Lifecycle of an analysis job.
///
/// Transitions are monotonic and one-directional:
/// `pending -> running -> {completed | failed}`. A job never re-enters
/// `pending` and terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// One user request for on-demand analysis
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AnalysisJob {
    pub id: i64,
    /// Opaque conversation identifier of the requester
    pub owner_id: String,
    pub query_text: String,
    /// Resolved eagerly at enqueue time; may stay empty until claim time
    pub ticker: Option<String>,
    pub status: JobStatus,
    /// Lower runs sooner
    pub priority: i64,
    /// Incremented exactly once per successful claim
    pub attempts: i64,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub result_text: Option<String>,
    pub error: Option<String>,
}

/// Review state of an ingested article
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ResearchStatus {
    New,
    Approved,
    Ignored,
}

/// One ingested article, unique by normalized URL
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ResearchItem {
    pub id: i64,
    pub source: String,
    pub title: String,
    pub url: String,
    pub author: Option<String>,
    /// Free-form timestamp text as published by the site
    pub published_at: Option<String>,
    pub tickers: Json<Vec<String>>,
    pub summary: String,
    pub thesis: Json<Vec<String>>,
    pub catalysts: Json<Vec<String>>,
    pub risks: Json<Vec<String>>,
    pub score: i64,
    pub status: ResearchStatus,
    pub created_at: DateTime<Utc>,
}

/// Payload for inserting a freshly summarized article
#[derive(Debug, Clone)]
pub struct NewResearchItem {
    pub source: String,
    pub title: String,
    pub url: String,
    pub author: Option<String>,
    pub published_at: Option<String>,
    pub tickers: Vec<String>,
    pub summary: String,
    pub thesis: Vec<String>,
    pub catalysts: Vec<String>,
    pub risks: Vec<String>,
    pub score: i64,
}

/// Outcome of one pipeline execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Success,
    Failed,
}

/// Audit record bounding one execution of a scheduled pipeline
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct WorkerRun {
    pub id: i64,
    pub worker_name: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub processed_count: i64,
    pub inserted_count: i64,
    pub error: Option<String>,
}

/// Notification target, owned by the front end; the core only reads it
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscriber {
    pub chat_id: String,
    pub is_active: bool,
    pub tz: String,
    pub quiet_start: i64,
    pub quiet_end: i64,
    pub markets: Json<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
