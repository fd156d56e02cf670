//! Durable analysis-job queue with exclusive claim semantics
//!
//! Claiming is a single UPDATE over a nested oldest-eligible SELECT, so the
//! promotion from `pending` to `running` is atomic inside the storage layer.
//! Under N concurrent claimers each pending job is handed to exactly one of
//! them. No application lock sits on top; adding one would be redundant and
//! could deadlock against the database's own locking.

use crate::error::{Result, StoreError};
use crate::models::{AnalysisJob, JobStatus};
use chrono::Utc;
use sqlx::SqlitePool;
use std::time::Duration;

/// Default priority for user-submitted jobs; lower runs sooner
pub const DEFAULT_PRIORITY: i64 = 100;

/// Error recorded on jobs reclaimed by the stale sweep
pub const STALE_CLAIM_ERROR: &str = "stale_claim";

/// Queue of analysis requests backed by the `analysis_jobs` table
#[derive(Clone)]
pub struct JobQueue {
    pool: SqlitePool,
}

impl JobQueue {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a new request as `pending`.
    ///
    /// The ticker is resolved eagerly from the query text but may be absent;
    /// resolution is retried (and may fail the job) at processing time.
    pub async fn enqueue(&self, owner_id: &str, query_text: &str) -> Result<AnalysisJob> {
        self.enqueue_with_priority(owner_id, query_text, DEFAULT_PRIORITY)
            .await
    }

    pub async fn enqueue_with_priority(
        &self,
        owner_id: &str,
        query_text: &str,
        priority: i64,
    ) -> Result<AnalysisJob> {
        let ticker = pulse_core::resolver::resolve_symbol(query_text);

        let job = sqlx::query_as::<_, AnalysisJob>(
            "INSERT INTO analysis_jobs
                (owner_id, query_text, ticker, status, priority, attempts, created_at)
             VALUES (?1, ?2, ?3, 'pending', ?4, 0, ?5)
             RETURNING *",
        )
        .bind(owner_id)
        .bind(query_text)
        .bind(&ticker)
        .bind(priority)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(job_id = job.id, ticker = ?job.ticker, "job enqueued");
        Ok(job)
    }

    /// Atomically claim the oldest eligible pending job.
    ///
    /// Order is (priority ASC, created_at ASC, id ASC). The claimed job is
    /// moved to `running` with `started_at` set and `attempts` incremented,
    /// all in one statement. Returns `None` when nothing is pending.
    pub async fn claim_next(&self) -> Result<Option<AnalysisJob>> {
        let claimed = sqlx::query_as::<_, AnalysisJob>(
            "UPDATE analysis_jobs
             SET status = 'running', started_at = ?1, attempts = attempts + 1
             WHERE id = (
                 SELECT id FROM analysis_jobs
                 WHERE status = 'pending'
                 ORDER BY priority ASC, created_at ASC, id ASC
                 LIMIT 1
             )
             AND status = 'pending'
             RETURNING *",
        )
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(job) = claimed.as_ref() {
            tracing::info!(job_id = job.id, attempts = job.attempts, "job claimed");
        }
        Ok(claimed)
    }

    /// Finalize a running job as completed. Only valid from `running`.
    pub async fn complete_job(&self, id: i64, result_text: &str) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE analysis_jobs
             SET status = 'completed', finished_at = ?1, result_text = ?2
             WHERE id = ?3 AND status = 'running'",
        )
        .bind(Utc::now())
        .bind(result_text)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::InvalidTransition {
                id,
                expected: "running",
            });
        }
        tracing::info!(job_id = id, "job completed");
        Ok(())
    }

    /// Finalize a running job as failed. Terminal: nothing re-queues it.
    pub async fn fail_job(&self, id: i64, error_text: &str) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE analysis_jobs
             SET status = 'failed', finished_at = ?1, error = ?2
             WHERE id = ?3 AND status = 'running'",
        )
        .bind(Utc::now())
        .bind(error_text)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::InvalidTransition {
                id,
                expected: "running",
            });
        }
        tracing::warn!(job_id = id, error = error_text, "job failed");
        Ok(())
    }

    /// Reconciliation sweep for jobs orphaned by a crashed worker.
    ///
    /// Jobs `running` longer than `max_age` are finalized as `failed` with a
    /// fixed reason. They are not re-queued: the status lifecycle stays
    /// one-directional. Returns the number of reclaimed jobs.
    pub async fn reclaim_stale(&self, max_age: Duration) -> Result<u64> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(max_age).unwrap_or_else(|_| chrono::Duration::zero());

        let reclaimed = sqlx::query(
            "UPDATE analysis_jobs
             SET status = 'failed', finished_at = ?1, error = ?2
             WHERE status = 'running' AND started_at < ?3",
        )
        .bind(Utc::now())
        .bind(STALE_CLAIM_ERROR)
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        let count = reclaimed.rows_affected();
        if count > 0 {
            tracing::warn!(count, "reclaimed stale running jobs");
        }
        Ok(count)
    }

    /// Fetch a job by id
    pub async fn get(&self, id: i64) -> Result<Option<AnalysisJob>> {
        Ok(
            sqlx::query_as::<_, AnalysisJob>("SELECT * FROM analysis_jobs WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    /// Number of jobs currently in `status`
    pub async fn count_by_status(&self, status: JobStatus) -> Result<i64> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM analysis_jobs WHERE status = ?1")
                .bind(status)
                .fetch_one(&self.pool)
                .await?,
        )
    }
}
