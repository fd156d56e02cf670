//! Worker run audit records
//!
//! Every pipeline execution is bounded by exactly one record: opened as
//! `running` at the start, closed exactly once with final counts, never
//! touched again.

use crate::error::{Result, StoreError};
use crate::models::WorkerRun;
use chrono::Utc;
use sqlx::SqlitePool;

/// Store for the `worker_runs` table
#[derive(Clone)]
pub struct WorkerRunStore {
    pool: SqlitePool,
}

impl WorkerRunStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open a new run in `running`
    pub async fn open(&self, worker_name: &str) -> Result<WorkerRun> {
        let run = sqlx::query_as::<_, WorkerRun>(
            "INSERT INTO worker_runs (worker_name, status, started_at)
             VALUES (?1, 'running', ?2)
             RETURNING *",
        )
        .bind(worker_name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(run_id = run.id, worker = worker_name, "worker run opened");
        Ok(run)
    }

    /// Close a run as successful with its final counts
    pub async fn close_success(&self, id: i64, processed: i64, inserted: i64) -> Result<()> {
        self.close(id, "success", processed, inserted, None).await
    }

    /// Close a run as failed, capturing the error
    pub async fn close_failed(
        &self,
        id: i64,
        processed: i64,
        inserted: i64,
        error: &str,
    ) -> Result<()> {
        self.close(id, "failed", processed, inserted, Some(error)).await
    }

    async fn close(
        &self,
        id: i64,
        status: &str,
        processed: i64,
        inserted: i64,
        error: Option<&str>,
    ) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE worker_runs
             SET status = ?1, finished_at = ?2, processed_count = ?3,
                 inserted_count = ?4, error = ?5
             WHERE id = ?6 AND status = 'running'",
        )
        .bind(status)
        .bind(Utc::now())
        .bind(processed)
        .bind(inserted)
        .bind(error)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::RunAlreadyClosed { id });
        }
        tracing::info!(run_id = id, status, processed, inserted, "worker run closed");
        Ok(())
    }

    /// Fetch one run by id
    pub async fn get(&self, id: i64) -> Result<Option<WorkerRun>> {
        Ok(
            sqlx::query_as::<_, WorkerRun>("SELECT * FROM worker_runs WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    /// Most recent runs of a worker, newest first
    pub async fn recent(&self, worker_name: &str, limit: i64) -> Result<Vec<WorkerRun>> {
        Ok(sqlx::query_as::<_, WorkerRun>(
            "SELECT * FROM worker_runs WHERE worker_name = ?1
             ORDER BY started_at DESC LIMIT ?2",
        )
        .bind(worker_name)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }
}
