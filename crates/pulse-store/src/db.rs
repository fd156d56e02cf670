//! Pool setup and schema bootstrap

use crate::error::Result;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

const MAX_CONNECTIONS: u32 = 5;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS analysis_jobs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        owner_id TEXT NOT NULL,
        query_text TEXT NOT NULL,
        ticker TEXT,
        status TEXT NOT NULL DEFAULT 'pending',
        priority INTEGER NOT NULL DEFAULT 100,
        attempts INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        started_at TEXT,
        finished_at TEXT,
        result_text TEXT,
        error TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_jobs_claim
        ON analysis_jobs(status, priority, created_at)",
    "CREATE TABLE IF NOT EXISTS research_items (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        source TEXT NOT NULL,
        title TEXT NOT NULL,
        url TEXT NOT NULL UNIQUE,
        author TEXT,
        published_at TEXT,
        tickers TEXT NOT NULL DEFAULT '[]',
        summary TEXT NOT NULL DEFAULT '',
        thesis TEXT NOT NULL DEFAULT '[]',
        catalysts TEXT NOT NULL DEFAULT '[]',
        risks TEXT NOT NULL DEFAULT '[]',
        score INTEGER NOT NULL DEFAULT 0,
        status TEXT NOT NULL DEFAULT 'new',
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_research_status ON research_items(status)",
    "CREATE INDEX IF NOT EXISTS idx_research_created ON research_items(created_at)",
    "CREATE TABLE IF NOT EXISTS worker_runs (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        worker_name TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'running',
        started_at TEXT NOT NULL,
        finished_at TEXT,
        processed_count INTEGER NOT NULL DEFAULT 0,
        inserted_count INTEGER NOT NULL DEFAULT 0,
        error TEXT
    )",
    "CREATE INDEX IF NOT EXISTS idx_runs_worker ON worker_runs(worker_name, started_at)",
    "CREATE TABLE IF NOT EXISTS subscribers (
        chat_id TEXT PRIMARY KEY,
        is_active INTEGER NOT NULL DEFAULT 1,
        tz TEXT NOT NULL DEFAULT 'America/Mexico_City',
        quiet_start INTEGER NOT NULL DEFAULT 23,
        quiet_end INTEGER NOT NULL DEFAULT 8,
        markets TEXT NOT NULL DEFAULT '[\"indices\",\"fx\",\"crypto\"]',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
];

/// Open a pool against `database_url`, apply pragmas, and bootstrap the
/// schema. `sqlite:path?mode=rwc` creates the file on first use.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await?;

    sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;
    sqlx::query("PRAGMA synchronous=NORMAL").execute(&pool).await?;
    sqlx::query("PRAGMA temp_store=MEMORY").execute(&pool).await?;

    bootstrap(&pool).await?;
    Ok(pool)
}

/// In-memory pool for tests. A single connection keeps every statement on
/// the same ephemeral database.
pub async fn connect_in_memory() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    bootstrap(&pool).await?;
    Ok(pool)
}

async fn bootstrap(pool: &SqlitePool) -> Result<()> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::debug!("schema bootstrap complete");
    Ok(())
}
