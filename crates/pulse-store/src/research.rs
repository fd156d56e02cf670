//! Ingested research items, idempotent on the normalized URL
//!
//! The URL is normalized again at this boundary so every comparison and
//! every stored row uses the same dedup key regardless of caller. Inserting
//! a URL that already exists is a no-op, never an error.

use crate::error::Result;
use crate::models::{NewResearchItem, ResearchItem, ResearchStatus};
use chrono::Utc;
use pulse_core::normalize_url;
use sqlx::SqlitePool;
use sqlx::types::Json;

/// Store for the `research_items` table
#[derive(Clone)]
pub struct ResearchStore {
    pool: SqlitePool,
}

impl ResearchStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Has an item with this (normalized) URL already been ingested?
    pub async fn exists(&self, url: &str) -> Result<bool> {
        let found: Option<(i64,)> =
            sqlx::query_as("SELECT id FROM research_items WHERE url = ?1")
                .bind(normalize_url(url))
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }

    /// Insert a summarized article unless its URL is already present.
    ///
    /// Returns true when a row was inserted, false when the conflict-safe
    /// insert hit an existing URL (including one racing in from a concurrent
    /// run).
    pub async fn insert_if_new(&self, item: &NewResearchItem) -> Result<bool> {
        let inserted = sqlx::query(
            "INSERT INTO research_items
                (source, title, url, author, published_at, tickers, summary,
                 thesis, catalysts, risks, score, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 'new', ?12)
             ON CONFLICT(url) DO NOTHING",
        )
        .bind(&item.source)
        .bind(&item.title)
        .bind(normalize_url(&item.url))
        .bind(&item.author)
        .bind(&item.published_at)
        .bind(Json(&item.tickers))
        .bind(&item.summary)
        .bind(Json(&item.thesis))
        .bind(Json(&item.catalysts))
        .bind(Json(&item.risks))
        .bind(item.score)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let is_new = inserted.rows_affected() > 0;
        if is_new {
            tracing::info!(title = %item.title, "research item stored");
        } else {
            tracing::debug!(url = %item.url, "research item already present");
        }
        Ok(is_new)
    }

    /// Items in a given review state, newest first
    pub async fn list_by_status(
        &self,
        status: ResearchStatus,
        limit: i64,
    ) -> Result<Vec<ResearchItem>> {
        Ok(sqlx::query_as::<_, ResearchItem>(
            "SELECT * FROM research_items WHERE status = ?1
             ORDER BY created_at DESC LIMIT ?2",
        )
        .bind(status)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    /// Fetch one item by id
    pub async fn get(&self, id: i64) -> Result<Option<ResearchItem>> {
        Ok(
            sqlx::query_as::<_, ResearchItem>("SELECT * FROM research_items WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    /// Review action from the external dashboard. Returns false when the id
    /// does not exist.
    pub async fn set_status(&self, id: i64, status: ResearchStatus) -> Result<bool> {
        let updated = sqlx::query("UPDATE research_items SET status = ?1 WHERE id = ?2")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(updated.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn sample(url: &str) -> NewResearchItem {
        NewResearchItem {
            source: "investing".to_string(),
            title: "Semis keep running".to_string(),
            url: url.to_string(),
            author: Some("A. Writer".to_string()),
            published_at: Some("2026-08-06".to_string()),
            tickers: vec!["NVDA".to_string()],
            summary: "Chips rally on guidance".to_string(),
            thesis: vec!["demand".to_string()],
            catalysts: vec!["earnings".to_string()],
            risks: vec!["valuation".to_string()],
            score: 72,
        }
    }

    async fn store() -> ResearchStore {
        ResearchStore::new(db::connect_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_insert_then_exists() {
        let store = store().await;
        assert!(!store.exists("https://x.com/a").await.unwrap());

        assert!(store.insert_if_new(&sample("https://x.com/a")).await.unwrap());
        assert!(store.exists("https://x.com/a").await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_a_noop() {
        let store = store().await;
        assert!(store.insert_if_new(&sample("https://x.com/a")).await.unwrap());
        assert!(!store.insert_if_new(&sample("https://x.com/a")).await.unwrap());

        let items = store.list_by_status(ResearchStatus::New, 10).await.unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn test_url_is_normalized_at_the_boundary() {
        let store = store().await;
        assert!(
            store
                .insert_if_new(&sample("https://x.com/a?utm_source=feed#top"))
                .await
                .unwrap()
        );

        // tracking noise resolves to the same stored row
        assert!(store.exists("https://x.com/a").await.unwrap());
        assert!(!store.insert_if_new(&sample("https://x.com/a#bottom")).await.unwrap());

        let items = store.list_by_status(ResearchStatus::New, 10).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, "https://x.com/a");
    }

    #[tokio::test]
    async fn test_review_actions_mutate_status() {
        let store = store().await;
        store.insert_if_new(&sample("https://x.com/a")).await.unwrap();
        let items = store.list_by_status(ResearchStatus::New, 1).await.unwrap();
        let item = &items[0];

        assert!(store.set_status(item.id, ResearchStatus::Approved).await.unwrap());
        let approved = store.get(item.id).await.unwrap().unwrap();
        assert_eq!(approved.status, ResearchStatus::Approved);

        assert!(!store.set_status(9999, ResearchStatus::Ignored).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_fields_round_trip() {
        let store = store().await;
        store.insert_if_new(&sample("https://x.com/a")).await.unwrap();

        let items = store.list_by_status(ResearchStatus::New, 1).await.unwrap();
        let item = &items[0];
        assert_eq!(item.tickers.0, vec!["NVDA".to_string()]);
        assert_eq!(item.score, 72);
        assert_eq!(item.risks.0, vec!["valuation".to_string()]);
    }
}
