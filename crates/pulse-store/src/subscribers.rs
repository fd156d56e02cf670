//! Notification target list
//!
//! Subscribers are owned by the front end; the pipeline only reads the
//! active set when it needs delivery targets. The mutations here are the
//! storage-level operations that front end performs.

use crate::error::Result;
use crate::models::Subscriber;
use chrono::Utc;
use sqlx::SqlitePool;

/// Store for the `subscribers` table
#[derive(Clone)]
pub struct SubscriberStore {
    pool: SqlitePool,
}

impl SubscriberStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Chat ids of every active subscriber
    pub async fn active_chat_ids(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT chat_id FROM subscribers WHERE is_active = 1")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(chat_id,)| chat_id).collect())
    }

    /// Subscribe (or re-activate) a chat
    pub async fn upsert(&self, chat_id: &str) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO subscribers (chat_id, is_active, created_at, updated_at)
             VALUES (?1, 1, ?2, ?2)
             ON CONFLICT(chat_id) DO UPDATE SET is_active = 1, updated_at = ?2",
        )
        .bind(chat_id)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Deactivate a chat. Returns false when the chat is unknown.
    pub async fn deactivate(&self, chat_id: &str) -> Result<bool> {
        let updated = sqlx::query(
            "UPDATE subscribers SET is_active = 0, updated_at = ?1 WHERE chat_id = ?2",
        )
        .bind(Utc::now())
        .bind(chat_id)
        .execute(&self.pool)
        .await?;
        Ok(updated.rows_affected() > 0)
    }

    /// Full subscriber row, for delivery-window checks
    pub async fn get(&self, chat_id: &str) -> Result<Option<Subscriber>> {
        Ok(
            sqlx::query_as::<_, Subscriber>("SELECT * FROM subscribers WHERE chat_id = ?1")
                .bind(chat_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    async fn store() -> SubscriberStore {
        SubscriberStore::new(db::connect_in_memory().await.unwrap())
    }

    #[tokio::test]
    async fn test_upsert_and_list_active() {
        let store = store().await;
        store.upsert("chat-1").await.unwrap();
        store.upsert("chat-2").await.unwrap();

        let mut active = store.active_chat_ids().await.unwrap();
        active.sort();
        assert_eq!(active, vec!["chat-1", "chat-2"]);
    }

    #[tokio::test]
    async fn test_deactivate_removes_from_active_set() {
        let store = store().await;
        store.upsert("chat-1").await.unwrap();
        assert!(store.deactivate("chat-1").await.unwrap());
        assert!(store.active_chat_ids().await.unwrap().is_empty());

        // re-subscribing flips it back
        store.upsert("chat-1").await.unwrap();
        assert_eq!(store.active_chat_ids().await.unwrap(), vec!["chat-1"]);
    }

    #[tokio::test]
    async fn test_deactivate_unknown_chat_is_false() {
        let store = store().await;
        assert!(!store.deactivate("nobody").await.unwrap());
    }

    #[tokio::test]
    async fn test_defaults_applied_on_insert() {
        let store = store().await;
        store.upsert("chat-1").await.unwrap();

        let subscriber = store.get("chat-1").await.unwrap().unwrap();
        assert!(subscriber.is_active);
        assert_eq!(subscriber.quiet_start, 23);
        assert_eq!(subscriber.markets.0.len(), 3);
    }
}
