//! Result delivery to the originating conversation
//!
//! Delivery is strictly best-effort: errors are surfaced to the caller to
//! log, never retried, and never allowed to block job finalization. A
//! missing token degrades every send to a logged skip.

use crate::error::{Result, WorkerError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Messaging sink the workers deliver result text through
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver `text` to the conversation identified by `owner_id`
    async fn send(&self, owner_id: &str, text: &str) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

/// Telegram-shaped HTTP sink
pub struct TelegramSink {
    client: Client,
    token: Option<String>,
    timeout: Duration,
}

impl TelegramSink {
    pub fn new(token: Option<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            token,
            timeout,
        }
    }
}

#[async_trait]
impl NotificationSink for TelegramSink {
    async fn send(&self, owner_id: &str, text: &str) -> Result<()> {
        let Some(token) = self.token.as_deref() else {
            tracing::warn!("notification token not configured, message dropped");
            return Ok(());
        };

        let url = format!("{TELEGRAM_API_BASE}/bot{token}/sendMessage");
        let response = self
            .client
            .post(&url)
            .json(&SendMessageRequest {
                chat_id: owner_id,
                text,
                parse_mode: "Markdown",
            })
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WorkerError::Notify(format!(
                "send to {owner_id} failed with {status}: {body}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_token_drops_message_without_error() {
        let sink = TelegramSink::new(None, Duration::from_secs(1));
        assert!(sink.send("chat-1", "hola").await.is_ok());
    }
}
