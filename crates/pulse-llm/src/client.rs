//! OpenAI-compatible chat-completion client
//!
//! The base URL is configurable so local deployments and compatible
//! gateways work unchanged.

use crate::error::{LlmError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 45;

/// Seam between the workers and the generation backend
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// One-shot completion: optional system prompt plus a user prompt in,
    /// plain text out. Transport failures are errors; content is not
    /// interpreted here.
    async fn generate(&self, system: Option<&str>, prompt: &str) -> Result<String>;
}

/// Configuration for [`ChatClient`]
#[derive(Debug, Clone)]
pub struct ChatClientConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl ChatClientConfig {
    /// Config with the given key and default settings
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            model: model.into(),
            temperature: 0.3,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

/// HTTP implementation of [`TextGenerator`]
pub struct ChatClient {
    client: Client,
    config: ChatClientConfig,
}

impl ChatClient {
    pub fn new(config: ChatClientConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(LlmError::Config("API key must not be empty".to_string()));
        }

        Ok(Self {
            client: Client::new(),
            config,
        })
    }

    /// Model this client generates with
    pub fn model(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl TextGenerator for ChatClient {
    async fn generate(&self, system: Option<&str>, prompt: &str) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let request = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages,
        };

        let url = format!("{}/chat/completions", self.config.api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .timeout(self.config.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("generation error {status}: {body}")));
        }

        let parsed = response.json::<ChatResponse>().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| LlmError::MalformedResponse("empty completion".to_string()))?;

        tracing::debug!(model = %self.config.model, chars = content.len(), "completion received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_is_rejected() {
        let result = ChatClient::new(ChatClientConfig::new("", "gpt-4o-mini"));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_builders() {
        let config = ChatClientConfig::new("sk-test", "gpt-4o-mini")
            .with_api_base("http://localhost:8000/v1")
            .with_temperature(0.2)
            .with_timeout(Duration::from_secs(10));

        assert_eq!(config.api_base, "http://localhost:8000/v1");
        assert_eq!(config.temperature, 0.2);

        let client = ChatClient::new(config).unwrap();
        assert_eq!(client.model(), "gpt-4o-mini");
    }

    #[test]
    fn test_response_envelope_decodes() {
        let raw = r#"{"choices":[{"message":{"role":"assistant","content":"hola"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("hola")
        );
    }
}
