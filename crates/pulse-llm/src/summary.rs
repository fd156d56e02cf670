//! Article summarization with a typed parse-or-fallback decode
//!
//! Generated text is never trusted: the payload either deserializes as the
//! full [`ArticleSummary`] schema or the raw text is kept as a fallback.
//! Decoding never raises; only a transport failure of the generation step
//! itself is an error.

use crate::client::TextGenerator;
use crate::error::Result;
use crate::prompts;
use serde::{Deserialize, Serialize};

/// Characters of raw output kept as the fallback tldr
const FALLBACK_TLDR_CHARS: usize = 400;

/// Neutral score assigned when the model output had none
const FALLBACK_SCORE: i64 = 50;

/// Input contract of the summarization step
#[derive(Debug, Clone)]
pub struct ArticleInput {
    pub title: String,
    pub url: String,
    pub content: String,
}

/// Structured summary schema the model is asked to produce
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub tldr: String,
    pub thesis: Vec<String>,
    pub catalysts: Vec<String>,
    pub risks: Vec<String>,
    pub tickers: Vec<String>,
    pub score: i64,
}

/// Result of decoding generated text against the schema
#[derive(Debug, Clone, PartialEq)]
pub enum SummaryOutcome {
    /// The payload deserialized as the full schema
    Parsed(ArticleSummary),
    /// Anything else: the raw text is preserved verbatim
    Fallback(String),
}

impl SummaryOutcome {
    /// Decode raw model output. All-or-nothing: partial schemas fall back.
    pub fn decode(raw: &str) -> Self {
        match serde_json::from_str::<ArticleSummary>(raw.trim()) {
            Ok(summary) => Self::Parsed(summary),
            Err(err) => {
                tracing::debug!(%err, "summary payload not parseable, keeping raw text");
                Self::Fallback(raw.to_string())
            }
        }
    }

    /// Collapse into a usable summary: fallbacks become a truncated tldr
    /// with empty lists and a neutral score.
    pub fn into_summary(self) -> ArticleSummary {
        match self {
            Self::Parsed(summary) => summary,
            Self::Fallback(raw) => ArticleSummary {
                tldr: raw.chars().take(FALLBACK_TLDR_CHARS).collect(),
                thesis: Vec::new(),
                catalysts: Vec::new(),
                risks: Vec::new(),
                tickers: Vec::new(),
                score: FALLBACK_SCORE,
            },
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }
}

/// Summarize one article. Returns an error only when the generation step
/// itself fails; malformed output degrades to [`SummaryOutcome::Fallback`].
pub async fn summarize_article(
    generator: &dyn TextGenerator,
    input: &ArticleInput,
) -> Result<SummaryOutcome> {
    let prompt = prompts::summarize_prompt(&input.title, &input.url, &input.content);
    let raw = generator
        .generate(Some(prompts::summarize_system()), &prompt)
        .await?;

    Ok(SummaryOutcome::decode(&raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use async_trait::async_trait;

    struct CannedGenerator(String);

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _system: Option<&str>, _prompt: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    struct BrokenGenerator;

    #[async_trait]
    impl TextGenerator for BrokenGenerator {
        async fn generate(&self, _system: Option<&str>, _prompt: &str) -> Result<String> {
            Err(LlmError::Api("503".to_string()))
        }
    }

    fn valid_payload() -> &'static str {
        r#"{
            "tldr": "Chips rally on strong guidance",
            "thesis": ["demand holds"],
            "catalysts": ["earnings"],
            "risks": ["valuation"],
            "tickers": ["NVDA"],
            "score": 78
        }"#
    }

    #[test]
    fn test_decode_valid_schema() {
        let outcome = SummaryOutcome::decode(valid_payload());
        assert!(outcome.is_parsed());

        let summary = outcome.into_summary();
        assert_eq!(summary.score, 78);
        assert_eq!(summary.tickers, vec!["NVDA".to_string()]);
    }

    #[test]
    fn test_decode_non_json_falls_back() {
        let outcome = SummaryOutcome::decode("Here is my summary: stocks went up.");
        assert!(!outcome.is_parsed());

        let summary = outcome.into_summary();
        assert!(summary.tldr.starts_with("Here is my summary"));
        assert_eq!(summary.score, 50);
        assert!(summary.thesis.is_empty());
    }

    #[test]
    fn test_decode_partial_schema_falls_back() {
        // missing keys: all-or-nothing decoding rejects it
        let outcome = SummaryOutcome::decode(r#"{"tldr": "only this"}"#);
        assert!(!outcome.is_parsed());
    }

    #[test]
    fn test_fallback_tldr_is_truncated() {
        let raw = "y".repeat(1000);
        let summary = SummaryOutcome::decode(&raw).into_summary();
        assert_eq!(summary.tldr.chars().count(), 400);
    }

    #[tokio::test]
    async fn test_summarize_article_decodes_output() {
        let generator = CannedGenerator(valid_payload().to_string());
        let input = ArticleInput {
            title: "Semis".to_string(),
            url: "https://x.com/a".to_string(),
            content: "body".to_string(),
        };

        let outcome = summarize_article(&generator, &input).await.unwrap();
        assert!(outcome.is_parsed());
    }

    #[tokio::test]
    async fn test_transport_failure_is_an_error() {
        let input = ArticleInput {
            title: "Semis".to_string(),
            url: "https://x.com/a".to_string(),
            content: "body".to_string(),
        };

        let result = summarize_article(&BrokenGenerator, &input).await;
        assert!(result.is_err());
    }
}
