//! Runtime configuration for the pipeline
//!
//! Everything is loadable from the environment; only the generation API key
//! is required, and only by the worker binary. Every other credential
//! degrades the component that needs it instead of failing startup.

use crate::error::{PulseError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_DATABASE_URL: &str = "sqlite:pulse.db?mode=rwc";
const DEFAULT_GENERATION_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_GENERATION_MODEL: &str = "gpt-4o-mini";
const DEFAULT_HOME_URL: &str = "https://www.investing.com/";
const DEFAULT_LISTING_URL: &str = "https://www.investing.com/analysis/";

/// Configuration for the analysis and ingestion workers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseConfig {
    /// Connection string for the persistent store
    pub database_url: String,

    /// Primary news feed API key (optional; feed degrades to empty)
    pub primary_feed_api_key: Option<String>,

    /// Secondary news feed / market data API key (optional)
    pub secondary_feed_api_key: Option<String>,

    /// Generation API key (required by the worker binary)
    pub generation_api_key: Option<String>,

    /// Base URL of the generation API
    pub generation_api_base: String,

    /// Model used for summaries and on-demand analysis
    pub generation_model: String,

    /// Content source home page (session warm-up)
    pub content_home_url: String,

    /// Content source listing page to crawl
    pub content_listing_url: String,

    /// Content source credentials (optional; degrades to anonymous)
    pub content_email: Option<String>,
    pub content_password: Option<String>,

    /// Maximum candidate articles per ingestion run
    pub max_articles: usize,

    /// Minimum extracted body length; shorter bodies are skipped
    pub min_body_len: usize,

    /// Worker idle poll interval
    pub poll_interval: Duration,

    /// Age after which a `running` job is reclaimed as failed
    pub stale_claim_after: Duration,

    /// Freshness window of the merged-news cache
    pub news_cache_ttl: Duration,

    /// Timeout applied to upstream HTTP calls
    pub request_timeout: Duration,

    /// Messaging sink token (optional; sends are skipped without it)
    pub notification_token: Option<String>,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            primary_feed_api_key: None,
            secondary_feed_api_key: None,
            generation_api_key: None,
            generation_api_base: DEFAULT_GENERATION_API_BASE.to_string(),
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            content_home_url: DEFAULT_HOME_URL.to_string(),
            content_listing_url: DEFAULT_LISTING_URL.to_string(),
            content_email: None,
            content_password: None,
            max_articles: 8,
            min_body_len: 200,
            poll_interval: Duration::from_secs(20),
            stale_claim_after: Duration::from_secs(900),
            news_cache_ttl: Duration::from_secs(300),
            request_timeout: Duration::from_secs(15),
            notification_token: None,
        }
    }
}

impl PulseConfig {
    /// Create a new configuration builder
    pub fn builder() -> PulseConfigBuilder {
        PulseConfigBuilder::default()
    }

    /// Load every known setting from the environment over the defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            database_url: env_or("DATABASE_URL", &defaults.database_url),
            primary_feed_api_key: env_opt("MARKETAUX_API_KEY"),
            secondary_feed_api_key: env_opt("FINNHUB_API_KEY"),
            generation_api_key: env_opt("OPENAI_API_KEY"),
            generation_api_base: env_or("OPENAI_API_BASE", &defaults.generation_api_base),
            generation_model: env_or("OPENAI_MODEL", &defaults.generation_model),
            content_home_url: env_or("INVESTING_HOME_URL", &defaults.content_home_url),
            content_listing_url: env_or("INVESTING_LATEST_URL", &defaults.content_listing_url),
            content_email: env_opt("INVESTING_EMAIL"),
            content_password: env_opt("INVESTING_PASSWORD"),
            max_articles: env_parsed("INVESTING_MAX_ARTICLES", defaults.max_articles)?,
            min_body_len: env_parsed("INVESTING_MIN_BODY_LEN", defaults.min_body_len)?,
            poll_interval: Duration::from_secs(env_parsed(
                "JOB_POLL_SECONDS",
                defaults.poll_interval.as_secs(),
            )?),
            stale_claim_after: Duration::from_secs(env_parsed(
                "JOB_STALE_SECONDS",
                defaults.stale_claim_after.as_secs(),
            )?),
            news_cache_ttl: Duration::from_secs(env_parsed(
                "NEWS_CACHE_TTL_SECONDS",
                defaults.news_cache_ttl.as_secs(),
            )?),
            request_timeout: Duration::from_secs(env_parsed(
                "REQUEST_TIMEOUT_SECONDS",
                defaults.request_timeout.as_secs(),
            )?),
            notification_token: env_opt("TELEGRAM_BOT_TOKEN"),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.database_url.is_empty() {
            return Err(PulseError::Config("database_url must not be empty".to_string()));
        }
        if self.max_articles == 0 {
            return Err(PulseError::Config("max_articles must be greater than 0".to_string()));
        }
        if self.poll_interval.is_zero() {
            return Err(PulseError::Config("poll_interval must be greater than 0".to_string()));
        }
        Ok(())
    }

    /// The generation key is the only credential that is fatal when missing
    pub fn require_generation_key(&self) -> Result<&str> {
        self.generation_api_key
            .as_deref()
            .ok_or_else(|| PulseError::Config("OPENAI_API_KEY is not set".to_string()))
    }

    /// Presence of each credential, for the `doctor` subcommand
    pub fn doctor(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("DATABASE_URL", !self.database_url.is_empty()),
            ("OPENAI_API_KEY", self.generation_api_key.is_some()),
            ("TELEGRAM_BOT_TOKEN", self.notification_token.is_some()),
            ("MARKETAUX_API_KEY", self.primary_feed_api_key.is_some()),
            ("FINNHUB_API_KEY", self.secondary_feed_api_key.is_some()),
            ("INVESTING_EMAIL", self.content_email.is_some()),
            ("INVESTING_PASSWORD", self.content_password.is_some()),
        ]
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env_opt(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| PulseError::Config(format!("{key} must be a number, got '{raw}'"))),
        None => Ok(default),
    }
}

/// Builder for [`PulseConfig`]
#[derive(Debug, Default)]
pub struct PulseConfigBuilder {
    database_url: Option<String>,
    primary_feed_api_key: Option<String>,
    secondary_feed_api_key: Option<String>,
    generation_api_key: Option<String>,
    generation_api_base: Option<String>,
    generation_model: Option<String>,
    content_home_url: Option<String>,
    content_listing_url: Option<String>,
    content_email: Option<String>,
    content_password: Option<String>,
    max_articles: Option<usize>,
    min_body_len: Option<usize>,
    poll_interval: Option<Duration>,
    stale_claim_after: Option<Duration>,
    news_cache_ttl: Option<Duration>,
    request_timeout: Option<Duration>,
    notification_token: Option<String>,
}

impl PulseConfigBuilder {
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    pub fn primary_feed_api_key(mut self, key: impl Into<String>) -> Self {
        self.primary_feed_api_key = Some(key.into());
        self
    }

    pub fn secondary_feed_api_key(mut self, key: impl Into<String>) -> Self {
        self.secondary_feed_api_key = Some(key.into());
        self
    }

    pub fn generation_api_key(mut self, key: impl Into<String>) -> Self {
        self.generation_api_key = Some(key.into());
        self
    }

    pub fn generation_api_base(mut self, base: impl Into<String>) -> Self {
        self.generation_api_base = Some(base.into());
        self
    }

    pub fn generation_model(mut self, model: impl Into<String>) -> Self {
        self.generation_model = Some(model.into());
        self
    }

    pub fn content_listing_url(mut self, url: impl Into<String>) -> Self {
        self.content_listing_url = Some(url.into());
        self
    }

    pub fn max_articles(mut self, max: usize) -> Self {
        self.max_articles = Some(max);
        self
    }

    pub fn min_body_len(mut self, len: usize) -> Self {
        self.min_body_len = Some(len);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn stale_claim_after(mut self, age: Duration) -> Self {
        self.stale_claim_after = Some(age);
        self
    }

    pub fn news_cache_ttl(mut self, ttl: Duration) -> Self {
        self.news_cache_ttl = Some(ttl);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn notification_token(mut self, token: impl Into<String>) -> Self {
        self.notification_token = Some(token.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<PulseConfig> {
        let defaults = PulseConfig::default();

        let config = PulseConfig {
            database_url: self.database_url.unwrap_or(defaults.database_url),
            primary_feed_api_key: self.primary_feed_api_key,
            secondary_feed_api_key: self.secondary_feed_api_key,
            generation_api_key: self.generation_api_key,
            generation_api_base: self.generation_api_base.unwrap_or(defaults.generation_api_base),
            generation_model: self.generation_model.unwrap_or(defaults.generation_model),
            content_home_url: self.content_home_url.unwrap_or(defaults.content_home_url),
            content_listing_url: self
                .content_listing_url
                .unwrap_or(defaults.content_listing_url),
            content_email: self.content_email,
            content_password: self.content_password,
            max_articles: self.max_articles.unwrap_or(defaults.max_articles),
            min_body_len: self.min_body_len.unwrap_or(defaults.min_body_len),
            poll_interval: self.poll_interval.unwrap_or(defaults.poll_interval),
            stale_claim_after: self.stale_claim_after.unwrap_or(defaults.stale_claim_after),
            news_cache_ttl: self.news_cache_ttl.unwrap_or(defaults.news_cache_ttl),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            notification_token: self.notification_token,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PulseConfig::default();
        assert_eq!(config.max_articles, 8);
        assert_eq!(config.poll_interval, Duration::from_secs(20));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = PulseConfig::builder()
            .database_url("sqlite::memory:")
            .generation_api_key("sk-test")
            .max_articles(4)
            .poll_interval(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(config.max_articles, 4);
        assert_eq!(config.database_url, "sqlite::memory:");
        assert!(config.require_generation_key().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_max_articles() {
        let result = PulseConfig::builder().max_articles(0).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_generation_key_is_an_error() {
        let config = PulseConfig::default();
        assert!(config.require_generation_key().is_err());
    }

    #[test]
    fn test_doctor_reports_presence() {
        let config = PulseConfig::builder()
            .generation_api_key("sk-test")
            .build()
            .unwrap();

        let report = config.doctor();
        let openai = report.iter().find(|(name, _)| *name == "OPENAI_API_KEY");
        assert_eq!(openai, Some(&("OPENAI_API_KEY", true)));
        let telegram = report.iter().find(|(name, _)| *name == "TELEGRAM_BOT_TOKEN");
        assert_eq!(telegram, Some(&("TELEGRAM_BOT_TOKEN", false)));
    }
}
