//! News feed clients and normalization
//!
//! Each upstream feed returns its own raw record shape; everything is mapped
//! into [`NewsItem`] before anyone else sees it. Merging preserves first-seen
//! order with the primary feed's items ahead of the secondary's.

use crate::error::{MarketError, Result};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

const MARKETAUX_NEWS_URL: &str = "https://api.marketaux.com/v1/news/all";
const FINNHUB_NEWS_URL: &str = "https://finnhub.io/api/v1/news";

/// Normalized news item shared by every feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub source: String,
    pub title: String,
    pub url: String,
    pub published_at: String,
    pub summary: String,
}

/// A general-market news source
#[async_trait]
pub trait NewsFeed: Send + Sync {
    /// Feed name, for logging and error tagging
    fn name(&self) -> &str;

    /// Fetch up to `limit` normalized items
    async fn fetch(&self, limit: usize) -> Result<Vec<NewsItem>>;
}

/// MarketAux article as returned by the API
#[derive(Debug, Deserialize)]
struct MarketAuxArticle {
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    published_at: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MarketAuxResponse {
    #[serde(default)]
    data: Vec<MarketAuxArticle>,
}

/// MarketAux client (primary feed)
pub struct MarketAuxFeed {
    client: Client,
    api_key: Option<String>,
    timeout: Duration,
}

impl MarketAuxFeed {
    /// A missing API key degrades the feed to empty results, never an error
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            api_key,
            timeout,
        }
    }
}

#[async_trait]
impl NewsFeed for MarketAuxFeed {
    fn name(&self) -> &str {
        "marketaux"
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<NewsItem>> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::debug!("marketaux API key not configured, returning no items");
            return Ok(Vec::new());
        };

        let limit_param = limit.to_string();
        let response = self
            .client
            .get(MARKETAUX_NEWS_URL)
            .query(&[
                ("api_token", api_key),
                ("language", "en"),
                ("limit", limit_param.as_str()),
            ])
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MarketError::Api(format!("marketaux error {status}: {body}")));
        }

        let parsed = response.json::<MarketAuxResponse>().await?;

        Ok(parsed
            .data
            .into_iter()
            .map(|article| NewsItem {
                source: article.source.unwrap_or_else(|| "MarketAux".to_string()),
                title: article.title,
                url: article.url,
                published_at: article.published_at,
                summary: article
                    .description
                    .or(article.snippet)
                    .unwrap_or_default(),
            })
            .collect())
    }
}

/// Finnhub general-news article as returned by the API
#[derive(Debug, Deserialize)]
struct FinnhubArticle {
    #[serde(default)]
    datetime: i64,
    #[serde(default)]
    headline: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    url: String,
}

/// Finnhub general-news client (secondary feed)
pub struct FinnhubFeed {
    client: Client,
    api_key: Option<String>,
    timeout: Duration,
}

impl FinnhubFeed {
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            api_key,
            timeout,
        }
    }
}

#[async_trait]
impl NewsFeed for FinnhubFeed {
    fn name(&self) -> &str {
        "finnhub"
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<NewsItem>> {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::debug!("finnhub API key not configured, returning no items");
            return Ok(Vec::new());
        };

        let response = self
            .client
            .get(FINNHUB_NEWS_URL)
            .query(&[("category", "general"), ("token", api_key)])
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MarketError::Api(format!("finnhub error {status}: {body}")));
        }

        let articles = response.json::<Vec<FinnhubArticle>>().await?;

        Ok(articles
            .into_iter()
            .take(limit)
            .map(normalize_finnhub_article)
            .collect())
    }
}

fn normalize_finnhub_article(article: FinnhubArticle) -> NewsItem {
    let published_at = DateTime::from_timestamp(article.datetime, 0)
        .map(|ts| ts.to_rfc3339())
        .unwrap_or_default();

    NewsItem {
        source: article.source.unwrap_or_else(|| "Finnhub".to_string()),
        title: article.headline,
        url: article.url,
        published_at,
        summary: article.summary,
    }
}

/// Merge two normalized feeds: primary items first, deduplicated by URL with
/// the title as fallback key, first-seen order preserved. Items with neither
/// a URL nor a title are dropped.
pub fn merge_news(primary: Vec<NewsItem>, secondary: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for item in primary.into_iter().chain(secondary) {
        let key = if item.url.is_empty() {
            item.title.clone()
        } else {
            item.url.clone()
        };
        if key.is_empty() || !seen.insert(key) {
            continue;
        }
        merged.push(item);
    }

    merged
}
