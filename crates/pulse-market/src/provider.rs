//! Per-symbol market data: quote, daily candles, company news
//!
//! These calls are made fresh for every job (no caching) so the analysis
//! always sees current numbers. A missing API key degrades every call to an
//! empty/None result; a configured key is protected by a rate limiter.

use crate::error::{MarketError, Result};
use crate::feeds::NewsItem;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

const FINNHUB_API_BASE: &str = "https://finnhub.io/api/v1";
const COMPANY_NEWS_LIMIT: usize = 10;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Latest quote for a symbol
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Quote {
    /// Current price
    #[serde(rename = "c")]
    pub price: f64,
}

/// One daily OHLCV bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Quote/candle/company-news provider
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Latest quote, or None when the provider has no data or no credentials
    async fn quote(&self, symbol: &str) -> Result<Option<Quote>>;

    /// Daily bars covering the last `days` days, oldest first
    async fn daily_candles(&self, symbol: &str, days: i64) -> Result<Vec<Candle>>;

    /// Company news from the last `days` days
    async fn company_news(&self, symbol: &str, days: i64) -> Result<Vec<NewsItem>>;
}

/// Candle endpoint response: column-oriented arrays plus a status flag
#[derive(Debug, Deserialize)]
struct CandleResponse {
    #[serde(default)]
    s: String,
    #[serde(default)]
    t: Vec<i64>,
    #[serde(default)]
    o: Vec<f64>,
    #[serde(default)]
    h: Vec<f64>,
    #[serde(default)]
    l: Vec<f64>,
    #[serde(default)]
    c: Vec<f64>,
    #[serde(default)]
    v: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct CompanyNewsArticle {
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

/// Finnhub-backed [`MarketData`] implementation
pub struct FinnhubMarketData {
    client: Client,
    api_key: Option<String>,
    rate_limiter: SharedRateLimiter,
    timeout: Duration,
}

impl FinnhubMarketData {
    /// Create a provider with rate limiting
    ///
    /// # Arguments
    /// * `api_key` - Finnhub API key; None degrades every call
    /// * `rate_limit` - Requests per minute (free tier: 60)
    /// * `timeout` - Per-request timeout
    pub fn new(api_key: Option<String>, rate_limit: u32, timeout: Duration) -> Self {
        let quota =
            Quota::per_minute(NonZeroU32::new(rate_limit).unwrap_or(NonZeroU32::new(60).unwrap()));

        Self {
            client: Client::new(),
            api_key,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            timeout,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let url = format!("{FINNHUB_API_BASE}/{path}");
        let response = self
            .client
            .get(&url)
            .query(query)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MarketError::Api(format!("finnhub error {status}: {body}")));
        }

        Ok(response.json::<T>().await?)
    }

    fn date_range(days: i64) -> (String, String) {
        let to = Utc::now();
        let from = to - ChronoDuration::days(days);
        (
            from.format("%Y-%m-%d").to_string(),
            to.format("%Y-%m-%d").to_string(),
        )
    }
}

#[async_trait]
impl MarketData for FinnhubMarketData {
    async fn quote(&self, symbol: &str) -> Result<Option<Quote>> {
        let Some(api_key) = self.api_key.clone() else {
            return Ok(None);
        };

        let quote: Quote = self
            .get_json("quote", &[("symbol", symbol), ("token", api_key.as_str())])
            .await?;

        // A zero price is the provider's way of saying "unknown symbol"
        if quote.price == 0.0 {
            return Ok(None);
        }
        Ok(Some(quote))
    }

    async fn daily_candles(&self, symbol: &str, days: i64) -> Result<Vec<Candle>> {
        let Some(api_key) = self.api_key.clone() else {
            return Ok(Vec::new());
        };

        let to = Utc::now().timestamp();
        let from = to - days * 24 * 60 * 60;
        let from_param = from.to_string();
        let to_param = to.to_string();

        let response: CandleResponse = self
            .get_json(
                "stock/candle",
                &[
                    ("symbol", symbol),
                    ("resolution", "D"),
                    ("from", from_param.as_str()),
                    ("to", to_param.as_str()),
                    ("token", api_key.as_str()),
                ],
            )
            .await?;

        Ok(zip_candles(&response))
    }

    async fn company_news(&self, symbol: &str, days: i64) -> Result<Vec<NewsItem>> {
        let Some(api_key) = self.api_key.clone() else {
            return Ok(Vec::new());
        };

        let (from, to) = Self::date_range(days);

        let articles: Vec<CompanyNewsArticle> = self
            .get_json(
                "company-news",
                &[
                    ("symbol", symbol),
                    ("from", from.as_str()),
                    ("to", to.as_str()),
                    ("token", api_key.as_str()),
                ],
            )
            .await?;

        Ok(articles
            .into_iter()
            .take(COMPANY_NEWS_LIMIT)
            .map(|article| NewsItem {
                source: article.source.unwrap_or_else(|| "Finnhub".to_string()),
                title: article.headline,
                url: article.url,
                published_at: DateTime::from_timestamp(article.datetime, 0)
                    .map(|ts| ts.to_rfc3339())
                    .unwrap_or_default(),
                summary: article.summary,
            })
            .collect())
    }
}

fn zip_candles(response: &CandleResponse) -> Vec<Candle> {
    if response.s != "ok" {
        return Vec::new();
    }

    let len = response
        .t
        .len()
        .min(response.o.len())
        .min(response.h.len())
        .min(response.l.len())
        .min(response.c.len())
        .min(response.v.len());

    (0..len)
        .map(|i| Candle {
            timestamp: response.t[i],
            open: response.o[i],
            high: response.h[i],
            low: response.l[i],
            close: response.c[i],
            volume: response.v[i],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zip_candles_requires_ok_status() {
        let response = CandleResponse {
            s: "no_data".to_string(),
            t: vec![1],
            o: vec![1.0],
            h: vec![1.0],
            l: vec![1.0],
            c: vec![1.0],
            v: vec![1.0],
        };
        assert!(zip_candles(&response).is_empty());
    }

    #[test]
    fn test_zip_candles_pairs_columns() {
        let response = CandleResponse {
            s: "ok".to_string(),
            t: vec![10, 20],
            o: vec![1.0, 2.0],
            h: vec![1.5, 2.5],
            l: vec![0.5, 1.5],
            c: vec![1.2, 2.2],
            v: vec![100.0, 200.0],
        };
        let candles = zip_candles(&response);
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[1].high, 2.5);
        assert_eq!(candles[0].timestamp, 10);
    }

    #[tokio::test]
    async fn test_missing_key_degrades() {
        let provider = FinnhubMarketData::new(None, 60, Duration::from_secs(1));
        assert!(provider.quote("AAPL").await.unwrap().is_none());
        assert!(provider.daily_candles("AAPL", 120).await.unwrap().is_empty());
        assert!(provider.company_news("AAPL", 7).await.unwrap().is_empty());
    }
}
