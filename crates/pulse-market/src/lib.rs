//! Market and news context for on-demand analysis
//!
//! Two independent general-news feeds are merged and deduplicated behind a
//! single time-boxed cache; per-symbol quote, candle, and company-news
//! lookups are fetched fresh per job. A small amount of derived structure
//! (support/resistance levels) is computed from raw candles.

pub mod aggregator;
pub mod cache;
pub mod error;
pub mod feeds;
pub mod levels;
pub mod provider;

pub use aggregator::NewsAggregator;
pub use cache::{Clock, NewsCache, SystemClock};
pub use error::{MarketError, Result};
pub use feeds::{FinnhubFeed, MarketAuxFeed, NewsFeed, NewsItem, merge_news};
pub use levels::{PriceLevels, support_resistance};
pub use provider::{Candle, FinnhubMarketData, MarketData, Quote};
