//! Merged general-market news behind the freshness cache

use crate::cache::NewsCache;
use crate::error::Result;
use crate::feeds::{NewsFeed, NewsItem, merge_news};
use std::sync::Arc;
use std::time::Duration;

/// Both feeds are asked for at least this many items per refresh, so a small
/// caller limit does not starve the shared cache slot
const MIN_FETCH_LIMIT: usize = 6;

/// Merges two independent news feeds behind a single time-boxed cache slot
pub struct NewsAggregator {
    primary: Arc<dyn NewsFeed>,
    secondary: Arc<dyn NewsFeed>,
    cache: NewsCache,
}

impl NewsAggregator {
    /// Aggregator with the system clock
    pub fn new(primary: Arc<dyn NewsFeed>, secondary: Arc<dyn NewsFeed>, ttl: Duration) -> Self {
        Self::with_cache(primary, secondary, NewsCache::new(ttl))
    }

    /// Aggregator over a preconfigured cache (tests inject a manual clock)
    pub fn with_cache(
        primary: Arc<dyn NewsFeed>,
        secondary: Arc<dyn NewsFeed>,
        cache: NewsCache,
    ) -> Self {
        Self {
            primary,
            secondary,
            cache,
        }
    }

    /// Merged, deduplicated news, at most `limit` items.
    ///
    /// Within the freshness window this is served from the cache slot with
    /// no upstream call. On expiry both feeds are fetched in parallel; a
    /// failing feed degrades to no items instead of failing the merge.
    pub async fn merged_news(&self, limit: usize) -> Result<Vec<NewsItem>> {
        let fetch_limit = limit.max(MIN_FETCH_LIMIT);

        let merged = self
            .cache
            .get_or_refresh(|| async {
                let (primary, secondary) = tokio::join!(
                    self.primary.fetch(fetch_limit),
                    self.secondary.fetch(fetch_limit),
                );

                let primary = primary.unwrap_or_else(|err| {
                    tracing::warn!(feed = self.primary.name(), %err, "news feed failed");
                    Vec::new()
                });
                let secondary = secondary.unwrap_or_else(|err| {
                    tracing::warn!(feed = self.secondary.name(), %err, "news feed failed");
                    Vec::new()
                });

                Ok(merge_news(primary, secondary))
            })
            .await?;

        Ok(merged.into_iter().take(limit).collect())
    }
}
