//! Time-boxed cache slot for merged news
//!
//! One slot holds the last merged result and its fetch time. Reads within
//! the freshness window return the cached items without touching any feed.
//! The clock is injected so tests control time, and the slot mutex is held
//! across the refresh: concurrent callers wait for the single in-flight
//! fetch instead of stampeding the upstreams.

use crate::error::Result;
use crate::feeds::NewsItem;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Time source for freshness checks
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

struct Slot {
    fetched_at: Instant,
    items: Vec<NewsItem>,
}

/// Single-slot freshness cache for the merged news list
pub struct NewsCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    slot: Mutex<Option<Slot>>,
}

impl NewsCache {
    /// Cache with the given freshness window and the system clock
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Cache with an injected clock
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            slot: Mutex::new(None),
        }
    }

    /// Return the cached items when fresh, otherwise run `refresh` and
    /// replace the slot atomically. An empty cached list is treated as
    /// stale so a failed fetch pair does not pin emptiness for a full TTL.
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> Result<Vec<NewsItem>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<NewsItem>>>,
    {
        let mut slot = self.slot.lock().await;

        if let Some(current) = slot.as_ref() {
            let age = self.clock.now().duration_since(current.fetched_at);
            if !current.items.is_empty() && age < self.ttl {
                tracing::debug!(age_secs = age.as_secs(), "merged news cache hit");
                return Ok(current.items.clone());
            }
        }

        tracing::debug!("merged news cache stale, refreshing");
        let items = refresh().await?;
        *slot = Some(Slot {
            fetched_at: self.clock.now(),
            items: items.clone(),
        });

        Ok(items)
    }

    /// Drop the slot, forcing the next read to refresh
    pub async fn invalidate(&self) {
        *self.slot.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ManualClock {
        now: StdMutex<Instant>,
    }

    impl ManualClock {
        fn new() -> Self {
            Self {
                now: StdMutex::new(Instant::now()),
            }
        }

        fn advance(&self, by: Duration) {
            *self.now.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            *self.now.lock().unwrap()
        }
    }

    fn item(title: &str) -> NewsItem {
        NewsItem {
            source: "test".to_string(),
            title: title.to_string(),
            url: format!("https://news/{title}"),
            published_at: String::new(),
            summary: String::new(),
        }
    }

    #[tokio::test]
    async fn test_fresh_slot_skips_refresh() {
        let clock = Arc::new(ManualClock::new());
        let cache = NewsCache::with_clock(Duration::from_secs(300), clock.clone());
        let fetches = AtomicUsize::new(0);

        for _ in 0..3 {
            let items = cache
                .get_or_refresh(|| async {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![item("a")])
                })
                .await
                .unwrap();
            assert_eq!(items.len(), 1);
        }

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expired_slot_refreshes_once_more() {
        let clock = Arc::new(ManualClock::new());
        let cache = NewsCache::with_clock(Duration::from_secs(300), clock.clone());
        let fetches = AtomicUsize::new(0);

        let refresh = || async {
            fetches.fetch_add(1, Ordering::SeqCst);
            Ok(vec![item("a")])
        };

        cache.get_or_refresh(refresh).await.unwrap();
        clock.advance(Duration::from_secs(301));
        cache.get_or_refresh(refresh).await.unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_result_is_not_pinned() {
        let clock = Arc::new(ManualClock::new());
        let cache = NewsCache::with_clock(Duration::from_secs(300), clock);
        let fetches = AtomicUsize::new(0);

        let empty = || async {
            fetches.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        };

        cache.get_or_refresh(empty).await.unwrap();
        cache.get_or_refresh(empty).await.unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refresh() {
        let cache = NewsCache::new(Duration::from_secs(300));
        let fetches = AtomicUsize::new(0);

        let refresh = || async {
            fetches.fetch_add(1, Ordering::SeqCst);
            Ok(vec![item("a")])
        };

        cache.get_or_refresh(refresh).await.unwrap();
        cache.invalidate().await;
        cache.get_or_refresh(refresh).await.unwrap();

        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }
}
