//! On-demand analysis worker
//!
//! The loop claims the oldest eligible pending job, gathers market and news
//! context in parallel, generates the result text, and finalizes the job.
//! Every upstream except the generation step degrades to empty data; the
//! generation step is the job's whole value, so its failure fails the job.
//! Per-job failures never terminate the loop.

use crate::error::Result;
use crate::notify::NotificationSink;
use pulse_core::resolver;
use pulse_llm::analysis::{AnalysisInput, build_on_demand_analysis};
use pulse_llm::client::TextGenerator;
use pulse_market::aggregator::NewsAggregator;
use pulse_market::levels::support_resistance;
use pulse_market::provider::MarketData;
use pulse_store::jobs::JobQueue;
use pulse_store::models::AnalysisJob;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Reason code for a request whose query text is empty
pub const EMPTY_QUERY_ERROR: &str = "empty_query";

/// Reason code for a request whose symbol could not be resolved
pub const TICKER_NOT_DETECTED_ERROR: &str = "ticker_not_detected";

/// How many merged headlines feed one analysis
const MARKET_NEWS_LIMIT: usize = 6;
const COMPANY_NEWS_DAYS: i64 = 7;
const CANDLE_DAYS: i64 = 120;

/// Worker that drains the analysis job queue
pub struct AnalysisWorker {
    queue: JobQueue,
    aggregator: Arc<NewsAggregator>,
    market: Arc<dyn MarketData>,
    generator: Arc<dyn TextGenerator>,
    sink: Arc<dyn NotificationSink>,
    poll_interval: Duration,
    stale_claim_after: Duration,
}

impl AnalysisWorker {
    pub fn new(
        queue: JobQueue,
        aggregator: Arc<NewsAggregator>,
        market: Arc<dyn MarketData>,
        generator: Arc<dyn TextGenerator>,
        sink: Arc<dyn NotificationSink>,
        poll_interval: Duration,
        stale_claim_after: Duration,
    ) -> Self {
        Self {
            queue,
            aggregator,
            market,
            generator,
            sink,
            poll_interval,
            stale_claim_after,
        }
    }

    /// Run the claim loop until the process is stopped.
    pub async fn run(&self) -> Result<()> {
        tracing::info!(
            poll_secs = self.poll_interval.as_secs(),
            "analysis worker started"
        );

        loop {
            let worked = match self.tick().await {
                Ok(worked) => worked,
                Err(err) => {
                    tracing::error!(%err, "worker tick failed");
                    false
                }
            };

            if !worked {
                tokio::time::sleep(with_jitter(self.poll_interval)).await;
            }
        }
    }

    /// One scheduling step: sweep stale claims, then claim and process at
    /// most one job. Returns whether a job was processed.
    pub async fn tick(&self) -> Result<bool> {
        self.queue.reclaim_stale(self.stale_claim_after).await?;

        let Some(job) = self.queue.claim_next().await? else {
            return Ok(false);
        };

        if let Err(err) = self.process_job(&job).await {
            // recorded on the job where possible; the loop itself survives
            tracing::error!(job_id = job.id, %err, "job processing failed");
        }
        Ok(true)
    }

    /// Process one claimed job through to a terminal state.
    pub async fn process_job(&self, job: &AnalysisJob) -> Result<()> {
        if job.query_text.trim().is_empty() {
            self.queue.fail_job(job.id, EMPTY_QUERY_ERROR).await?;
            self.notify(&job.owner_id, "No encontre una consulta en tu mensaje. Prueba: `analiza PYPL`.")
                .await;
            return Ok(());
        }

        let ticker = job
            .ticker
            .clone()
            .filter(|ticker| !ticker.is_empty())
            .or_else(|| resolver::resolve_symbol(&job.query_text))
            .map(|ticker| ticker.to_uppercase());

        let Some(ticker) = ticker else {
            self.queue.fail_job(job.id, TICKER_NOT_DETECTED_ERROR).await?;
            self.notify(
                &job.owner_id,
                "No pude detectar el ticker. Prueba: `analiza PYPL` o `que esta pasando con PayPal`.",
            )
            .await;
            return Ok(());
        };

        self.notify(
            &job.owner_id,
            &format!(
                "Ejecutando job #{} sobre *{ticker}*. Buscando pulso de mercado, noticias y setup tecnico...",
                job.id
            ),
        )
        .await;

        let (market_news, ticker_news, quote, candles) = tokio::join!(
            self.aggregator.merged_news(MARKET_NEWS_LIMIT),
            self.market.company_news(&ticker, COMPANY_NEWS_DAYS),
            self.market.quote(&ticker),
            self.market.daily_candles(&ticker, CANDLE_DAYS),
        );

        let market_news = market_news.unwrap_or_else(|err| {
            tracing::warn!(job_id = job.id, %err, "merged news unavailable");
            Vec::new()
        });
        let ticker_news = ticker_news.unwrap_or_else(|err| {
            tracing::warn!(job_id = job.id, %err, "company news unavailable");
            Vec::new()
        });
        let quote = quote.unwrap_or_else(|err| {
            tracing::warn!(job_id = job.id, %err, "quote unavailable");
            None
        });
        let candles = candles.unwrap_or_else(|err| {
            tracing::warn!(job_id = job.id, %err, "candles unavailable");
            Vec::new()
        });

        let current_price = quote.map(|quote| quote.price);
        let levels = support_resistance(&candles, current_price);

        let input = AnalysisInput {
            query: job.query_text.clone(),
            ticker: ticker.clone(),
            market_context: market_news
                .iter()
                .map(|item| format!("{} ({})", item.title, item.source))
                .collect(),
            ticker_headlines: ticker_news
                .iter()
                .map(|item| format!("{} | {}", item.title, item.source))
                .collect(),
            current_price,
            supports: levels.supports,
            resistances: levels.resistances,
        };

        match build_on_demand_analysis(self.generator.as_ref(), &input).await {
            Ok(text) => {
                self.queue.complete_job(job.id, &text).await?;
                self.notify(&job.owner_id, &format!("*Analisis {ticker}*\n\n{text}"))
                    .await;
            }
            Err(err) => {
                self.queue.fail_job(job.id, &err.to_string()).await?;
                self.notify(
                    &job.owner_id,
                    &format!("Fallo el analisis de {ticker}. Error: {err}"),
                )
                .await;
            }
        }

        Ok(())
    }

    /// Deliver a message; failures are logged and never block finalization
    async fn notify(&self, owner_id: &str, text: &str) {
        if let Err(err) = self.sink.send(owner_id, text).await {
            tracing::warn!(owner_id, %err, "notification failed");
        }
    }
}

/// Idle sleep with per-instance jitter so multiple workers do not poll in
/// lockstep. Clock noise is enough spread; no PRNG needed.
fn with_jitter(base: Duration) -> Duration {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.subsec_nanos())
        .unwrap_or(0);
    base + Duration::from_millis(u64::from(nanos % 1000))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pulse_llm::error::{LlmError, Result as LlmResult};
    use pulse_market::error::Result as MarketResult;
    use pulse_market::feeds::{NewsFeed, NewsItem};
    use pulse_market::provider::{Candle, Quote};
    use pulse_store::db;
    use pulse_store::models::JobStatus;
    use std::sync::Mutex;

    struct StaticFeed(Vec<NewsItem>);

    #[async_trait]
    impl NewsFeed for StaticFeed {
        fn name(&self) -> &str {
            "static"
        }

        async fn fetch(&self, _limit: usize) -> MarketResult<Vec<NewsItem>> {
            Ok(self.0.clone())
        }
    }

    struct FakeMarketData;

    #[async_trait]
    impl MarketData for FakeMarketData {
        async fn quote(&self, _symbol: &str) -> MarketResult<Option<Quote>> {
            Ok(Some(Quote { price: 100.0 }))
        }

        async fn daily_candles(&self, _symbol: &str, _days: i64) -> MarketResult<Vec<Candle>> {
            Ok(vec![
                Candle {
                    timestamp: 1,
                    open: 96.0,
                    high: 105.0,
                    low: 95.0,
                    close: 104.0,
                    volume: 10.0,
                },
                Candle {
                    timestamp: 2,
                    open: 104.0,
                    high: 110.0,
                    low: 90.0,
                    close: 98.0,
                    volume: 12.0,
                },
            ])
        }

        async fn company_news(&self, symbol: &str, _days: i64) -> MarketResult<Vec<NewsItem>> {
            Ok(vec![NewsItem {
                source: "Finnhub".to_string(),
                title: format!("{symbol} beats estimates"),
                url: format!("https://news/{symbol}"),
                published_at: String::new(),
                summary: String::new(),
            }])
        }
    }

    struct CannedGenerator(String);

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(&self, _system: Option<&str>, _prompt: &str) -> LlmResult<String> {
            Ok(self.0.clone())
        }
    }

    struct PromptCapturingGenerator(Mutex<Vec<String>>);

    #[async_trait]
    impl TextGenerator for PromptCapturingGenerator {
        async fn generate(&self, _system: Option<&str>, prompt: &str) -> LlmResult<String> {
            self.0.lock().unwrap().push(prompt.to_string());
            Ok("generated analysis".to_string())
        }
    }

    struct BrokenGenerator;

    #[async_trait]
    impl TextGenerator for BrokenGenerator {
        async fn generate(&self, _system: Option<&str>, _prompt: &str) -> LlmResult<String> {
            Err(LlmError::Api("503".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        messages: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn send(&self, owner_id: &str, text: &str) -> Result<()> {
            self.messages
                .lock()
                .unwrap()
                .push((owner_id.to_string(), text.to_string()));
            if self.fail {
                return Err(crate::error::WorkerError::Notify("410".to_string()));
            }
            Ok(())
        }
    }

    fn aggregator() -> Arc<NewsAggregator> {
        Arc::new(NewsAggregator::new(
            Arc::new(StaticFeed(vec![NewsItem {
                source: "Reuters".to_string(),
                title: "Fed holds".to_string(),
                url: "https://news/fed".to_string(),
                published_at: String::new(),
                summary: String::new(),
            }])),
            Arc::new(StaticFeed(Vec::new())),
            Duration::from_secs(300),
        ))
    }

    async fn worker_with(
        generator: Arc<dyn TextGenerator>,
        sink: Arc<RecordingSink>,
    ) -> (AnalysisWorker, JobQueue) {
        let queue = JobQueue::new(db::connect_in_memory().await.unwrap());
        let worker = AnalysisWorker::new(
            queue.clone(),
            aggregator(),
            Arc::new(FakeMarketData),
            generator,
            sink,
            Duration::from_secs(1),
            Duration::from_secs(900),
        );
        (worker, queue)
    }

    #[tokio::test]
    async fn test_idle_tick_reports_no_work() {
        let sink = Arc::new(RecordingSink::default());
        let (worker, _queue) = worker_with(Arc::new(CannedGenerator("x".to_string())), sink).await;
        assert!(!worker.tick().await.unwrap());
    }

    #[tokio::test]
    async fn test_successful_job_completes_and_notifies() {
        let sink = Arc::new(RecordingSink::default());
        let (worker, queue) =
            worker_with(Arc::new(CannedGenerator("all clear".to_string())), sink.clone()).await;

        let job = queue.enqueue("chat-1", "analiza $TSLA").await.unwrap();
        assert!(worker.tick().await.unwrap());

        let done = queue.get(job.id).await.unwrap().unwrap();
        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.result_text.as_deref(), Some("all clear"));
        assert_eq!(done.attempts, 1);

        let messages = sink.messages.lock().unwrap();
        assert_eq!(messages.len(), 2); // acknowledgement + result
        assert!(messages[0].1.contains("TSLA"));
        assert!(messages[1].1.contains("all clear"));
    }

    #[tokio::test]
    async fn test_context_reaches_the_generator() {
        let generator = Arc::new(PromptCapturingGenerator(Mutex::new(Vec::new())));
        let sink = Arc::new(RecordingSink::default());
        let (worker, queue) = worker_with(generator.clone(), sink).await;

        queue.enqueue("chat-1", "analiza $TSLA").await.unwrap();
        worker.tick().await.unwrap();

        let prompts = generator.0.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        // merged news, company news, and computed levels all flow through
        assert!(prompts[0].contains("Fed holds (Reuters)"));
        assert!(prompts[0].contains("TSLA beats estimates | Finnhub"));
        assert!(prompts[0].contains("105.00, 110.00"));
        assert!(prompts[0].contains("95.00, 90.00"));
    }

    #[tokio::test]
    async fn test_unresolved_symbol_fails_without_analysis() {
        let sink = Arc::new(RecordingSink::default());
        let (worker, queue) =
            worker_with(Arc::new(CannedGenerator("unused".to_string())), sink.clone()).await;

        let job = queue.enqueue("chat-1", "hola buenos dias").await.unwrap();
        assert!(job.ticker.is_none());
        worker.tick().await.unwrap();

        let failed = queue.get(job.id).await.unwrap().unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some(TICKER_NOT_DETECTED_ERROR));
        assert_eq!(failed.attempts, 1);

        // guidance only, no result message
        let messages = sink.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].1.contains("No pude detectar el ticker"));
    }

    #[tokio::test]
    async fn test_empty_query_fails_with_reason_code() {
        let sink = Arc::new(RecordingSink::default());
        let (worker, queue) =
            worker_with(Arc::new(CannedGenerator("unused".to_string())), sink).await;

        let job = queue.enqueue("chat-1", "   ").await.unwrap();
        worker.tick().await.unwrap();

        let failed = queue.get(job.id).await.unwrap().unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert_eq!(failed.error.as_deref(), Some(EMPTY_QUERY_ERROR));
    }

    #[tokio::test]
    async fn test_generation_failure_fails_the_job() {
        let sink = Arc::new(RecordingSink::default());
        let (worker, queue) = worker_with(Arc::new(BrokenGenerator), sink.clone()).await;

        let job = queue.enqueue("chat-1", "analiza $TSLA").await.unwrap();
        worker.tick().await.unwrap();

        let failed = queue.get(job.id).await.unwrap().unwrap();
        assert_eq!(failed.status, JobStatus::Failed);
        assert!(failed.error.as_deref().unwrap_or_default().contains("503"));

        let messages = sink.messages.lock().unwrap();
        assert!(messages.last().unwrap().1.contains("Fallo el analisis"));
    }

    #[tokio::test]
    async fn test_notification_failure_never_blocks_finalization() {
        let sink = Arc::new(RecordingSink {
            messages: Mutex::new(Vec::new()),
            fail: true,
        });
        let (worker, queue) =
            worker_with(Arc::new(CannedGenerator("all clear".to_string())), sink).await;

        let job = queue.enqueue("chat-1", "analiza $TSLA").await.unwrap();
        worker.tick().await.unwrap();

        let done = queue.get(job.id).await.unwrap().unwrap();
        assert_eq!(done.status, JobStatus::Completed);
    }

    #[test]
    fn test_jitter_stays_within_a_second_of_base() {
        let base = Duration::from_secs(20);
        let jittered = with_jitter(base);
        assert!(jittered >= base);
        assert!(jittered < base + Duration::from_secs(1));
    }
}
