//! Market pulse worker binary
//!
//! # Usage
//!
//! ```bash
//! # run the analysis job loop
//! pulse-worker jobs
//!
//! # run one ingestion pass over the content source
//! pulse-worker research
//!
//! # check which credentials are configured
//! pulse-worker doctor
//! ```
//!
//! Scheduling of the ingestion pass belongs to an external scheduler (cron
//! or the platform's equivalent) invoking `research` periodically.

use clap::{Parser, Subcommand};
use pulse_core::PulseConfig;
use pulse_llm::client::{ChatClient, ChatClientConfig};
use pulse_market::aggregator::NewsAggregator;
use pulse_market::feeds::{FinnhubFeed, MarketAuxFeed};
use pulse_market::provider::FinnhubMarketData;
use pulse_store::{JobQueue, ResearchStore, WorkerRunStore};
use pulse_worker::analysis::AnalysisWorker;
use pulse_worker::crawler::HttpContentSource;
use pulse_worker::ingest::IngestionPipeline;
use pulse_worker::notify::TelegramSink;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const MARKET_DATA_RATE_LIMIT: u32 = 60;

#[derive(Parser)]
#[command(name = "pulse-worker", about = "Market pulse analysis and ingestion worker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the analysis job loop
    Jobs,
    /// Run one ingestion pass over the content source
    Research,
    /// Print which credentials are configured
    Doctor,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn generator(config: &PulseConfig) -> anyhow::Result<Arc<ChatClient>> {
    let api_key = config.require_generation_key()?;
    let client = ChatClient::new(
        ChatClientConfig::new(api_key, config.generation_model.clone())
            .with_api_base(config.generation_api_base.clone())
            .with_timeout(config.request_timeout * 3),
    )?;
    Ok(Arc::new(client))
}

async fn run_jobs(config: PulseConfig) -> anyhow::Result<()> {
    let generator = generator(&config)?;
    let pool = pulse_store::connect(&config.database_url).await?;

    let aggregator = Arc::new(NewsAggregator::new(
        Arc::new(MarketAuxFeed::new(
            config.primary_feed_api_key.clone(),
            config.request_timeout,
        )),
        Arc::new(FinnhubFeed::new(
            config.secondary_feed_api_key.clone(),
            config.request_timeout,
        )),
        config.news_cache_ttl,
    ));
    let market = Arc::new(FinnhubMarketData::new(
        config.secondary_feed_api_key.clone(),
        MARKET_DATA_RATE_LIMIT,
        config.request_timeout,
    ));
    let sink = Arc::new(TelegramSink::new(
        config.notification_token.clone(),
        config.request_timeout,
    ));

    let worker = AnalysisWorker::new(
        JobQueue::new(pool),
        aggregator,
        market,
        generator,
        sink,
        config.poll_interval,
        config.stale_claim_after,
    );

    worker.run().await?;
    Ok(())
}

async fn run_research(config: PulseConfig) -> anyhow::Result<()> {
    let generator = generator(&config)?;
    let pool = pulse_store::connect(&config.database_url).await?;

    let source = Arc::new(HttpContentSource::from_config(&config)?);
    let pipeline = IngestionPipeline::new(
        source,
        ResearchStore::new(pool.clone()),
        WorkerRunStore::new(pool),
        generator,
        config.max_articles,
        config.min_body_len,
    );

    let outcome = pipeline.run_once().await?;
    println!(
        "run {} finished: processed {}, inserted {}",
        outcome.run_id, outcome.processed, outcome.inserted
    );
    Ok(())
}

fn run_doctor(config: &PulseConfig) {
    println!("configuration doctor:");
    for (name, present) in config.doctor() {
        println!("- {name}: {}", if present { "OK" } else { "MISSING" });
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = PulseConfig::from_env()?;

    match cli.command {
        Command::Jobs => run_jobs(config).await,
        Command::Research => run_research(config).await,
        Command::Doctor => {
            run_doctor(&config);
            Ok(())
        }
    }
}
