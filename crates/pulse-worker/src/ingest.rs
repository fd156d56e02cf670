//! Scheduled content ingestion: crawl, dedup, extract, summarize, persist
//!
//! Every execution is bounded by exactly one WorkerRun record. Per-article
//! failures (fetch, thin extraction, summarizer transport) skip that article
//! only; persistence failures fail the whole run and are captured on the
//! record.

use crate::crawler::{CandidateLink, ContentSource};
use crate::error::Result;
use pulse_core::normalize_url;
use pulse_llm::client::TextGenerator;
use pulse_llm::summary::{ArticleInput, summarize_article};
use pulse_store::{NewResearchItem, ResearchStore, WorkerRunStore};
use std::collections::HashSet;
use std::sync::Arc;

/// Name stamped on every run record this pipeline opens
pub const WORKER_NAME: &str = "research_ingest";

/// Counts of one ingestion pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub run_id: i64,
    /// Candidates not already present that the pass worked on
    pub processed: i64,
    /// New research items stored
    pub inserted: i64,
}

/// The crawl -> dedup -> extract -> summarize -> persist loop
pub struct IngestionPipeline {
    source: Arc<dyn ContentSource>,
    research: ResearchStore,
    runs: WorkerRunStore,
    generator: Arc<dyn TextGenerator>,
    max_articles: usize,
    min_body_len: usize,
}

impl IngestionPipeline {
    pub fn new(
        source: Arc<dyn ContentSource>,
        research: ResearchStore,
        runs: WorkerRunStore,
        generator: Arc<dyn TextGenerator>,
        max_articles: usize,
        min_body_len: usize,
    ) -> Self {
        Self {
            source,
            research,
            runs,
            generator,
            max_articles,
            min_body_len,
        }
    }

    /// Execute one audited ingestion pass.
    ///
    /// The WorkerRun opens before any crawling and closes exactly once, with
    /// final counts on success or the captured error on failure.
    pub async fn run_once(&self) -> Result<RunOutcome> {
        let run = self.runs.open(WORKER_NAME).await?;
        let mut processed = 0_i64;
        let mut inserted = 0_i64;

        match self.execute(&mut processed, &mut inserted).await {
            Ok(()) => {
                self.runs.close_success(run.id, processed, inserted).await?;
                tracing::info!(run_id = run.id, processed, inserted, "ingestion pass finished");
                Ok(RunOutcome {
                    run_id: run.id,
                    processed,
                    inserted,
                })
            }
            Err(err) => {
                if let Err(close_err) = self
                    .runs
                    .close_failed(run.id, processed, inserted, &err.to_string())
                    .await
                {
                    tracing::error!(run_id = run.id, %close_err, "failed to close worker run");
                }
                Err(err)
            }
        }
    }

    async fn execute(&self, processed: &mut i64, inserted: &mut i64) -> Result<()> {
        if let Err(err) = self.source.establish_session().await {
            tracing::warn!(%err, "session establishment failed, continuing anonymously");
        }

        let links = match self.source.listing_links().await {
            Ok(links) => links,
            Err(err) => {
                tracing::warn!(%err, "listing crawl failed, nothing to ingest");
                Vec::new()
            }
        };

        let candidates = dedup_candidates(links, self.max_articles);
        if candidates.is_empty() {
            tracing::warn!("no candidate articles found on the listing page");
        }

        for candidate in candidates {
            if self.research.exists(&candidate.href).await? {
                continue;
            }
            *processed += 1;

            let page = match self.source.fetch_article(&candidate.href).await {
                Ok(page) => page,
                Err(err) => {
                    tracing::warn!(url = %candidate.href, %err, "article fetch failed");
                    continue;
                }
            };

            if page.body.chars().count() < self.min_body_len {
                tracing::debug!(url = %candidate.href, "extraction too thin, skipping");
                continue;
            }

            let title = if page.title.is_empty() {
                candidate.text.clone()
            } else {
                page.title.clone()
            };

            let input = ArticleInput {
                title: title.clone(),
                url: candidate.href.clone(),
                content: page.body,
            };
            let summary = match summarize_article(self.generator.as_ref(), &input).await {
                Ok(outcome) => outcome.into_summary(),
                Err(err) => {
                    // fatal for this article only, never for the run
                    tracing::warn!(url = %candidate.href, %err, "summarization failed");
                    continue;
                }
            };

            let item = NewResearchItem {
                source: self.source.source_label().to_string(),
                title,
                url: candidate.href,
                author: page.author,
                published_at: page.published_at,
                tickers: summary.tickers,
                summary: summary.tldr,
                thesis: summary.thesis,
                catalysts: summary.catalysts,
                risks: summary.risks,
                score: summary.score,
            };

            if self.research.insert_if_new(&item).await? {
                *inserted += 1;
            }
        }

        Ok(())
    }
}

/// Normalize, deduplicate within the batch, and cap the candidate list
fn dedup_candidates(links: Vec<CandidateLink>, cap: usize) -> Vec<CandidateLink> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for link in links {
        let href = normalize_url(&link.href);
        if seen.insert(href.clone()) {
            out.push(CandidateLink {
                href,
                text: link.text,
            });
            if out.len() == cap {
                break;
            }
        }
    }

    out
}
