//! Text generation for summaries and on-demand analysis
//!
//! A thin OpenAI-compatible chat-completion client sits behind the
//! [`TextGenerator`] trait so workers and tests can swap it out. On top of
//! it: the article summarizer with a typed parse-or-fallback decode, and the
//! on-demand analysis builder. Prompt wording is deliberately unremarkable;
//! only the input/output contracts matter to callers.

pub mod analysis;
pub mod client;
pub mod error;
pub mod prompts;
pub mod summary;

pub use analysis::{AnalysisInput, build_on_demand_analysis};
pub use client::{ChatClient, ChatClientConfig, TextGenerator};
pub use error::{LlmError, Result};
pub use summary::{ArticleInput, ArticleSummary, SummaryOutcome, summarize_article};
