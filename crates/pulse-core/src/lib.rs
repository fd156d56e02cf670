//! Shared foundation for the market-pulse pipeline
//!
//! This crate holds the pieces every other crate leans on:
//!
//! - Error taxonomy for validation, upstream, and persistence failures
//! - Runtime configuration with env loading and a credential doctor
//! - Symbol resolution from free-form user text
//! - URL normalization used as the research dedup key
//! - Bounded per-owner conversation history

pub mod config;
pub mod error;
pub mod history;
pub mod resolver;
pub mod urls;

pub use config::{PulseConfig, PulseConfigBuilder};
pub use error::{PulseError, Result};
pub use history::{ConversationHistory, Turn, TurnRole};
pub use urls::normalize_url;
