//! On-demand analysis generation
//!
//! The worker gathers market context and hands it over as plain data; this
//! step turns it into the result text for the job. Its failure is fatal to
//! that single job — the job's value is exactly this text.

use crate::client::TextGenerator;
use crate::error::Result;
use crate::prompts;

/// Everything the generation step needs about one job
#[derive(Debug, Clone, Default)]
pub struct AnalysisInput {
    /// The user's original request text
    pub query: String,
    /// Resolved target symbol
    pub ticker: String,
    /// Merged general-market headlines, "title (source)" lines
    pub market_context: Vec<String>,
    /// Ticker-specific headlines, "title | source" lines
    pub ticker_headlines: Vec<String>,
    pub current_price: Option<f64>,
    /// Nearest-first support levels
    pub supports: Vec<f64>,
    /// Nearest-first resistance levels
    pub resistances: Vec<f64>,
}

/// Produce the analysis text for a claimed job
pub async fn build_on_demand_analysis(
    generator: &dyn TextGenerator,
    input: &AnalysisInput,
) -> Result<String> {
    let prompt = prompts::analysis_prompt(input);
    generator
        .generate(Some(prompts::analysis_system()), &prompt)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct EchoGenerator;

    #[async_trait]
    impl TextGenerator for EchoGenerator {
        async fn generate(&self, _system: Option<&str>, prompt: &str) -> Result<String> {
            Ok(format!("ANALYSIS\n{prompt}"))
        }
    }

    #[tokio::test]
    async fn test_generation_receives_the_contract_fields() {
        let input = AnalysisInput {
            query: "que esta pasando con PayPal".to_string(),
            ticker: "PYPL".to_string(),
            market_context: vec!["Fed holds (Reuters)".to_string()],
            ticker_headlines: vec!["PYPL beats | Finnhub".to_string()],
            current_price: Some(61.2),
            supports: vec![60.0],
            resistances: vec![63.0],
        };

        let text = build_on_demand_analysis(&EchoGenerator, &input).await.unwrap();
        assert!(text.contains("PYPL"));
        assert!(text.contains("Fed holds"));
        assert!(text.contains("PYPL beats"));
    }
}
