//! Prompt builders
//!
//! Wording here is an implementation detail; the contracts that matter are
//! the summarizer's JSON schema and the analysis input fields.

use crate::analysis::AnalysisInput;

/// Articles are truncated before prompting so one long page cannot blow the
/// request
pub const MAX_ARTICLE_CHARS: usize = 12_000;

pub fn summarize_system() -> &'static str {
    "Eres un analista de mercados estilo Wall Street y maestro. \
     Resume de forma ejecutiva y educativa, en espanol profesional."
}

pub fn summarize_prompt(title: &str, url: &str, content: &str) -> String {
    let truncated: String = content.chars().take(MAX_ARTICLE_CHARS).collect();

    format!(
        "Resume el articulo de forma ejecutiva.\n\
         DEVUELVE SOLO JSON valido con estas llaves:\n\
         {{\n\
           \"tldr\": \"...\",\n\
           \"thesis\": [\"...\"],\n\
           \"catalysts\": [\"...\"],\n\
           \"risks\": [\"...\"],\n\
           \"tickers\": [\"...\"],\n\
           \"score\": 0-100\n\
         }}\n\n\
         Contexto:\n\
         - Titulo: {title}\n\
         - URL: {url}\n\n\
         Contenido (puede estar truncado):\n\
         {truncated}"
    )
}

pub fn analysis_system() -> &'static str {
    "Eres un analista de mercado profesional. Responde en espanol con tono \
     ejecutivo. Educativo solamente, sin senales garantizadas."
}

pub fn analysis_prompt(input: &AnalysisInput) -> String {
    let market_lines = numbered_or(&input.market_context, "Sin datos de mercado general.");
    let ticker_lines = numbered_or(&input.ticker_headlines, "Sin noticias recientes del ticker.");
    let price = input
        .current_price
        .map_or_else(|| "N/D".to_string(), |p| format!("{p:.2}"));
    let supports = joined_or(&input.supports);
    let resistances = joined_or(&input.resistances);

    format!(
        "Consulta del cliente: {query}\n\
         Ticker objetivo: {ticker}\n\n\
         Contexto de mercado general:\n{market_lines}\n\n\
         Noticias del ticker:\n{ticker_lines}\n\n\
         Precio actual:\n{price}\n\n\
         Soportes detectados:\n{supports}\n\n\
         Resistencias detectadas:\n{resistances}\n\n\
         Entrega este formato:\n\
         1) TL;DR\n\
         2) Pulso general de mercado (3-5 bullets)\n\
         3) Que esta pasando con {ticker} (drivers concretos)\n\
         4) Setup tecnico: soportes/resistencias + escenarios alcista/base/bajista + invalidacion\n\
         5) Checklist operativo 1-4 horas (riesgo, gatillos, evento clave)\n\
         6) Nota de riesgo (educativo, no asesoria financiera)",
        query = input.query,
        ticker = input.ticker,
    )
}

fn numbered_or(lines: &[String], fallback: &str) -> String {
    if lines.is_empty() {
        return fallback.to_string();
    }
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{}) {line}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

fn joined_or(levels: &[f64]) -> String {
    if levels.is_empty() {
        return "N/D".to_string();
    }
    levels
        .iter()
        .map(|level| format!("{level:.2}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summarize_prompt_truncates_content() {
        let long = "x".repeat(MAX_ARTICLE_CHARS + 500);
        let prompt = summarize_prompt("t", "https://u", &long);
        assert!(prompt.len() < long.len() + 500);
        assert!(prompt.contains("Titulo: t"));
    }

    #[test]
    fn test_analysis_prompt_carries_inputs() {
        let input = AnalysisInput {
            query: "analiza PYPL".to_string(),
            ticker: "PYPL".to_string(),
            market_context: vec!["Fed holds".to_string()],
            ticker_headlines: vec![],
            current_price: Some(61.25),
            supports: vec![60.0, 58.5],
            resistances: vec![],
        };

        let prompt = analysis_prompt(&input);
        assert!(prompt.contains("Ticker objetivo: PYPL"));
        assert!(prompt.contains("1) Fed holds"));
        assert!(prompt.contains("Sin noticias recientes del ticker."));
        assert!(prompt.contains("61.25"));
        assert!(prompt.contains("60.00, 58.50"));
        assert!(prompt.contains("N/D"));
    }
}
