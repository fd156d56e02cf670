//! Symbol resolution and intent detection for free-form user text
//!
//! Requests arrive as natural language ("que esta pasando con PayPal",
//! "$TSLA to the moon") and must be mapped to a canonical ticker before an
//! analysis job can do useful work. Resolution is layered: a curated
//! asset-name map wins over an explicit `$`-prefixed token, which wins over a
//! bare uppercase token that survives the stopword blacklist.

use regex::Regex;
use std::sync::LazyLock;

/// Curated asset names and aliases, scanned in order. First hit wins.
const ASSET_TO_TICKER: &[(&str, &str)] = &[
    ("paypal", "PYPL"),
    ("apple", "AAPL"),
    ("microsoft", "MSFT"),
    ("tesla", "TSLA"),
    ("nvidia", "NVDA"),
    ("amazon", "AMZN"),
    ("google", "GOOGL"),
    ("meta", "META"),
    ("netflix", "NFLX"),
    ("coinbase", "COIN"),
    ("mercado libre", "MELI"),
    ("bitcoin", "BTC"),
    ("btc", "BTC"),
    ("ethereum", "ETH"),
    ("eth", "ETH"),
    ("solana", "SOL"),
    ("sol", "SOL"),
    ("dogecoin", "DOGE"),
    ("doge", "DOGE"),
    ("ripple", "XRP"),
    ("xrp", "XRP"),
];

/// Uppercase tokens that look like tickers but are ordinary words
const TICKER_BLACKLIST: &[&str] = &[
    "QUE", "CON", "PARA", "HOY", "NEWS", "PULSE", "DAME", "ANALISIS", "ANALIZA", "DEL", "UNA",
    "POR", "PLEASE", "WHAT", "WITH", "PASA",
];

/// Phrases that signal an on-demand analysis request (already normalized)
const INTENT_PHRASES: &[&str] = &[
    "que esta pasando con",
    "analiza",
    "setup",
    "soportes",
    "resistencias",
    "que opinas de",
    "contexto de",
];

static SIGIL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z]{1,8})\b").expect("valid sigil pattern"));

static UPPER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{2,6}\b").expect("valid token pattern"));

/// Word-boundary patterns for each asset alias, compiled once in map order
static ASSET_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    ASSET_TO_TICKER
        .iter()
        .map(|&(alias, ticker)| {
            let pattern = format!(r"\b{}\b", regex::escape(alias));
            (Regex::new(&pattern).expect("valid alias pattern"), ticker)
        })
        .collect()
});

/// Lowercase the text and strip diacritics so phrase matching is
/// accent-insensitive. Token extraction keeps the original text.
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter_map(|c| match c {
            // combining marks from already-decomposed input
            '\u{0300}'..='\u{036f}' => None,
            _ => Some(fold_diacritic(c)),
        })
        .collect()
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ä' | 'ã' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        _ => c,
    }
}

fn is_blacklisted(token: &str) -> bool {
    TICKER_BLACKLIST.contains(&token)
}

/// Extract a likely ticker token from the raw (case-preserved) text.
///
/// An explicit `$AAPL`-style sigil always wins. Otherwise only tokens the
/// user already wrote in uppercase qualify, and the first one that survives
/// the blacklist is returned.
fn extract_likely_ticker(text: &str) -> Option<String> {
    if let Some(caps) = SIGIL_TOKEN.captures(text) {
        return Some(caps[1].to_uppercase());
    }

    UPPER_TOKEN
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|&token| !is_blacklisted(token))
        .map(str::to_string)
}

/// Does the normalized text mention any curated asset name?
fn mentions_known_asset(normalized: &str) -> bool {
    ASSET_PATTERNS
        .iter()
        .any(|(pattern, _)| pattern.is_match(normalized))
}

/// Resolve free-form text to a canonical ticker symbol.
///
/// Resolution order, first match wins:
/// 1. curated asset name/alias (word-boundary match on normalized text)
/// 2. explicit `$`-prefixed token, uppercased
/// 3. first standalone uppercase token (2-6 letters) not in the blacklist
pub fn resolve_symbol(text: &str) -> Option<String> {
    let normalized = normalize_text(text);

    for (pattern, ticker) in ASSET_PATTERNS.iter() {
        if pattern.is_match(&normalized) {
            return Some((*ticker).to_string());
        }
    }

    let extracted = extract_likely_ticker(text)?;
    let up = extracted.to_uppercase();
    if is_blacklisted(&up) || up.len() < 2 {
        return None;
    }

    Some(up)
}

/// Is this text an analyzable request?
///
/// True when an intent phrase is present, a known asset is mentioned, or a
/// ticker can be resolved. A blacklisted token alone is not analyzable.
pub fn is_analyzable(text: &str) -> bool {
    let normalized = normalize_text(text);

    if INTENT_PHRASES
        .iter()
        .any(|phrase| normalized.contains(phrase))
    {
        return true;
    }

    if mentions_known_asset(&normalized) {
        return true;
    }

    resolve_symbol(text).is_some()
}
