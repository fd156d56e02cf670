//! URL normalization for research deduplication
//!
//! The normalized URL is the global dedup key for ingested articles, so the
//! same rules must run before every comparison and before storage.

use url::Url;

/// Query parameters that never identify content
const TRACKING_PARAMS: &[&str] = &["utm_source", "utm_medium", "utm_campaign"];

/// Strip the fragment and known tracking query parameters.
///
/// Text that does not parse as a URL is returned unchanged; normalization
/// must never lose a candidate.
pub fn normalize_url(raw: &str) -> String {
    let Ok(mut parsed) = Url::parse(raw) else {
        return raw.to_string();
    };

    parsed.set_fragment(None);

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed
            .query_pairs_mut()
            .clear()
            .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }

    parsed.to_string()
}
