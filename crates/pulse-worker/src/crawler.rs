//! Content source crawling
//!
//! The [`ContentSource`] trait is the boundary the ingestion pipeline works
//! against: establish a session (best-effort), list candidate article links,
//! fetch one article. The HTTP implementation extracts links and article
//! fields from raw HTML; selectors are deliberately loose because the site
//! is not ours.

use crate::error::{Result, WorkerError};
use async_trait::async_trait;
use pulse_core::PulseConfig;
use regex::Regex;
use reqwest::Client;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

/// Minimum anchor-text length for a listing link to count as an article
const MIN_LINK_TEXT_CHARS: usize = 20;

/// One candidate article link from the listing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    pub href: String,
    pub text: String,
}

/// Extracted article fields
#[derive(Debug, Clone, Default)]
pub struct ArticlePage {
    pub title: String,
    pub body: String,
    pub author: Option<String>,
    pub published_at: Option<String>,
}

/// External content source the ingestion pipeline crawls
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Label recorded as the `source` of stored research items
    fn source_label(&self) -> &str;

    /// Best-effort session establishment. Missing credentials degrade to
    /// anonymous browsing; failures must not be fatal.
    async fn establish_session(&self) -> Result<()>;

    /// Candidate article links from the listing page
    async fn listing_links(&self) -> Result<Vec<CandidateLink>>;

    /// Fetch and extract one article
    async fn fetch_article(&self, url: &str) -> Result<ArticlePage>;
}

static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*href\s*=\s*"([^"]+)"[^>]*>(.*?)</a>"#).expect("valid anchor pattern")
});

static TITLE_H1: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<h1[^>]*>(.*?)</h1>").expect("valid h1 pattern"));

static TITLE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid title pattern"));

static BODY_ARTICLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<article\b[^>]*>(.*?)</article>").expect("valid article pattern"));

static BODY_MAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<main\b[^>]*>(.*?)</main>").expect("valid main pattern"));

static AUTHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<[a-z][^>]*class="[^"]*author[^"]*"[^>]*>(.*?)</"#).expect("valid author pattern")
});

static TIME_DATETIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<time[^>]*datetime\s*=\s*"([^"]+)""#).expect("valid datetime pattern")
});

static TIME_TEXT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<time[^>]*>(.*?)</time>").expect("valid time pattern"));

static SCRIPT_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style)\b[^>]*>.*?</(script|style)>").expect("valid script pattern")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag pattern"));

/// Strip markup and collapse whitespace into single spaces
fn strip_tags(html: &str) -> String {
    let without_blocks = SCRIPT_STYLE.replace_all(html, " ");
    let without_tags = TAG.replace_all(&without_blocks, " ");
    let decoded = decode_entities(&without_tags);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

/// Pull candidate links out of listing-page HTML: same host as the listing,
/// meaningful anchor text, fragment stripped, deduplicated in order.
fn parse_listing(html: &str, listing_url: &Url) -> Vec<CandidateLink> {
    let mut seen = std::collections::HashSet::new();
    let mut links = Vec::new();

    for caps in ANCHOR.captures_iter(html) {
        let text = strip_tags(&caps[2]);
        if text.chars().count() <= MIN_LINK_TEXT_CHARS {
            continue;
        }

        let Ok(resolved) = listing_url.join(&caps[1]) else {
            continue;
        };
        if resolved.host_str() != listing_url.host_str() {
            continue;
        }

        let mut clean = resolved;
        clean.set_fragment(None);
        let href = clean.to_string();

        if seen.insert(href.clone()) {
            links.push(CandidateLink { href, text });
        }
    }

    links
}

/// Extract article fields from article-page HTML
fn parse_article(html: &str) -> ArticlePage {
    let title = TITLE_H1
        .captures(html)
        .or_else(|| TITLE_TAG.captures(html))
        .map(|caps| strip_tags(&caps[1]))
        .unwrap_or_default();

    let body_html = BODY_ARTICLE
        .captures(html)
        .or_else(|| BODY_MAIN.captures(html))
        .map_or(html, |caps| caps.get(1).map_or(html, |m| m.as_str()));
    let body = strip_tags(body_html);

    let author = AUTHOR
        .captures(html)
        .map(|caps| strip_tags(&caps[1]))
        .filter(|author| !author.is_empty());

    let published_at = TIME_DATETIME
        .captures(html)
        .map(|caps| caps[1].trim().to_string())
        .or_else(|| TIME_TEXT.captures(html).map(|caps| strip_tags(&caps[1])))
        .filter(|published| !published.is_empty());

    ArticlePage {
        title,
        body,
        author,
        published_at,
    }
}

/// HTTP implementation of [`ContentSource`]
pub struct HttpContentSource {
    client: Client,
    label: String,
    home_url: String,
    listing_url: Url,
    credentials: Option<(String, String)>,
    timeout: Duration,
}

impl HttpContentSource {
    /// Build from configuration. The cookie store keeps whatever session the
    /// warm-up request establishes.
    pub fn from_config(config: &PulseConfig) -> Result<Self> {
        let listing_url = Url::parse(&config.content_listing_url)
            .map_err(|err| WorkerError::Crawl(format!("invalid listing URL: {err}")))?;

        let client = Client::builder()
            .cookie_store(true)
            .user_agent("Mozilla/5.0 (compatible; pulse-worker)")
            .build()?;

        let credentials = match (&config.content_email, &config.content_password) {
            (Some(email), Some(password)) => Some((email.clone(), password.clone())),
            _ => None,
        };

        Ok(Self {
            client,
            label: "investing".to_string(),
            home_url: config.content_home_url.clone(),
            listing_url,
            credentials,
            timeout: config.request_timeout,
        })
    }

    async fn get_html(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).timeout(self.timeout).send().await?;

        if !response.status().is_success() {
            return Err(WorkerError::Crawl(format!(
                "{url} returned {}",
                response.status()
            )));
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    fn source_label(&self) -> &str {
        &self.label
    }

    async fn establish_session(&self) -> Result<()> {
        if self.credentials.is_none() {
            tracing::warn!("content source credentials not configured, browsing anonymously");
            return Ok(());
        }

        // warm the cookie jar; a failed warm-up degrades to anonymous
        match self.get_html(&self.home_url).await {
            Ok(_) => tracing::debug!("content source session established"),
            Err(err) => tracing::warn!(%err, "session warm-up failed, continuing anonymously"),
        }
        Ok(())
    }

    async fn listing_links(&self) -> Result<Vec<CandidateLink>> {
        let html = self.get_html(self.listing_url.as_str()).await?;
        let links = parse_listing(&html, &self.listing_url);
        tracing::debug!(count = links.len(), "listing links collected");
        Ok(links)
    }

    async fn fetch_article(&self, url: &str) -> Result<ArticlePage> {
        let html = self.get_html(url).await?;
        Ok(parse_article(&html))
    }
}
