//! Syndicated feed fetching and entry extraction.
//!
//! A [`FeedReader`] downloads one feed (RSS, Atom, or JSON Feed), parses it
//! with `feed-rs`, and returns the newest entries as [`FeedEntry`] values in
//! feed order. Deciding which entries become records is the discovery
//! stage's job, not this crate's.

use std::sync::LazyLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use newsrelay_shared::{NewsRelayError, Result, text};
use regex::Regex;
use reqwest::Client;
use tracing::{debug, instrument};

/// Maximum number of redirects to follow when fetching a feed.
const MAX_REDIRECTS: usize = 5;

/// Default cap on a feed document (10 MB).
const MAX_RESPONSE_SIZE: u64 = 10 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Configuration for feed fetching.
#[derive(Debug, Clone)]
pub struct FeedOptions {
    /// Timeout for HTTP requests in seconds.
    pub timeout_secs: u64,
    /// User-Agent header value.
    pub user_agent: String,
    /// Only the first N entries of a feed are returned.
    pub max_entries: usize,
    /// Feed documents larger than this are refused.
    pub max_feed_bytes: u64,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: concat!("newsrelay/", env!("CARGO_PKG_VERSION")).into(),
            max_entries: 10,
            max_feed_bytes: MAX_RESPONSE_SIZE,
        }
    }
}

// ---------------------------------------------------------------------------
// FeedEntry
// ---------------------------------------------------------------------------

/// One entry extracted from a feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    /// Entry link; becomes the record's source identifier.
    pub link: String,
    pub title: String,
    /// Raw body HTML: full content, else summary, else media description.
    pub body_html: String,
    /// First `<img src>` in the body, if any.
    pub image_url: Option<String>,
    pub published: Option<DateTime<Utc>>,
}

impl FeedEntry {
    /// Body with markup removed and whitespace collapsed.
    pub fn plain_text(&self) -> String {
        strip_tags(&self.body_html)
    }
}

// ---------------------------------------------------------------------------
// FeedReader
// ---------------------------------------------------------------------------

/// Fetches and parses feeds over HTTP.
pub struct FeedReader {
    client: Client,
    max_entries: usize,
    max_feed_bytes: u64,
}

impl FeedReader {
    pub fn new(opts: &FeedOptions) -> Result<Self> {
        Ok(Self {
            client: build_client(opts)?,
            max_entries: opts.max_entries,
            max_feed_bytes: opts.max_feed_bytes,
        })
    }

    /// Fetch a feed and return its first `max_entries` entries.
    ///
    /// Network failures and unparseable documents are errors; callers decide
    /// whether one bad feed should stop the run.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch(&self, url: &str) -> Result<Vec<FeedEntry>> {
        let bytes = fetch_bytes(&self.client, url, self.max_feed_bytes).await?;
        let entries = parse_entries(&bytes, self.max_entries)
            .map_err(|e| NewsRelayError::parse(format!("{url}: {e}")))?;
        debug!(entries = entries.len(), "feed parsed");
        Ok(entries)
    }
}

/// Parse feed bytes into at most `max_entries` entries, keeping feed order.
/// Entries without a usable link are dropped.
pub fn parse_entries(
    bytes: &[u8],
    max_entries: usize,
) -> std::result::Result<Vec<FeedEntry>, feed_rs::parser::ParseFeedError> {
    let feed = feed_rs::parser::parse(bytes)?;

    Ok(feed
        .entries
        .into_iter()
        .take(max_entries)
        .filter_map(|entry| {
            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .or_else(|| entry.id.starts_with("http").then(|| entry.id.clone()))?;

            let body_html = entry
                .content
                .and_then(|c| c.body)
                .filter(|b| !b.trim().is_empty())
                .or_else(|| {
                    entry
                        .summary
                        .map(|s| s.content)
                        .filter(|s| !s.trim().is_empty())
                })
                .or_else(|| {
                    entry
                        .media
                        .into_iter()
                        .find_map(|m| m.description.map(|d| d.content))
                })
                .unwrap_or_default();

            Some(FeedEntry {
                image_url: first_image_src(&body_html),
                title: entry.title.map(|t| t.content).unwrap_or_default(),
                published: entry.published.or(entry.updated),
                link,
                body_html,
            })
        })
        .collect())
}

/// The `src` of the first `<img>` tag, matched case-insensitively.
pub fn first_image_src(html: &str) -> Option<String> {
    static IMG_SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?i)<img[^>]+src\s*=\s*["']([^"']+)["']"#).expect("valid regex")
    });

    IMG_SRC_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn strip_tags(html: &str) -> String {
    static TAG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));

    text::collapse_whitespace(&TAG_RE.replace_all(html, " "))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn build_client(opts: &FeedOptions) -> Result<Client> {
    Client::builder()
        .user_agent(opts.user_agent.as_str())
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .timeout(Duration::from_secs(opts.timeout_secs))
        .build()
        .map_err(|e| NewsRelayError::Network(format!("failed to build HTTP client: {e}")))
}

/// Read the body chunk by chunk so a response without `Content-Length`
/// is held to `max_bytes` too.
async fn fetch_bytes(client: &Client, url: &str, max_bytes: u64) -> Result<Vec<u8>> {
    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| NewsRelayError::Network(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(NewsRelayError::Network(format!("{url}: HTTP {status}")));
    }

    let mut bytes = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| NewsRelayError::Network(format!("{url}: failed to read body: {e}")))?
    {
        if (bytes.len() + chunk.len()) as u64 > max_bytes {
            return Err(NewsRelayError::validation(format!(
                "{url}: feed larger than {max_bytes} bytes"
            )));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}
