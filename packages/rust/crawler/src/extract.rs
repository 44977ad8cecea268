//! Body text and media candidate extraction from article pages.

use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Structural selectors tried in order when looking for the article body.
const BODY_SELECTORS: &[&str] = &[
    ".entry-content",
    ".article-content",
    ".post-content",
    ".content",
    "article",
    ".article",
    ".main-content",
    ".post-body",
];

/// Selectors for images inside the main content region. The first one with
/// any match wins.
const IMAGE_SELECTORS: &[&str] = &[
    ".article img",
    "article img",
    ".entry-content img",
    ".post-content img",
    ".content img",
    ".article-content img",
];

/// Elements whose text never counts as article text.
const CHROME_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "noscript"];

// ---------------------------------------------------------------------------
// Body text
// ---------------------------------------------------------------------------

/// Extract the article text.
///
/// Returns the first selector match whose text exceeds `min_chars`
/// characters, else the whole `<body>` without page chrome. Empty if the
/// document has no body text at all.
pub fn extract_body_text(doc: &Html, min_chars: usize) -> String {
    for sel_str in BODY_SELECTORS {
        let Ok(sel) = Selector::parse(sel_str) else {
            continue;
        };
        if let Some(el) = doc.select(&sel).next() {
            let text = visible_text(el);
            if text.chars().count() > min_chars {
                tracing::trace!(selector = sel_str, chars = text.len(), "body selector matched");
                return text;
            }
        }
    }

    let Ok(body_sel) = Selector::parse("body") else {
        return String::new();
    };
    doc.select(&body_sel)
        .next()
        .map(visible_text)
        .unwrap_or_default()
}

/// Text of `el` minus chrome elements, one line per text block.
fn visible_text(el: ElementRef<'_>) -> String {
    el.descendants()
        .filter_map(|node| node.value().as_text().map(|t| (node, t)))
        .filter(|(node, _)| {
            !node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|e| CHROME_TAGS.contains(&e.name()))
            })
        })
        .map(|(_, t)| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Media candidates
// ---------------------------------------------------------------------------

/// Where a media candidate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    /// Page-level representative image (`og:image`).
    Representative,
    /// Image inside the main content region.
    Content,
    /// Image embedded in the feed entry.
    Feed,
}

/// A fetchable image URL found for an article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaCandidate {
    pub url: Url,
    pub kind: MediaKind,
}

/// Collect ranked media candidates: the representative image first, then up
/// to `max_content` content images. Relative URLs are resolved against
/// `page_url`; inline `data:` images are dropped.
pub fn collect_media_candidates(
    doc: &Html,
    page_url: &Url,
    max_content: usize,
) -> Vec<MediaCandidate> {
    let mut candidates = Vec::new();

    if let Some(url) = representative_image(doc, page_url) {
        candidates.push(MediaCandidate {
            url,
            kind: MediaKind::Representative,
        });
    }

    for url in content_images(doc, page_url, max_content) {
        if candidates.iter().any(|c| c.url == url) {
            continue;
        }
        candidates.push(MediaCandidate {
            url,
            kind: MediaKind::Content,
        });
    }

    candidates
}

fn representative_image(doc: &Html, page_url: &Url) -> Option<Url> {
    let sel = Selector::parse(r#"meta[property="og:image"]"#).ok()?;
    let content = doc.select(&sel).next()?.value().attr("content")?;
    resolve_media_url(page_url, content)
}

fn content_images(doc: &Html, page_url: &Url, max: usize) -> Vec<Url> {
    for sel_str in IMAGE_SELECTORS {
        let Ok(sel) = Selector::parse(sel_str) else {
            continue;
        };
        let imgs: Vec<_> = doc.select(&sel).collect();
        if imgs.is_empty() {
            continue;
        }
        return imgs
            .into_iter()
            .filter_map(|img| {
                let attrs = img.value();
                let src = attrs
                    .attr("src")
                    .filter(|s| !s.trim().is_empty())
                    .or_else(|| attrs.attr("data-src"))?;
                resolve_media_url(page_url, src)
            })
            .take(max)
            .collect();
    }
    Vec::new()
}

/// Resolve `src` against `base`, rejecting inline data and non-HTTP schemes.
pub fn resolve_media_url(base: &Url, src: &str) -> Option<Url> {
    let src = src.trim();
    if src.is_empty() || src.starts_with("data:") {
        return None;
    }
    let url = base.join(src).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}
