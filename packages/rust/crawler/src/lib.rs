//! Article page fetching and content extraction.
//!
//! This crate provides:
//! - [`PageFetcher`], the HTTP client for article pages and media downloads
//! - [`extract_body_text`], selector-based article text extraction
//! - [`collect_media_candidates`], ranked image candidates for a page
//! - [`ImageFormat`], magic-byte format detection for downloaded media

pub mod extract;
pub mod fetch;
pub mod media;

pub use extract::{
    MediaCandidate, MediaKind, collect_media_candidates, extract_body_text, resolve_media_url,
};
pub use fetch::{Download, FetchOptions, FetchedPage, PageFetcher};
pub use media::ImageFormat;
