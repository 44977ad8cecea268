//! Shared types, error model, and configuration for newsrelay.
//!
//! This crate is the foundation depended on by all other newsrelay crates.
//! It provides:
//! - [`NewsRelayError`], the unified error type
//! - Domain types ([`WorkItem`], [`LifecycleState`], [`ItemId`]) and the
//!   record state machine
//! - Configuration ([`AppConfig`], config loading, per-stage validators)

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod text;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CompositionConfig, DiscoveryConfig, EnrichmentConfig, FeedSource, HttpConfig,
    PathsConfig, PublicationConfig, ReasoningConfig, SiteConfig, config_dir, config_file_path,
    init_config_at, load_config, load_config_from, require_base_url, require_feeds,
    validate_api_key, validate_posting_token,
};
pub use error::{NewsRelayError, Result};
pub use types::{
    Classification, ComposedCopy, ItemId, LifecycleState, PublicationRecord, WorkItem,
};
