//! Application configuration for newsrelay.
//!
//! Resolution order: an explicit `--config` path, then `./newsrelay.toml`,
//! then `~/.newsrelay/newsrelay.toml`, then built-in defaults.
//! Secrets are never stored in the file: the config names the environment
//! variables that hold them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NewsRelayError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "newsrelay.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".newsrelay";

// ---------------------------------------------------------------------------
// Config structs (matching newsrelay.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// File locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// HTTP client settings shared by feed, page, and media fetches.
    #[serde(default)]
    pub http: HttpConfig,

    /// Discovery stage settings.
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Reasoning service (classifier) settings.
    #[serde(default)]
    pub reasoning: ReasoningConfig,

    /// Enrichment stage settings.
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Composition stage settings.
    #[serde(default)]
    pub composition: CompositionConfig,

    /// Publication stage settings.
    #[serde(default)]
    pub publication: PublicationConfig,

    /// Static site rendering settings.
    #[serde(default)]
    pub site: SiteConfig,

    /// Syndicated feed sources.
    #[serde(default)]
    pub feeds: Vec<FeedSource>,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Record store file.
    #[serde(default = "default_store_file")]
    pub store_file: PathBuf,

    /// Directory that holds accepted media.
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,

    /// Output directory of the static site renderer.
    #[serde(default = "default_site_dir")]
    pub site_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            store_file: default_store_file(),
            media_dir: default_media_dir(),
            site_dir: default_site_dir(),
        }
    }
}

fn default_store_file() -> PathBuf {
    PathBuf::from("records.json")
}
fn default_media_dir() -> PathBuf {
    PathBuf::from("media")
}
fn default_site_dir() -> PathBuf {
    PathBuf::from("site")
}

/// `[http]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,

    /// User-Agent header sent with feed, page, and media requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_http_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_http_timeout() -> u64 {
    15
}
fn default_user_agent() -> String {
    concat!("newsrelay/", env!("CARGO_PKG_VERSION")).into()
}

/// `[discovery]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Only the newest N entries of each feed are considered per run.
    #[serde(default = "default_max_entries")]
    pub max_entries_per_feed: usize,

    /// Stored summary length, in characters.
    #[serde(default = "default_summary_chars")]
    pub summary_chars: usize,

    /// Summary length sent to the relevance prompt, in characters.
    #[serde(default = "default_prompt_summary_chars")]
    pub prompt_summary_chars: usize,

    /// Pause after every relevance call, in ms.
    #[serde(default = "default_discovery_delay")]
    pub call_delay_ms: u64,

    /// What the relevance prompt should accept.
    #[serde(default = "default_relevance_criteria")]
    pub relevance_criteria: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_entries_per_feed: default_max_entries(),
            summary_chars: default_summary_chars(),
            prompt_summary_chars: default_prompt_summary_chars(),
            call_delay_ms: default_discovery_delay(),
            relevance_criteria: default_relevance_criteria(),
        }
    }
}

fn default_max_entries() -> usize {
    10
}
fn default_summary_chars() -> usize {
    500
}
fn default_prompt_summary_chars() -> usize {
    200
}
fn default_discovery_delay() -> u64 {
    6000
}
fn default_relevance_criteria() -> String {
    "Accept: stories centred on named public figures (entertainers, influencers, \
     celebrities) involved in a controversy, scandal, or trending incident. \
     Reject: politics, routine sports results, anime/games without public figures, \
     general news."
        .into()
}

/// `[reasoning]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model identifier passed to the service.
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the OpenAI-compatible chat completions API.
    #[serde(default = "default_reasoning_base_url")]
    pub base_url: String,

    /// Per-call timeout in seconds.
    #[serde(default = "default_reasoning_timeout")]
    pub timeout_secs: u64,

    /// Attempts per classification, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff unit; attempt `n` waits `n * backoff_base_ms`.
    #[serde(default = "default_backoff_base")]
    pub backoff_base_ms: u64,

    /// Wait used when a rate limit carries no retry hint.
    #[serde(default = "default_rate_limit_fallback")]
    pub rate_limit_fallback_ms: u64,

    /// Added on top of a server-suggested retry delay.
    #[serde(default = "default_rate_limit_buffer")]
    pub rate_limit_buffer_ms: u64,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            model: default_model(),
            base_url: default_reasoning_base_url(),
            timeout_secs: default_reasoning_timeout(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base(),
            rate_limit_fallback_ms: default_rate_limit_fallback(),
            rate_limit_buffer_ms: default_rate_limit_buffer(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_model() -> String {
    "google/gemini-2.0-flash-001".into()
}
fn default_reasoning_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_reasoning_timeout() -> u64 {
    30
}
fn default_max_attempts() -> u32 {
    3
}
fn default_backoff_base() -> u64 {
    5000
}
fn default_rate_limit_fallback() -> u64 {
    60_000
}
fn default_rate_limit_buffer() -> u64 {
    1000
}

/// `[enrichment]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// A selector match is accepted only above this many characters of text.
    #[serde(default = "default_min_body_chars")]
    pub min_body_chars: usize,

    /// Downloads smaller than this are treated as icons/placeholders.
    #[serde(default = "default_min_media_bytes")]
    pub min_media_bytes: usize,

    /// Cap on images taken from the main content region.
    #[serde(default = "default_max_content_images")]
    pub max_content_images: usize,

    /// Pause after every media judgment call, in ms.
    #[serde(default = "default_enrichment_delay")]
    pub call_delay_ms: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            min_body_chars: default_min_body_chars(),
            min_media_bytes: default_min_media_bytes(),
            max_content_images: default_max_content_images(),
            call_delay_ms: default_enrichment_delay(),
        }
    }
}

fn default_min_body_chars() -> usize {
    100
}
fn default_min_media_bytes() -> usize {
    10 * 1024
}
fn default_max_content_images() -> usize {
    3
}
fn default_enrichment_delay() -> u64 {
    3000
}

/// `[composition]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositionConfig {
    /// Character budget of the generated short text.
    #[serde(default = "default_max_short_text")]
    pub max_short_text_chars: usize,

    /// Article text sent to the generation prompt, in characters.
    #[serde(default = "default_max_prompt_body")]
    pub max_prompt_body_chars: usize,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            max_short_text_chars: default_max_short_text(),
            max_prompt_body_chars: default_max_prompt_body(),
        }
    }
}

fn default_max_short_text() -> usize {
    80
}
fn default_max_prompt_body() -> usize {
    4000
}

/// `[publication]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicationConfig {
    /// Public base URL of the rendered pages. Required to publish.
    #[serde(default)]
    pub base_url: String,

    /// Name of the env var holding the posting API user token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Posting API base URL.
    #[serde(default = "default_posting_api")]
    pub api_base_url: String,

    /// Hard character limit of one outbound message.
    #[serde(default = "default_message_limit")]
    pub message_limit: usize,
}

impl Default for PublicationConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token_env: default_token_env(),
            api_base_url: default_posting_api(),
            message_limit: default_message_limit(),
        }
    }
}

fn default_token_env() -> String {
    "X_USER_ACCESS_TOKEN".into()
}
fn default_posting_api() -> String {
    "https://api.x.com".into()
}
fn default_message_limit() -> usize {
    280
}

/// `[site]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Link target of every image and call-to-action button on a page.
    #[serde(default)]
    pub call_to_action_url: String,
}

/// `[[feeds]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    /// Human-readable feed name.
    pub name: String,
    /// Feed URL (RSS, Atom, or JSON Feed).
    pub url: String,
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.newsrelay/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NewsRelayError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the user-level config file (`~/.newsrelay/newsrelay.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the config: `./newsrelay.toml` first, then the user-level file.
/// Returns defaults if neither exists.
pub fn load_config() -> Result<AppConfig> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return load_config_from(&local);
    }

    let path = config_file_path()?;
    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NewsRelayError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| NewsRelayError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Write a default config file to `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| NewsRelayError::io(parent, e))?;
    }

    let mut config = AppConfig::default();
    config.feeds.push(FeedSource {
        name: "example".into(),
        url: "https://example.com/feed.xml".into(),
    });
    let content =
        toml::to_string_pretty(&config).map_err(|e| NewsRelayError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| NewsRelayError::io(path, e))?;
    tracing::info!(?path, "created default config file");
    Ok(())
}

// ---------------------------------------------------------------------------
// Per-stage validation
// ---------------------------------------------------------------------------

/// Discovery needs at least one feed.
pub fn require_feeds(config: &AppConfig) -> Result<&[FeedSource]> {
    if config.feeds.is_empty() {
        return Err(NewsRelayError::config(
            "no feeds configured. Add at least one [[feeds]] entry with name and url",
        ));
    }
    for feed in &config.feeds {
        if feed.url.trim().is_empty() {
            return Err(NewsRelayError::config(format!(
                "feed '{}' has an empty url",
                feed.name
            )));
        }
    }
    Ok(&config.feeds)
}

/// Resolve the reasoning service API key from the configured env var.
pub fn validate_api_key(config: &AppConfig) -> Result<String> {
    read_secret(&config.reasoning.api_key_env, "reasoning service API key")
}

/// Resolve the posting API token from the configured env var.
pub fn validate_posting_token(config: &AppConfig) -> Result<String> {
    read_secret(&config.publication.token_env, "posting API token")
}

/// Publication and the site index need the public base URL.
pub fn require_base_url(config: &AppConfig) -> Result<url::Url> {
    let raw = config.publication.base_url.trim();
    if raw.is_empty() {
        return Err(NewsRelayError::config(
            "publication.base_url is not set (e.g. \"https://user.github.io/site/\")",
        ));
    }
    url::Url::parse(raw)
        .map_err(|e| NewsRelayError::config(format!("publication.base_url '{raw}' is invalid: {e}")))
}

fn read_secret(var_name: &str, what: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(NewsRelayError::config(format!(
            "{what} not found. Set the {var_name} environment variable."
        ))),
    }
}
