//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use newsrelay_classifier::{Classifier, OpenRouterService, RetryPolicy};
use newsrelay_core::{
    Approver, AutoApprove, InteractiveApprover, PolicyApprover, PublicationSummary,
    PublishOptions, SilentProgress, StageContext, StageProgress,
};
use newsrelay_crawler::{FetchOptions, PageFetcher};
use newsrelay_discovery::{FeedOptions, FeedReader};
use newsrelay_publisher::XPoster;
use newsrelay_shared::{
    AppConfig, config_file_path, init_config_at, load_config, load_config_from,
    validate_api_key, validate_posting_token,
};
use newsrelay_storage::RecordStore;
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// newsrelay: turn syndicated news into reviewed, published posts.
#[derive(Parser)]
#[command(
    name = "newsrelay",
    version,
    about = "Discover, enrich, compose, and publish news records from syndicated feeds.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ./newsrelay.toml, then ~/.newsrelay/newsrelay.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Poll feeds and store relevant new entries.
    Discover,

    /// Fetch article pages and judge their images.
    Enrich,

    /// Generate titles and short texts.
    Compose,

    /// Render static pages for composed records.
    Render,

    /// Post composed records after operator approval.
    Publish {
        /// Approve every record without asking.
        #[arg(long)]
        yes: bool,

        /// Approve at most N records this run, then skip the rest.
        #[arg(long, value_name = "N")]
        limit: Option<usize>,

        /// Print the messages that would be posted; post and save nothing.
        #[arg(long)]
        dry_run: bool,
    },

    /// Discover, enrich, compose, and render in one go.
    Run,

    /// Show record counts per lifecycle state.
    Status,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Write a config file with defaults.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "newsrelay=info",
        1 => "newsrelay=debug",
        _ => "newsrelay=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let command = match cli.command {
        Command::Config { action } => {
            return match action {
                ConfigAction::Init { force } => cmd_config_init(cli.config, force),
                ConfigAction::Show => cmd_config_show(&resolve_config(cli.config.as_ref())?),
            };
        }
        other => other,
    };

    let config = resolve_config(cli.config.as_ref())?;
    let store = RecordStore::new(&config.paths.store_file);
    match command {
        Command::Discover => cmd_discover(&config, &store).await,
        Command::Enrich => cmd_enrich(&config, &store).await,
        Command::Compose => cmd_compose(&config, &store).await,
        Command::Render => cmd_render(&config, &store),
        Command::Publish {
            yes,
            limit,
            dry_run,
        } => cmd_publish(&config, &store, yes, limit, dry_run).await,
        Command::Run => cmd_run(&config, &store).await,
        Command::Status => cmd_status(&store),
        Command::Config { .. } => unreachable!("handled above"),
    }
}

fn resolve_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Service construction
// ---------------------------------------------------------------------------

fn feed_reader(config: &AppConfig) -> Result<FeedReader> {
    Ok(FeedReader::new(&FeedOptions {
        timeout_secs: config.http.timeout_secs,
        user_agent: config.http.user_agent.clone(),
        max_entries: config.discovery.max_entries_per_feed,
        ..FeedOptions::default()
    })?)
}

fn page_fetcher(config: &AppConfig) -> Result<PageFetcher> {
    Ok(PageFetcher::new(&FetchOptions {
        timeout_secs: config.http.timeout_secs,
        user_agent: config.http.user_agent.clone(),
        ..FetchOptions::default()
    })?)
}

fn classifier(config: &AppConfig) -> Result<Classifier<OpenRouterService>> {
    let api_key = validate_api_key(config)?;
    let service = OpenRouterService::new(api_key, &config.reasoning)?;
    Ok(Classifier::new(
        service,
        RetryPolicy::from_config(&config.reasoning),
    ))
}

// ---------------------------------------------------------------------------
// Stage commands
// ---------------------------------------------------------------------------

async fn cmd_discover(config: &AppConfig, store: &RecordStore) -> Result<()> {
    newsrelay_shared::require_feeds(config)?;
    let reader = feed_reader(config)?;
    let classifier = classifier(config)?;

    let progress = CliProgress::new();
    let ctx = StageContext::new(config, store, &progress);
    let summary = newsrelay_core::discover(&ctx, &reader, &classifier).await;
    progress.clear();

    println!("discover: {}", summary?);
    Ok(())
}

async fn cmd_enrich(config: &AppConfig, store: &RecordStore) -> Result<()> {
    let fetcher = page_fetcher(config)?;
    let classifier = classifier(config)?;

    let progress = CliProgress::new();
    let ctx = StageContext::new(config, store, &progress);
    let summary = newsrelay_core::enrich(&ctx, &fetcher, &classifier).await;
    progress.clear();

    println!("enrich: {}", summary?);
    Ok(())
}

async fn cmd_compose(config: &AppConfig, store: &RecordStore) -> Result<()> {
    let classifier = classifier(config)?;

    let progress = CliProgress::new();
    let ctx = StageContext::new(config, store, &progress);
    let summary = newsrelay_core::compose(&ctx, &classifier).await;
    progress.clear();

    println!("compose: {}", summary?);
    Ok(())
}

fn cmd_render(config: &AppConfig, store: &RecordStore) -> Result<()> {
    let ctx = StageContext::new(config, store, &SilentProgress);
    let summary = newsrelay_core::render(&ctx)?;

    println!(
        "render: {} pages, {} skipped (no media on disk)",
        summary.pages.len(),
        summary.skipped.len()
    );
    println!(
        "  index: {}",
        config.paths.site_dir.join("index.html").display()
    );
    Ok(())
}

async fn cmd_publish(
    config: &AppConfig,
    store: &RecordStore,
    yes: bool,
    limit: Option<usize>,
    dry_run: bool,
) -> Result<()> {
    let opts = PublishOptions { dry_run };

    // Dry runs never reach the posting API, so they need no token.
    let poster = if dry_run {
        None
    } else {
        let token = validate_posting_token(config)?;
        Some(XPoster::new(token, &config.publication)?)
    };

    let interactive = !yes && limit.is_none() && !dry_run;
    let mut approver: Box<dyn Approver> = match (limit, yes) {
        (Some(max), _) => Box::new(PolicyApprover::new(max)),
        (None, true) => Box::new(AutoApprove),
        (None, false) => Box::new(InteractiveApprover::new(
            std::io::stdin().lock(),
            std::io::stdout(),
        )),
    };

    // The spinner would draw over the approval prompt.
    let cli_progress = (!interactive).then(CliProgress::new);
    let progress: &dyn StageProgress = match &cli_progress {
        Some(p) => p,
        None => &SilentProgress,
    };
    let ctx = StageContext::new(config, store, progress);

    let summary = match &poster {
        Some(poster) => newsrelay_core::publish(&ctx, poster, approver.as_mut(), opts).await,
        None => newsrelay_core::publish(&ctx, &DryRunPoster, approver.as_mut(), opts).await,
    };
    if let Some(p) = &cli_progress {
        p.clear();
    }

    print_publication(&summary?);
    Ok(())
}

async fn cmd_run(config: &AppConfig, store: &RecordStore) -> Result<()> {
    newsrelay_shared::require_feeds(config)?;
    let reader = feed_reader(config)?;
    let fetcher = page_fetcher(config)?;
    let classifier = classifier(config)?;

    info!(store = %store.path().display(), "starting pipeline run");

    let progress = CliProgress::new();
    let ctx = StageContext::new(config, store, &progress);
    let summary = newsrelay_core::run(&ctx, &reader, &fetcher, &classifier).await;
    progress.clear();

    let summary = summary?;
    println!();
    println!("{summary}");
    println!();
    if summary.composition.promoted > 0 {
        println!("  Review and post with: newsrelay publish");
        println!();
    }
    Ok(())
}

fn cmd_status(store: &RecordStore) -> Result<()> {
    let status = newsrelay_core::store_status(store)?;
    print!("{status}");
    Ok(())
}

fn print_publication(summary: &PublicationSummary) {
    for (id, message) in &summary.previews {
        println!("--- {id}");
        println!("{message}");
    }
    if !summary.previews.is_empty() {
        println!("--- {} message(s), nothing posted", summary.previews.len());
        return;
    }
    for (id, error) in &summary.failed {
        println!("  failed {id}: {error}");
    }
    println!("publish: {summary}");
}

/// Stand-in poster for dry runs; `publish` never calls it when `dry_run` is set.
struct DryRunPoster;

impl newsrelay_publisher::Poster for DryRunPoster {
    async fn post(
        &self,
        _text: &str,
    ) -> std::result::Result<newsrelay_publisher::PostReceipt, newsrelay_publisher::PostError>
    {
        Err(newsrelay_publisher::PostError::Network(
            "dry run does not post".into(),
        ))
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config_init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match path {
        Some(p) => p,
        None => config_file_path()?,
    };
    if path.exists() && !force {
        return Err(eyre!(
            "config file already exists at '{}' (use --force to overwrite)",
            path.display()
        ));
    }
    init_config_at(&path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }

    fn clear(&self) {
        self.spinner.finish_and_clear();
    }
}

impl StageProgress for CliProgress {
    fn stage(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn item(&self, label: &str, current: usize, total: usize) {
        self.spinner.set_message(format!("[{current}/{total}] {label}"));
    }

    fn finished(&self, _name: &str) {
        self.spinner.set_message(String::new());
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        self.spinner.finish_and_clear();
    }
}
