//! Sequential runner: discover → enrich → compose → render.
//!
//! Publication is left out; it needs an operator.

use std::fmt;
use std::time::{Duration, Instant};

use newsrelay_artifacts::RenderSummary;
use newsrelay_classifier::{Classifier, ReasoningService};
use newsrelay_crawler::PageFetcher;
use newsrelay_discovery::FeedReader;
use newsrelay_shared::Result;
use tracing::{info, instrument};

use crate::composition::compose;
use crate::context::StageContext;
use crate::discover::discover;
use crate::enrichment::enrich;
use crate::render::render;
use crate::report::{CompositionSummary, DiscoverySummary, EnrichmentSummary};

/// Outcome of a full run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub discovery: DiscoverySummary,
    pub enrichment: EnrichmentSummary,
    pub composition: CompositionSummary,
    pub render: RenderSummary,
    pub elapsed: Duration,
}

/// Run every automatic stage in order. A stage error stops the run.
#[instrument(skip_all)]
pub async fn run<S: ReasoningService>(
    ctx: &StageContext<'_>,
    reader: &FeedReader,
    fetcher: &PageFetcher,
    classifier: &Classifier<S>,
) -> Result<RunSummary> {
    let start = Instant::now();
    info!("starting run");

    let discovery = discover(ctx, reader, classifier).await?;
    let enrichment = enrich(ctx, fetcher, classifier).await?;
    let composition = compose(ctx, classifier).await?;
    let render = render(ctx)?;

    let summary = RunSummary {
        discovery,
        enrichment,
        composition,
        render,
        elapsed: start.elapsed(),
    };
    info!(elapsed_ms = summary.elapsed.as_millis() as u64, "run complete");
    Ok(summary)
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "discover: {}", self.discovery)?;
        writeln!(f, "enrich:   {}", self.enrichment)?;
        writeln!(f, "compose:  {}", self.composition)?;
        write!(
            f,
            "render:   {} pages, {} skipped ({:.1}s)",
            self.render.pages.len(),
            self.render.skipped.len(),
            self.elapsed.as_secs_f64()
        )
    }
}
