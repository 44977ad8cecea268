//! Render stage: static pages for composed records.

use newsrelay_artifacts::{RenderSummary, SiteOptions, render_site};
use newsrelay_shared::{Result, require_base_url};
use tracing::{info, instrument, warn};

use crate::context::StageContext;

/// Render pages for every record with composed copy. Never changes records.
///
/// Index links use the public base URL when one is configured and relative
/// links otherwise.
#[instrument(skip_all)]
pub fn render(ctx: &StageContext<'_>) -> Result<RenderSummary> {
    let records = ctx.store.load()?;

    let base_url = if ctx.config.publication.base_url.trim().is_empty() {
        None
    } else {
        match require_base_url(ctx.config) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(error = %e, "index will use relative links");
                None
            }
        }
    };

    let opts = SiteOptions {
        site_dir: ctx.config.paths.site_dir.clone(),
        call_to_action_url: ctx.config.site.call_to_action_url.clone(),
        base_url,
    };

    ctx.progress.stage("Rendering");
    let summary = render_site(records.items(), &opts)?;
    ctx.progress.finished("Rendering");

    info!(pages = summary.pages.len(), skipped = summary.skipped.len(), "render complete");
    Ok(summary)
}
