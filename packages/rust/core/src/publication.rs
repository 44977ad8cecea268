//! Publication stage: operator-approved posts for `ContentComposed` records.
//!
//! The store is saved right after every successful post, so a crash later in
//! the run can never cause the same record to be posted twice.

use chrono::Utc;
use newsrelay_artifacts::artifact_url;
use newsrelay_publisher::{Poster, compose_message};
use newsrelay_shared::{LifecycleState, PublicationRecord, Result, require_base_url};
use tracing::{info, instrument, warn};

use crate::approval::{ApprovalRequest, Approver, Decision};
use crate::context::StageContext;
use crate::report::PublicationSummary;

/// Publication run options.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublishOptions {
    /// Build the messages but neither ask, post, nor save.
    pub dry_run: bool,
}

/// Post every `ContentComposed` record the approver lets through.
///
/// A posting failure is recorded in the summary and the record is left for a
/// later run; it is not retried within this one.
#[instrument(skip_all, fields(dry_run = opts.dry_run))]
pub async fn publish<P: Poster>(
    ctx: &StageContext<'_>,
    poster: &P,
    approver: &mut dyn Approver,
    opts: PublishOptions,
) -> Result<PublicationSummary> {
    let base_url = require_base_url(ctx.config)?;
    let limit = ctx.config.publication.message_limit;
    let mut records = ctx.store.load()?;
    let mut summary = PublicationSummary::default();

    ctx.progress.stage("Publishing");

    let pending = records.ids_in_state(LifecycleState::ContentComposed);
    let total = pending.len();

    for (i, id) in pending.into_iter().enumerate() {
        let Some(item) = records.get(id) else {
            continue;
        };
        let Some(copy) = item.composed_copy() else {
            continue;
        };
        summary.examined += 1;
        ctx.progress.item(&item.article_title, i + 1, total);

        let url = artifact_url(&base_url, &id)?.to_string();
        let message = compose_message(&copy.short_text, &url, limit);

        if opts.dry_run {
            summary.previews.push((id, message));
            continue;
        }

        let decision = approver.decide(&ApprovalRequest {
            item,
            artifact_url: &url,
            message: &message,
        })?;
        match decision {
            Decision::Approve => {}
            Decision::Skip => {
                summary.skipped += 1;
                continue;
            }
            Decision::Abort => {
                info!("publication stopped by operator");
                summary.aborted = true;
                break;
            }
        }

        let receipt = match poster.post(&message).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(item_id = %id, error = %e, "post failed, record left for a later run");
                summary.failed.push((id, e.to_string()));
                continue;
            }
        };

        let Some(item) = records.get_mut(id) else {
            continue;
        };
        item.publish(PublicationRecord {
            post_id: receipt.post_id.clone(),
            published_at: Utc::now(),
            artifact_url: url,
        })?;
        ctx.store.save(&mut records)?;

        info!(item_id = %id, post_id = %receipt.post_id, "published");
        summary.published += 1;
    }

    ctx.progress.finished("Publishing");
    info!(%summary, "publication complete");
    Ok(summary)
}
