//! Composition stage: title and short text for `MediaAcquired` records.

use newsrelay_classifier::prompts::composition_prompt;
use newsrelay_classifier::{Classifier, GeneratedCopy, ReasoningRequest, ReasoningService};
use newsrelay_shared::text::{char_len, collapse_whitespace, truncate_chars};
use newsrelay_shared::{ComposedCopy, LifecycleState, Result, WorkItem};
use tracing::{debug, info, instrument, warn};

use crate::context::StageContext;
use crate::report::CompositionSummary;

/// Generate copy for every `MediaAcquired` record.
///
/// A record the classifier gives no usable answer for stays where it is and
/// is picked up again on the next run.
#[instrument(skip_all)]
pub async fn compose<S: ReasoningService>(
    ctx: &StageContext<'_>,
    classifier: &Classifier<S>,
) -> Result<CompositionSummary> {
    let settings = &ctx.config.composition;
    let mut records = ctx.store.load()?;
    let mut summary = CompositionSummary::default();

    ctx.progress.stage("Composing");

    let pending = records.ids_in_state(LifecycleState::MediaAcquired);
    let total = pending.len();

    for (i, id) in pending.into_iter().enumerate() {
        let Some(item) = records.get_mut(id) else {
            continue;
        };
        summary.examined += 1;
        ctx.progress.item(&item.article_title, i + 1, total);

        let prompt = composition_prompt(
            &item.classification.subjects,
            &item.classification.topic,
            truncate_chars(item.best_text(), settings.max_prompt_body_chars),
            settings.max_short_text_chars,
        );
        let Some(generated) = classifier
            .classify::<GeneratedCopy>(&ReasoningRequest::text(prompt))
            .await
        else {
            warn!(item_id = %id, "no copy generated, retry next run");
            summary.skipped += 1;
            continue;
        };

        let Some((copy, truncated)) = fit_copy(item, generated, settings.max_short_text_chars)
        else {
            warn!(item_id = %id, "generated short text is blank, retry next run");
            summary.skipped += 1;
            continue;
        };
        if truncated {
            debug!(item_id = %id, "short text truncated to budget");
            summary.truncated += 1;
        }

        if let Err(e) = item.compose(copy) {
            warn!(item_id = %id, error = %e, "generated copy refused");
            summary.skipped += 1;
            continue;
        }
        info!(item_id = %id, "content composed");
        summary.promoted += 1;
    }

    if summary.promoted > 0 {
        ctx.store.save(&mut records)?;
    }

    ctx.progress.finished("Composing");
    info!(%summary, "composition complete");
    Ok(summary)
}

/// Clean the generated copy and hold the short text to `budget` characters.
///
/// `None` when nothing is left of the short text.
fn fit_copy(
    item: &WorkItem,
    generated: GeneratedCopy,
    budget: usize,
) -> Option<(ComposedCopy, bool)> {
    let mut title = collapse_whitespace(&generated.title);
    if title.is_empty() {
        title = item.article_title.clone();
    }

    let short_text = collapse_whitespace(&generated.short_text);
    if short_text.is_empty() {
        return None;
    }
    let truncated = char_len(&short_text) > budget;
    let short_text = truncate_chars(&short_text, budget).trim_end().to_string();

    Some((ComposedCopy { title, short_text }, truncated))
}
