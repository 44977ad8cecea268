//! Enrichment stage: page text and judged media for `Detected` records.
//!
//! Candidate order is representative image, in-content images, then the
//! image embedded in the feed entry. Each candidate is downloaded, size
//! checked, written to the media directory, and judged. Rejected files are
//! removed at once. A record with no accepted media stays `Detected`.

use std::path::{Path, PathBuf};

use newsrelay_classifier::prompts::media_prompt;
use newsrelay_classifier::{
    Classifier, ImageAttachment, MediaVerdict, ReasoningRequest, ReasoningService,
};
use newsrelay_crawler::{
    ImageFormat, MediaCandidate, MediaKind, PageFetcher, collect_media_candidates,
    extract_body_text, resolve_media_url,
};
use newsrelay_shared::{EnrichmentConfig, ItemId, LifecycleState, NewsRelayError, Result, WorkItem};
use scraper::Html;
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::context::{StageContext, pause};
use crate::report::EnrichmentSummary;

/// A media file that passed judgment.
struct AcceptedMedia {
    path: PathBuf,
    kind: MediaKind,
    digest: [u8; 32],
}

/// What the page yielded before any media is downloaded.
struct PageHarvest {
    body: String,
    candidates: Vec<MediaCandidate>,
}

/// Enrich every `Detected` record.
#[instrument(skip_all)]
pub async fn enrich<S: ReasoningService>(
    ctx: &StageContext<'_>,
    fetcher: &PageFetcher,
    classifier: &Classifier<S>,
) -> Result<EnrichmentSummary> {
    let settings = &ctx.config.enrichment;
    let media_dir = &ctx.config.paths.media_dir;
    let mut records = ctx.store.load()?;
    let mut summary = EnrichmentSummary::default();
    let mut dirty = false;

    ctx.progress.stage("Enriching");

    let pending = records.ids_in_state(LifecycleState::Detected);
    let total = pending.len();

    for (i, id) in pending.into_iter().enumerate() {
        let Some(item) = records.get_mut(id) else {
            continue;
        };
        summary.examined += 1;
        ctx.progress.item(&item.article_title, i + 1, total);

        let PageHarvest { body, candidates } =
            match fetcher.fetch_page(&item.source_identifier).await {
                Ok(page) => harvest_page(&page.html, &page.url, item, settings),
                Err(e) => {
                    warn!(item_id = %id, error = %e, "page fetch failed, retry next run");
                    summary.pages_failed += 1;
                    summary.skipped += 1;
                    continue;
                }
            };
        let body = (!body.is_empty()).then_some(body);

        let accepted = match judge_candidates(
            item,
            &candidates,
            media_dir,
            fetcher,
            classifier,
            settings,
            &mut summary,
        )
        .await
        {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(item_id = %id, error = %e, "could not store media, retry next run");
                summary.skipped += 1;
                continue;
            }
        };
        let media = supersede_representative(accepted, &mut summary);

        if media.is_empty() {
            debug!(item_id = %id, "no accepted media, record stays detected");
            // Keep the first body we saw; later page text may rotate.
            if item.article_body.is_none() && body.is_some() {
                item.article_body = body;
                dirty = true;
            }
            summary.skipped += 1;
            continue;
        }

        if let Err(e) = item.acquire_media(media.clone()) {
            warn!(item_id = %id, error = %e, "could not promote record");
            remove_files(&media);
            summary.skipped += 1;
            continue;
        }
        if body.is_some() {
            item.article_body = body;
        }
        info!(item_id = %id, media = media.len(), "media acquired");
        summary.promoted += 1;
        dirty = true;
    }

    if dirty {
        ctx.store.save(&mut records)?;
    }

    ctx.progress.finished("Enriching");
    info!(%summary, "enrichment complete");
    Ok(summary)
}

/// Parse the page and collect body text plus ranked candidates.
fn harvest_page(
    html: &str,
    page_url: &Url,
    item: &WorkItem,
    settings: &EnrichmentConfig,
) -> PageHarvest {
    let doc = Html::parse_document(html);
    let body = extract_body_text(&doc, settings.min_body_chars);
    let mut candidates = collect_media_candidates(&doc, page_url, settings.max_content_images);

    if let Some(feed_image) = item
        .article_image_url
        .as_deref()
        .and_then(|src| resolve_media_url(page_url, src))
    {
        if !candidates.iter().any(|c| c.url == feed_image) {
            candidates.push(MediaCandidate {
                url: feed_image,
                kind: MediaKind::Feed,
            });
        }
    }

    PageHarvest { body, candidates }
}

/// Download, store, and judge each candidate in order.
///
/// A media write failure removes this record's accepted files and fails
/// the record, not the stage.
async fn judge_candidates<S: ReasoningService>(
    item: &WorkItem,
    candidates: &[MediaCandidate],
    media_dir: &Path,
    fetcher: &PageFetcher,
    classifier: &Classifier<S>,
    settings: &EnrichmentConfig,
    summary: &mut EnrichmentSummary,
) -> Result<Vec<AcceptedMedia>> {
    let mut accepted: Vec<AcceptedMedia> = Vec::new();

    for (n, candidate) in candidates.iter().enumerate() {
        let download = match fetcher.download(&candidate.url).await {
            Ok(d) => d,
            Err(e) => {
                debug!(url = %candidate.url, error = %e, "media download failed");
                continue;
            }
        };
        summary.media_downloaded += 1;

        if download.bytes.len() < settings.min_media_bytes {
            debug!(url = %candidate.url, bytes = download.bytes.len(), "media too small");
            summary.media_too_small += 1;
            continue;
        }

        let digest: [u8; 32] = Sha256::digest(&download.bytes).into();
        if accepted.iter().any(|m| m.digest == digest) {
            debug!(url = %candidate.url, "identical to accepted media");
            summary.media_duplicates += 1;
            continue;
        }

        let format = ImageFormat::detect(&download.bytes, download.content_type.as_deref());
        let path = media_path(media_dir, &item.id, n + 1, format);
        if let Err(e) = write_media(&path, &download.bytes) {
            let paths: Vec<PathBuf> = accepted.into_iter().map(|m| m.path).collect();
            remove_files(&paths);
            return Err(e);
        }

        let request = ReasoningRequest::with_image(
            media_prompt(&item.classification.subjects, &item.article_title),
            ImageAttachment {
                mime_type: format.mime_type().to_string(),
                bytes: download.bytes,
            },
        );
        let verdict: Option<MediaVerdict> = classifier.classify(&request).await;
        pause(settings.call_delay_ms).await;

        if verdict.is_some_and(|v| v.accept) {
            debug!(path = %path.display(), kind = ?candidate.kind, "media accepted");
            summary.media_accepted += 1;
            accepted.push(AcceptedMedia {
                path,
                kind: candidate.kind,
                digest,
            });
        } else {
            debug!(path = %path.display(), "media rejected");
            summary.media_rejected += 1;
            remove_files(std::slice::from_ref(&path));
        }
    }

    Ok(accepted)
}

/// When an in-content image was accepted, the representative image is
/// usually the same picture at another size: drop it and its file.
fn supersede_representative(
    accepted: Vec<AcceptedMedia>,
    summary: &mut EnrichmentSummary,
) -> Vec<PathBuf> {
    let has_content = accepted.iter().any(|m| m.kind == MediaKind::Content);
    let mut kept = Vec::with_capacity(accepted.len());
    for media in accepted {
        if has_content && media.kind == MediaKind::Representative {
            summary.media_superseded += 1;
            remove_files(std::slice::from_ref(&media.path));
        } else {
            kept.push(media.path);
        }
    }
    kept
}

fn media_path(media_dir: &Path, id: &ItemId, n: usize, format: ImageFormat) -> PathBuf {
    media_dir.join(format!("{id}_{n}.{}", format.extension()))
}

fn write_media(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| NewsRelayError::io(parent, e))?;
    }
    std::fs::write(path, bytes).map_err(|e| NewsRelayError::io(path, e))
}

fn remove_files(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = std::fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "could not remove media file");
        }
    }
}
