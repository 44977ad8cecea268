//! Per-run summaries printed after each stage.

use std::fmt;

use newsrelay_shared::ItemId;

/// Outcome of a discovery run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoverySummary {
    pub feeds_polled: usize,
    /// Feeds that could not be fetched or parsed.
    pub feeds_failed: usize,
    pub entries_seen: usize,
    /// Entries whose link is already tracked.
    pub duplicates: usize,
    /// New `Detected` records.
    pub discovered: usize,
    /// Entries judged irrelevant or naming no subject.
    pub rejected: usize,
    /// Entries the classifier gave no verdict for; retried next run.
    pub unclassified: usize,
}

/// Outcome of an enrichment run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrichmentSummary {
    pub examined: usize,
    /// Records moved to `MediaAcquired`.
    pub promoted: usize,
    /// Records left at `Detected`.
    pub skipped: usize,
    pub pages_failed: usize,
    pub media_downloaded: usize,
    pub media_too_small: usize,
    pub media_duplicates: usize,
    pub media_accepted: usize,
    pub media_rejected: usize,
    /// Representative images dropped in favour of in-content images.
    pub media_superseded: usize,
}

/// Outcome of a composition run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompositionSummary {
    pub examined: usize,
    /// Records moved to `ContentComposed`.
    pub promoted: usize,
    pub skipped: usize,
    /// Short texts cut down to the character budget.
    pub truncated: usize,
}

/// Outcome of a publication run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicationSummary {
    pub examined: usize,
    pub published: usize,
    /// Records the approver declined.
    pub skipped: usize,
    /// Posting API failures, by record.
    pub failed: Vec<(ItemId, String)>,
    /// The operator stopped the run early.
    pub aborted: bool,
    /// Messages that would have been posted, in dry-run mode.
    pub previews: Vec<(ItemId, String)>,
}

impl fmt::Display for DiscoverySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "feeds {} ({} failed), entries {}: {} discovered, {} already tracked, {} rejected, {} unclassified",
            self.feeds_polled,
            self.feeds_failed,
            self.entries_seen,
            self.discovered,
            self.duplicates,
            self.rejected,
            self.unclassified
        )
    }
}

impl fmt::Display for EnrichmentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "examined {}: {} promoted, {} skipped ({} pages failed); media {} downloaded, {} accepted, {} rejected, {} too small, {} duplicate, {} superseded",
            self.examined,
            self.promoted,
            self.skipped,
            self.pages_failed,
            self.media_downloaded,
            self.media_accepted,
            self.media_rejected,
            self.media_too_small,
            self.media_duplicates,
            self.media_superseded
        )
    }
}

impl fmt::Display for CompositionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "examined {}: {} promoted, {} skipped, {} truncated",
            self.examined, self.promoted, self.skipped, self.truncated
        )
    }
}

impl fmt::Display for PublicationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "examined {}: {} published, {} skipped, {} failed",
            self.examined,
            self.published,
            self.skipped,
            self.failed.len()
        )?;
        if self.aborted {
            f.write_str(" (stopped by operator)")?;
        }
        Ok(())
    }
}
