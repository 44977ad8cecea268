//! Core domain types: the work item record and its lifecycle state.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// ItemId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for record identifiers (time-sortable, so ids are
/// monotonic by discovery time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub Uuid);

impl ItemId {
    /// Generate a new time-sortable record identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ItemId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// LifecycleState
// ---------------------------------------------------------------------------

/// Stage-completion marker of a record. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Detected,
    MediaAcquired,
    ContentComposed,
    Published,
}

impl LifecycleState {
    /// All states in lifecycle order.
    pub const ALL: [LifecycleState; 4] = [
        LifecycleState::Detected,
        LifecycleState::MediaAcquired,
        LifecycleState::ContentComposed,
        LifecycleState::Published,
    ];

    /// Position in the lifecycle, starting at 0.
    pub fn rank(self) -> u8 {
        match self {
            Self::Detected => 0,
            Self::MediaAcquired => 1,
            Self::ContentComposed => 2,
            Self::Published => 3,
        }
    }

    /// The only state this one may advance to. `None` for the terminal state.
    pub fn successor(self) -> Option<Self> {
        match self {
            Self::Detected => Some(Self::MediaAcquired),
            Self::MediaAcquired => Some(Self::ContentComposed),
            Self::ContentComposed => Some(Self::Published),
            Self::Published => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.successor().is_none()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Detected => "detected",
            Self::MediaAcquired => "media_acquired",
            Self::ContentComposed => "content_composed",
            Self::Published => "published",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Record payloads
// ---------------------------------------------------------------------------

/// Relevance verdict payload, set once at discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Named people or entities the article is about.
    pub subjects: Vec<String>,
    /// Short topic label.
    pub topic: String,
}

/// Generated presentation copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedCopy {
    pub title: String,
    pub short_text: String,
}

impl ComposedCopy {
    /// True when either field is blank.
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty() || self.short_text.trim().is_empty()
    }
}

/// Outcome of a successful post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationRecord {
    /// Identifier assigned by the posting API.
    pub post_id: String,
    pub published_at: DateTime<Utc>,
    /// Public URL of the rendered page the post links to.
    pub artifact_url: String,
}

// ---------------------------------------------------------------------------
// WorkItem
// ---------------------------------------------------------------------------

/// One discovered source article tracked through the pipeline.
///
/// Fields that belong to a later state are only written by the transition
/// methods in [`crate::lifecycle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: ItemId,
    pub discovered_at: DateTime<Utc>,
    /// Name of the feed the entry came from.
    pub source_name: String,
    /// Entry link; the deduplication key.
    pub source_identifier: String,
    pub article_title: String,
    #[serde(default)]
    pub article_summary: String,
    /// First `<img src>` found in the feed entry body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_image_url: Option<String>,
    /// Page text captured during enrichment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article_body: Option<String>,
    pub(crate) lifecycle_state: LifecycleState,
    pub classification: Classification,
    #[serde(default)]
    pub(crate) media_refs: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) composed_copy: Option<ComposedCopy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) publication_record: Option<PublicationRecord>,
    #[serde(default)]
    pub(crate) operator_approved: bool,
}

impl WorkItem {
    /// Create a freshly discovered record in the `Detected` state.
    pub fn detected(
        source_name: impl Into<String>,
        source_identifier: impl Into<String>,
        article_title: impl Into<String>,
        classification: Classification,
    ) -> Self {
        Self {
            id: ItemId::new(),
            discovered_at: Utc::now(),
            source_name: source_name.into(),
            source_identifier: source_identifier.into(),
            article_title: article_title.into(),
            article_summary: String::new(),
            article_image_url: None,
            article_body: None,
            lifecycle_state: LifecycleState::Detected,
            classification,
            media_refs: Vec::new(),
            composed_copy: None,
            publication_record: None,
            operator_approved: false,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle_state
    }

    /// Local media paths; the first one is the primary artifact.
    pub fn media_refs(&self) -> &[PathBuf] {
        &self.media_refs
    }

    pub fn primary_media(&self) -> Option<&PathBuf> {
        self.media_refs.first()
    }

    pub fn composed_copy(&self) -> Option<&ComposedCopy> {
        self.composed_copy.as_ref()
    }

    pub fn publication_record(&self) -> Option<&PublicationRecord> {
        self.publication_record.as_ref()
    }

    pub fn operator_approved(&self) -> bool {
        self.operator_approved
    }

    /// Best text available for prompts: the page body, else the feed summary.
    pub fn best_text(&self) -> &str {
        match self.article_body.as_deref() {
            Some(body) if !body.trim().is_empty() => body,
            _ => &self.article_summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_id_display_and_parse() {
        let id = ItemId::new();
        let s = id.to_string();
        let parsed: ItemId = s.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn item_ids_are_time_ordered() {
        let a = ItemId::new();
        let b = ItemId::new();
        assert!(a < b);
    }

    #[test]
    fn lifecycle_order_is_total() {
        for pair in LifecycleState::ALL.windows(2) {
            assert_eq!(pair[0].successor(), Some(pair[1]));
            assert_eq!(pair[0].rank() + 1, pair[1].rank());
        }
        assert!(LifecycleState::Published.is_terminal());
    }

    #[test]
    fn lifecycle_state_serializes_snake_case() {
        let json = serde_json::to_string(&LifecycleState::MediaAcquired).unwrap();
        assert_eq!(json, "\"media_acquired\"");
        let back: LifecycleState = serde_json::from_str("\"content_composed\"").unwrap();
        assert_eq!(back, LifecycleState::ContentComposed);
    }

    #[test]
    fn work_item_json_omits_empty_optionals() {
        let item = WorkItem::detected(
            "feed",
            "https://example.com/a",
            "Title",
            Classification {
                subjects: vec!["Alice".into()],
                topic: "news".into(),
            },
        );
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"lifecycle_state\":\"detected\""));
        assert!(!json.contains("composed_copy"));
        assert!(!json.contains("publication_record"));

        let back: WorkItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, item);
    }

    #[test]
    fn best_text_prefers_body() {
        let mut item = WorkItem::detected("f", "u", "t", Classification::default());
        item.article_summary = "summary".into();
        assert_eq!(item.best_text(), "summary");
        item.article_body = Some("full body".into());
        assert_eq!(item.best_text(), "full body");
    }
}
