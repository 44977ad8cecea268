//! Record state machine.
//!
//! `Detected -> MediaAcquired -> ContentComposed -> Published`. These three
//! methods are the only way a [`WorkItem`] changes state. A refused
//! transition returns [`NewsRelayError::Transition`] and leaves the item
//! untouched.

use std::path::PathBuf;

use crate::error::{NewsRelayError, Result};
use crate::types::{ComposedCopy, LifecycleState, PublicationRecord, WorkItem};

impl WorkItem {
    /// Attach accepted media and move to `MediaAcquired`.
    pub fn acquire_media(&mut self, media: Vec<PathBuf>) -> Result<()> {
        self.check_advance(LifecycleState::MediaAcquired)?;
        if media.is_empty() {
            return Err(self.refuse(LifecycleState::MediaAcquired, "no accepted media"));
        }
        self.media_refs = media;
        self.lifecycle_state = LifecycleState::MediaAcquired;
        Ok(())
    }

    /// Store generated copy and move to `ContentComposed`.
    pub fn compose(&mut self, copy: ComposedCopy) -> Result<()> {
        self.check_advance(LifecycleState::ContentComposed)?;
        if self.media_refs.is_empty() {
            return Err(self.refuse(LifecycleState::ContentComposed, "record has no media"));
        }
        if copy.is_empty() {
            return Err(self.refuse(LifecycleState::ContentComposed, "composed copy is empty"));
        }
        self.composed_copy = Some(copy);
        self.lifecycle_state = LifecycleState::ContentComposed;
        Ok(())
    }

    /// Stamp a successful, operator-approved post and move to `Published`.
    pub fn publish(&mut self, record: PublicationRecord) -> Result<()> {
        self.check_advance(LifecycleState::Published)?;
        if self.composed_copy.as_ref().is_none_or(ComposedCopy::is_empty) {
            return Err(self.refuse(LifecycleState::Published, "record has no composed copy"));
        }
        if record.post_id.trim().is_empty() {
            return Err(self.refuse(LifecycleState::Published, "empty post id"));
        }
        self.publication_record = Some(record);
        self.operator_approved = true;
        self.lifecycle_state = LifecycleState::Published;
        Ok(())
    }

    fn check_advance(&self, target: LifecycleState) -> Result<()> {
        if self.lifecycle_state.successor() == Some(target) {
            return Ok(());
        }
        let reason = if self.lifecycle_state.rank() >= target.rank() {
            "record is already past this state"
        } else {
            "transition skips a state"
        };
        Err(self.refuse(target, reason))
    }

    fn refuse(&self, to: LifecycleState, reason: &str) -> NewsRelayError {
        NewsRelayError::Transition {
            from: self.lifecycle_state,
            to,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::types::Classification;

    fn item() -> WorkItem {
        WorkItem::detected(
            "feed",
            "https://example.com/a",
            "Title",
            Classification {
                subjects: vec!["Alice".into()],
                topic: "topic".into(),
            },
        )
    }

    fn copy() -> ComposedCopy {
        ComposedCopy {
            title: "Headline".into(),
            short_text: "Short text".into(),
        }
    }

    fn post() -> PublicationRecord {
        PublicationRecord {
            post_id: "123".into(),
            published_at: Utc::now(),
            artifact_url: "https://site.example/x.html".into(),
        }
    }

    #[test]
    fn full_forward_path() {
        let mut item = item();
        item.acquire_media(vec!["media/a.jpg".into()]).unwrap();
        assert_eq!(item.state(), LifecycleState::MediaAcquired);
        item.compose(copy()).unwrap();
        assert_eq!(item.state(), LifecycleState::ContentComposed);
        item.publish(post()).unwrap();
        assert_eq!(item.state(), LifecycleState::Published);
        assert!(item.operator_approved());
        assert_eq!(item.publication_record().unwrap().post_id, "123");
    }

    #[test]
    fn skipping_a_state_is_refused() {
        let mut item = item();
        let err = item.compose(copy()).unwrap_err();
        assert!(matches!(err, NewsRelayError::Transition { .. }));
        assert_eq!(item.state(), LifecycleState::Detected);
        assert!(item.composed_copy().is_none());

        assert!(item.publish(post()).is_err());
        assert_eq!(item.state(), LifecycleState::Detected);
    }

    #[test]
    fn regression_is_refused() {
        let mut item = item();
        item.acquire_media(vec!["media/a.jpg".into()]).unwrap();
        let err = item.acquire_media(vec!["media/b.jpg".into()]).unwrap_err();
        assert!(err.to_string().contains("already past"));
        assert_eq!(item.media_refs(), &[PathBuf::from("media/a.jpg")]);
    }

    #[test]
    fn empty_media_is_refused() {
        let mut item = item();
        assert!(item.acquire_media(Vec::new()).is_err());
        assert_eq!(item.state(), LifecycleState::Detected);
    }

    #[test]
    fn empty_copy_is_refused() {
        let mut item = item();
        item.acquire_media(vec!["media/a.jpg".into()]).unwrap();
        let empty = ComposedCopy {
            title: " ".into(),
            short_text: String::new(),
        };
        assert!(item.compose(empty).is_err());
        assert_eq!(item.state(), LifecycleState::MediaAcquired);
    }

    #[test]
    fn copy_without_short_text_is_refused() {
        let mut item = item();
        item.acquire_media(vec!["media/a.jpg".into()]).unwrap();
        let title_only = ComposedCopy {
            title: "Headline".into(),
            short_text: "  ".into(),
        };
        assert!(item.compose(title_only).is_err());
        assert_eq!(item.state(), LifecycleState::MediaAcquired);
        assert!(item.composed_copy().is_none());
    }

    #[test]
    fn publish_requires_post_id() {
        let mut item = item();
        item.acquire_media(vec!["media/a.jpg".into()]).unwrap();
        item.compose(copy()).unwrap();
        let mut record = post();
        record.post_id = String::new();
        assert!(item.publish(record).is_err());
        assert!(!item.operator_approved());
        assert!(item.publication_record().is_none());
    }
}
