//! What every stage needs: configuration, the store, and a progress sink.

use std::time::Duration;

use newsrelay_shared::AppConfig;
use newsrelay_storage::RecordStore;

use crate::progress::StageProgress;

/// Shared inputs of a stage run.
pub struct StageContext<'a> {
    pub config: &'a AppConfig,
    pub store: &'a RecordStore,
    pub progress: &'a dyn StageProgress,
}

impl<'a> StageContext<'a> {
    pub fn new(
        config: &'a AppConfig,
        store: &'a RecordStore,
        progress: &'a dyn StageProgress,
    ) -> Self {
        Self {
            config,
            store,
            progress,
        }
    }
}

/// Sleep between external calls. No-op for zero.
pub(crate) async fn pause(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}
