//! JSON file record store.
//!
//! The [`RecordStore`] holds every [`WorkItem`] in one file that is read and
//! rewritten in full by each stage run. On disk:
//!
//! ```json
//! { "revision": 7, "items": [ ... ] }
//! ```
//!
//! A bare JSON array is accepted on load as revision 0.
//!
//! **Access rules:** one writer at a time. [`RecordStore::save`] compares the
//! on-disk revision with the revision the caller loaded and refuses to write
//! on mismatch, so an overlapping run fails loudly instead of silently
//! overwriting another run's work.

use std::path::{Path, PathBuf};

use newsrelay_shared::{ItemId, LifecycleState, NewsRelayError, Result, WorkItem};
use serde::{Deserialize, Serialize};

/// Handle to the record store file.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

/// The in-memory contents of the store, tagged with the revision it was
/// loaded at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Records {
    revision: u64,
    items: Vec<WorkItem>,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    revision: u64,
    items: &'a [WorkItem],
}

#[derive(Deserialize)]
struct Envelope {
    revision: u64,
    items: Vec<WorkItem>,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all records. A missing file yields an empty set at revision 0.
    /// A malformed file is a fatal error.
    pub fn load(&self) -> Result<Records> {
        if !self.path.exists() {
            tracing::debug!(path = ?self.path, "record store not found, starting empty");
            return Ok(Records::default());
        }

        let bytes = std::fs::read(&self.path).map_err(|e| NewsRelayError::io(&self.path, e))?;
        let records = decode(&bytes).map_err(|e| {
            NewsRelayError::Store(format!("{} is malformed: {e}", self.path.display()))
        })?;

        tracing::debug!(
            path = ?self.path,
            revision = records.revision,
            items = records.items.len(),
            "loaded record store"
        );
        Ok(records)
    }

    /// Overwrite the store with `records`.
    ///
    /// Fails with [`NewsRelayError::StoreConflict`] if the file changed since
    /// `records` was loaded. On success the revision is bumped in place.
    pub fn save(&self, records: &mut Records) -> Result<()> {
        let on_disk = self.current_revision()?;
        if on_disk != records.revision {
            return Err(NewsRelayError::StoreConflict {
                expected: records.revision,
                found: on_disk,
            });
        }

        let next = records.revision + 1;
        let json = serde_json::to_string_pretty(&EnvelopeRef {
            revision: next,
            items: &records.items,
        })
        .map_err(|e| NewsRelayError::Store(format!("failed to serialize records: {e}")))?;

        self.write_atomic(json.as_bytes())?;
        records.revision = next;

        tracing::debug!(path = ?self.path, revision = next, "saved record store");
        Ok(())
    }

    fn current_revision(&self) -> Result<u64> {
        if !self.path.exists() {
            return Ok(0);
        }
        let bytes = std::fs::read(&self.path).map_err(|e| NewsRelayError::io(&self.path, e))?;
        decode(&bytes).map(|r| r.revision).map_err(|e| {
            NewsRelayError::Store(format!("{} is malformed: {e}", self.path.display()))
        })
    }

    /// Write to `.<file>.tmp` next to the target, then rename over it.
    fn write_atomic(&self, bytes: &[u8]) -> Result<()> {
        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        std::fs::create_dir_all(parent).map_err(|e| NewsRelayError::io(parent, e))?;

        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| NewsRelayError::validation("record store path has no file name"))?;
        let temp = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));

        std::fs::write(&temp, bytes).map_err(|e| NewsRelayError::io(&temp, e))?;
        std::fs::rename(&temp, &self.path).map_err(|e| NewsRelayError::io(&self.path, e))?;
        Ok(())
    }
}

fn decode(bytes: &[u8]) -> std::result::Result<Records, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_slice(bytes)?;
    if value.is_array() {
        let items: Vec<WorkItem> = serde_json::from_value(value)?;
        return Ok(Records { revision: 0, items });
    }
    let envelope: Envelope = serde_json::from_value(value)?;
    Ok(Records {
        revision: envelope.revision,
        items: envelope.items,
    })
}

impl Records {
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether any record already uses this source identifier.
    pub fn contains_source(&self, source_identifier: &str) -> bool {
        self.items
            .iter()
            .any(|item| item.source_identifier == source_identifier)
    }

    /// Append a new record. Refuses a duplicate source identifier.
    pub fn insert(&mut self, item: WorkItem) -> Result<()> {
        if self.contains_source(&item.source_identifier) {
            return Err(NewsRelayError::validation(format!(
                "source {} is already tracked",
                item.source_identifier
            )));
        }
        self.items.push(item);
        Ok(())
    }

    pub fn get(&self, id: ItemId) -> Option<&WorkItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut WorkItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }

    /// Ids of records currently in `state`, in store order.
    pub fn ids_in_state(&self, state: LifecycleState) -> Vec<ItemId> {
        self.items
            .iter()
            .filter(|item| item.state() == state)
            .map(|item| item.id)
            .collect()
    }

    pub fn count_in_state(&self, state: LifecycleState) -> usize {
        self.items.iter().filter(|item| item.state() == state).count()
    }
}
