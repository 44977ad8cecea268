//! Store overview: records per lifecycle state.

use std::fmt;

use newsrelay_shared::{ItemId, LifecycleState, Result};
use newsrelay_storage::RecordStore;

/// One record waiting for a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRecord {
    pub id: ItemId,
    pub title: String,
}

/// Count and pending list for one state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateCount {
    pub state: LifecycleState,
    pub count: usize,
    /// Records in this state. Empty for the terminal state.
    pub pending: Vec<PendingRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatus {
    pub revision: u64,
    pub states: Vec<StateCount>,
}

impl StoreStatus {
    pub fn total(&self) -> usize {
        self.states.iter().map(|s| s.count).sum()
    }

    pub fn count(&self, state: LifecycleState) -> usize {
        self.states
            .iter()
            .find(|s| s.state == state)
            .map_or(0, |s| s.count)
    }
}

/// Read the store and group its records by state.
pub fn store_status(store: &RecordStore) -> Result<StoreStatus> {
    let records = store.load()?;

    let states = LifecycleState::ALL
        .into_iter()
        .map(|state| {
            let pending = if state.is_terminal() {
                Vec::new()
            } else {
                records
                    .items()
                    .iter()
                    .filter(|item| item.state() == state)
                    .map(|item| PendingRecord {
                        id: item.id,
                        title: item.article_title.clone(),
                    })
                    .collect()
            };
            StateCount {
                state,
                count: records.count_in_state(state),
                pending,
            }
        })
        .collect();

    Ok(StoreStatus {
        revision: records.revision(),
        states,
    })
}

/// Which command moves a record out of `state`.
fn next_command(state: LifecycleState) -> Option<&'static str> {
    match state {
        LifecycleState::Detected => Some("enrich"),
        LifecycleState::MediaAcquired => Some("compose"),
        LifecycleState::ContentComposed => Some("publish"),
        LifecycleState::Published => None,
    }
}

impl fmt::Display for StoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} records (revision {})", self.total(), self.revision)?;
        for s in &self.states {
            write!(f, "  {:<18} {:>5}", s.state, s.count)?;
            match next_command(s.state) {
                Some(cmd) if s.count > 0 => writeln!(f, "   next: newsrelay {cmd}")?,
                _ => writeln!(f)?,
            }
            for p in &s.pending {
                writeln!(f, "    {}  {}", p.id, p.title)?;
            }
        }
        Ok(())
    }
}
