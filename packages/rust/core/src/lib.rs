//! Stage processors and orchestration for newsrelay.
//!
//! Each stage loads the record store, advances the records it is
//! responsible for, and saves only when something changed:
//! - [`discover`]: feeds → `Detected`
//! - [`enrich`]: `Detected` → `MediaAcquired`
//! - [`compose`]: `MediaAcquired` → `ContentComposed`
//! - [`publish`]: `ContentComposed` → `Published`, operator-approved
//!
//! [`run`] chains the automatic stages and renders the site.

pub mod approval;
pub mod composition;
pub mod context;
pub mod discover;
pub mod enrichment;
pub mod pipeline;
pub mod progress;
pub mod publication;
pub mod render;
pub mod report;
pub mod status;

#[cfg(test)]
pub(crate) mod testing;

pub use approval::{
    ApprovalRequest, Approver, AutoApprove, Decision, InteractiveApprover, PolicyApprover,
};
pub use composition::compose;
pub use context::StageContext;
pub use discover::discover;
pub use enrichment::enrich;
pub use pipeline::{RunSummary, run};
pub use progress::{SilentProgress, StageProgress};
pub use publication::{PublishOptions, publish};
pub use render::render;
pub use report::{CompositionSummary, DiscoverySummary, EnrichmentSummary, PublicationSummary};
pub use status::{StoreStatus, store_status};
