//! Progress callbacks for stage runs.

/// Progress callback for reporting stage status.
pub trait StageProgress: Send + Sync {
    /// Called when a stage starts.
    fn stage(&self, name: &str);
    /// Called before each record or feed entry is processed.
    fn item(&self, label: &str, current: usize, total: usize);
    /// Called when a stage finishes.
    fn finished(&self, name: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl StageProgress for SilentProgress {
    fn stage(&self, _name: &str) {}
    fn item(&self, _label: &str, _current: usize, _total: usize) {}
    fn finished(&self, _name: &str) {}
}
