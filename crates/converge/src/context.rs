//! Progress reporting hooks
//!
//! The engine never prints. Callers that want live output implement
//! [`ProgressCallback`]; everyone else passes [`NoProgress`].

use crate::report::RunSummary;
use crate::types::CapabilityResult;

/// Progress callback for reconciliation runs
pub trait ProgressCallback {
    /// Called once before the first capability
    fn on_run_start(&mut self, total: usize, dry_run: bool);

    /// Called when a planned capability leaves `Pending`
    ///
    /// `index` is zero-based. `description` is empty when the name is not
    /// registered.
    fn on_capability_start(&mut self, index: usize, total: usize, name: &str, description: &str);

    /// Called with the terminal result of each planned capability
    fn on_capability_complete(&mut self, result: &CapabilityResult);

    /// Called once after the last result
    fn on_run_complete(&mut self, summary: &RunSummary);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_run_start(&mut self, _total: usize, _dry_run: bool) {}
    fn on_capability_start(&mut self, _index: usize, _total: usize, _name: &str, _description: &str) {}
    fn on_capability_complete(&mut self, _result: &CapabilityResult) {}
    fn on_run_complete(&mut self, _summary: &RunSummary) {}
}

/// Progress callback that records every event, for tests and tooling
#[derive(Debug, Default)]
pub struct RecordingProgress {
    pub started: Vec<String>,
    pub completed: Vec<CapabilityResult>,
    pub summary: Option<RunSummary>,
}

impl ProgressCallback for RecordingProgress {
    fn on_run_start(&mut self, _total: usize, _dry_run: bool) {
        self.started.clear();
        self.completed.clear();
        self.summary = None;
    }

    fn on_capability_start(&mut self, _index: usize, _total: usize, name: &str, _description: &str) {
        self.started.push(name.to_string());
    }

    fn on_capability_complete(&mut self, result: &CapabilityResult) {
        self.completed.push(result.clone());
    }

    fn on_run_complete(&mut self, summary: &RunSummary) {
        self.summary = Some(*summary);
    }
}
