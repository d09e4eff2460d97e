//! Result reporting - run outcome and per-status counts

use crate::error::Error;
use crate::types::{CapabilityResult, CapabilityStatus};
use serde::{Deserialize, Serialize};

/// Ordered results of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Whether the run was a dry run
    pub dry_run: bool,
    /// One result per planned capability, in plan order
    pub results: Vec<CapabilityResult>,
}

/// Aggregate an ordered result list into a run result
pub fn summarize(results: Vec<CapabilityResult>, dry_run: bool) -> RunResult {
    RunResult { dry_run, results }
}

impl RunResult {
    /// Per-status counts
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for result in &self.results {
            summary.add_result(result);
        }
        summary
    }

    /// True iff no capability ended Failed or Errored
    pub fn is_success(&self) -> bool {
        !self.results.iter().any(CapabilityResult::is_failure)
    }

    /// Results that count against the run
    pub fn failures(&self) -> impl Iterator<Item = &CapabilityResult> {
        self.results.iter().filter(|r| r.is_failure())
    }

    /// Find the result for a capability
    pub fn get(&self, name: &str) -> Option<&CapabilityResult> {
        self.results.iter().find(|r| r.name == name)
    }

    /// Statuses in plan order
    pub fn statuses(&self) -> Vec<CapabilityStatus> {
        self.results.iter().map(|r| r.status).collect()
    }

    /// The aggregate run error, if any capability did not succeed
    pub fn error(&self) -> Option<Error> {
        let failed = self.failures().count();
        if failed == 0 {
            None
        } else {
            Some(Error::RunFailed {
                failed,
                total: self.results.len(),
            })
        }
    }

    /// `Ok` when the run succeeded, the aggregate error otherwise
    pub fn check(&self) -> Result<(), Error> {
        match self.error() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Counts of each terminal status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub applied: usize,
    pub skipped: usize,
    pub would_apply: usize,
    pub failed: usize,
    pub errored: usize,
    pub not_run: usize,
}

impl RunSummary {
    /// Add a result to the summary
    pub fn add_result(&mut self, result: &CapabilityResult) {
        match result.status {
            CapabilityStatus::Applied => self.applied += 1,
            CapabilityStatus::Skipped => self.skipped += 1,
            CapabilityStatus::WouldApply => self.would_apply += 1,
            CapabilityStatus::Failed => self.failed += 1,
            CapabilityStatus::Errored => self.errored += 1,
            CapabilityStatus::NotRun => self.not_run += 1,
        }
    }

    /// Total number of results
    pub fn total(&self) -> usize {
        self.applied + self.skipped + self.would_apply + self.failed + self.errored + self.not_run
    }

    /// Number of Failed plus Errored results
    pub fn unsuccessful(&self) -> usize {
        self.failed + self.errored
    }

    /// Check if no capability failed or errored
    pub fn is_success(&self) -> bool {
        self.unsuccessful() == 0
    }

    /// Number of capabilities that changed or would change the system
    pub fn changes(&self) -> usize {
        self.applied + self.would_apply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn mixed() -> RunResult {
        let d = Duration::from_millis(1);
        summarize(
            vec![
                CapabilityResult::applied("hostname", d),
                CapabilityResult::skipped("packages", d),
                CapabilityResult::failed("ssh", "sshd -t failed", d),
                CapabilityResult::errored("missing", "capability 'missing' not found", None),
                CapabilityResult::not_run("firewall", "critical capability 'ssh' failed"),
            ],
            false,
        )
    }

    #[test]
    fn test_summary_counts() {
        let summary = mixed().summary();
        assert_eq!(summary.applied, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errored, 1);
        assert_eq!(summary.not_run, 1);
        assert_eq!(summary.would_apply, 0);
        assert_eq!(summary.total(), 5);
        assert_eq!(summary.unsuccessful(), 2);
        assert!(!summary.is_success());
    }

    #[test]
    fn test_error_counts_failed_and_errored() {
        let run = mixed();
        assert!(!run.is_success());
        assert_eq!(run.error(), Some(Error::RunFailed { failed: 2, total: 5 }));
        assert!(run.check().unwrap_err().to_string().contains('2'));
    }

    #[test]
    fn test_all_good_run_has_no_error() {
        let d = Duration::from_millis(1);
        let run = summarize(
            vec![
                CapabilityResult::skipped("a", d),
                CapabilityResult::would_apply("b", d),
            ],
            true,
        );
        assert!(run.is_success());
        assert!(run.check().is_ok());
        assert_eq!(run.summary().changes(), 1);
    }

    #[test]
    fn test_order_is_preserved() {
        let report = mixed();
        let names: Vec<&str> = report.results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["hostname", "packages", "ssh", "missing", "firewall"]);
    }

    #[test]
    fn test_lookup_by_name() {
        let run = mixed();
        assert_eq!(run.get("ssh").unwrap().status, CapabilityStatus::Failed);
        assert!(run.get("nope").is_none());
    }
}
