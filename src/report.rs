//! Rendering of run results
//!
//! Human output draws one line per capability through termkit; JSON output
//! is a single document written once the plan has been walked.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use converge::{CapabilityResult, CapabilityStatus, ProgressCallback, RunResult, RunSummary};
use serde::Serialize;
use termkit::StageProgress;

/// Symbol shown before a capability's status
pub fn symbol(status: CapabilityStatus) -> &'static str {
    match status {
        CapabilityStatus::Applied => "✓",
        CapabilityStatus::Skipped => "=",
        CapabilityStatus::WouldApply => "~",
        CapabilityStatus::Failed | CapabilityStatus::Errored => "✗",
        CapabilityStatus::NotRun => "-",
    }
}

fn colored_symbol(status: CapabilityStatus) -> String {
    let symbol = symbol(status);
    match status {
        CapabilityStatus::Applied => symbol.green().to_string(),
        CapabilityStatus::Skipped | CapabilityStatus::NotRun => symbol.dimmed().to_string(),
        CapabilityStatus::WouldApply => symbol.yellow().to_string(),
        CapabilityStatus::Failed | CapabilityStatus::Errored => symbol.red().to_string(),
    }
}

/// One finished capability, e.g. `✓ ssh applied (1.2s)`
pub fn status_line(result: &CapabilityResult) -> String {
    let mut line = format!(
        "{} {} {}",
        colored_symbol(result.status),
        result.name.bold(),
        result.status.label()
    );
    if let Some(duration) = result.duration {
        line.push_str(&format!(" ({})", termkit::human_duration(duration)).dimmed().to_string());
    }
    if let Some(error) = &result.error {
        line.push_str(&format!(": {}", error.red()));
    }
    if let Some(reason) = &result.reason {
        line.push_str(&format!(": {}", reason.dimmed()));
    }
    line
}

/// Draws a stage line per capability on the terminal
#[derive(Default)]
pub struct TerminalProgress {
    stages: Option<StageProgress>,
}

impl TerminalProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_run_start(&mut self, total: usize, dry_run: bool) {
        if dry_run {
            termkit::info("Dry run: nothing will be changed");
        }
        self.stages = Some(StageProgress::new(total));
    }

    fn on_capability_start(&mut self, _index: usize, _total: usize, name: &str, description: &str) {
        if let Some(stages) = &mut self.stages {
            stages.start(&format!("{name} {}", description.dimmed()));
        }
    }

    fn on_capability_complete(&mut self, result: &CapabilityResult) {
        if let Some(stages) = &mut self.stages {
            stages.finish(&status_line(result));
        }
    }

    fn on_run_complete(&mut self, _summary: &RunSummary) {
        self.stages = None;
    }
}

/// Summary counts, e.g. `2 applied, 3 skipped, 1 failed`
pub fn summary_line(summary: &RunSummary) -> String {
    let parts: Vec<String> = [
        (summary.applied, CapabilityStatus::Applied),
        (summary.would_apply, CapabilityStatus::WouldApply),
        (summary.skipped, CapabilityStatus::Skipped),
        (summary.failed, CapabilityStatus::Failed),
        (summary.errored, CapabilityStatus::Errored),
        (summary.not_run, CapabilityStatus::NotRun),
    ]
    .into_iter()
    .filter(|(count, _)| *count > 0)
    .map(|(count, status)| format!("{count} {}", status.label()))
    .collect();

    if parts.is_empty() {
        "nothing to do".to_string()
    } else {
        parts.join(", ")
    }
}

/// Print the closing summary block
pub fn print_summary(result: &RunResult) {
    let summary = result.summary();
    println!();

    let line = summary_line(&summary);
    if !summary.is_success() {
        termkit::error(&line);
        for failure in result.failures() {
            termkit::dim(&format!(
                "{}: {}",
                failure.name,
                failure.error.as_deref().unwrap_or("unknown error")
            ));
        }
    } else if result.dry_run && summary.would_apply > 0 {
        let these = if summary.would_apply == 1 {
            "this change"
        } else {
            "these changes"
        };
        termkit::warn(&format!("{line} (run `serverkit apply` to make {these})"));
    } else {
        termkit::success(&line);
    }
}

/// Machine-readable run report
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub dry_run: bool,
    pub plan: &'a [String],
    pub results: &'a [CapabilityResult],
    pub summary: RunSummary,
    pub success: bool,
}

impl<'a> JsonReport<'a> {
    pub fn new(plan: &'a [String], result: &'a RunResult) -> Self {
        Self {
            generated_at: Utc::now(),
            dry_run: result.dry_run,
            plan,
            results: &result.results,
            summary: result.summary(),
            success: result.is_success(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize run report")
    }
}
