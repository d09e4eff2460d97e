//! Spinners and multi-stage progress
//!
//! Progress output goes to stderr and is hidden when stderr is not a
//! terminal, so piped output stays clean.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::layout::step_label;

const TICK: Duration = Duration::from_millis(80);

/// Whether animated progress should be drawn
fn is_interactive() -> bool {
    console::Term::stderr().is_term()
}

/// Start a spinner with a message
fn spinner(msg: &str) -> ProgressBar {
    if !is_interactive() {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(TICK);
    pb
}

/// Tracks progress through a fixed number of named stages
///
/// Each stage shows a `[n/total]` spinner while it runs and is replaced
/// by a single result line when it finishes.
pub struct StageProgress {
    total: usize,
    current: usize,
    bar: Option<ProgressBar>,
}

impl StageProgress {
    /// Create a tracker for `total` stages
    pub fn new(total: usize) -> Self {
        Self {
            total,
            current: 0,
            bar: None,
        }
    }

    /// Begin the next stage
    pub fn start(&mut self, name: &str) {
        self.clear();
        self.current += 1;
        let label = step_label(self.current, self.total);
        self.bar = Some(spinner(&format!("{} {}", label.blue().bold(), name)));
    }

    /// Finish the current stage with a pre-rendered status line
    pub fn finish(&mut self, line: &str) {
        self.clear();
        println!(
            "{} {}",
            step_label(self.current, self.total).blue().bold(),
            line
        );
    }

    /// Stages started so far
    pub fn current(&self) -> usize {
        self.current
    }

    /// Total number of stages
    pub fn total(&self) -> usize {
        self.total
    }

    fn clear(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl Drop for StageProgress {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_progress_counts() {
        let mut stages = StageProgress::new(3);
        assert_eq!(stages.current(), 0);
        stages.start("hostname");
        stages.finish("hostname applied");
        stages.start("ssh");
        assert_eq!(stages.current(), 2);
        assert_eq!(stages.total(), 3);
    }

    #[test]
    fn test_spinner_follows_terminal() {
        let pb = spinner("probing");
        assert_eq!(pb.is_hidden(), !is_interactive());
        pb.finish_and_clear();
    }
}
