//! Desired-state comparison for rendered artifacts
//!
//! Capabilities that manage a text artifact (a config file, a rule list)
//! decide "already satisfied" by rendering what they would write and
//! comparing it with what is on the system. Comparison is done on a
//! normalized form so that comment and whitespace drift does not trigger a
//! re-apply, while any change to an actual setting does.
//!
//! Normalization, per line:
//! - blank lines are dropped
//! - full-line comments (`#` as the first non-blank character) are dropped
//! - trailing comments (`#` preceded by whitespace) are cut
//! - runs of whitespace collapse to a single space
//! - leading and trailing whitespace is trimmed
//!
//! Everything here is pure; reading the observed artifact is the caller's job.

use serde::{Deserialize, Serialize};
use similar::{ChangeTag, TextDiff};

/// Outcome of comparing an expected artifact with the observed one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    /// The observed artifact does not exist
    Missing,
    /// Normalized forms are identical
    Satisfied,
    /// Normalized forms differ; `diff` shows observed (-) vs expected (+)
    Drifted { diff: String },
}

impl Comparison {
    /// Check whether no apply is needed
    pub fn is_satisfied(&self) -> bool {
        matches!(self, Self::Satisfied)
    }
}

/// Normalize artifact text into comparable lines
pub fn normalize(text: &str) -> Vec<String> {
    text.lines().filter_map(normalize_line).collect()
}

fn normalize_line(line: &str) -> Option<String> {
    let content = strip_comment(line);
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Cut a full-line or trailing comment
///
/// A `#` only starts a comment at the beginning of the (trimmed) line or
/// after whitespace, so values such as `color=#fff` survive.
fn strip_comment(line: &str) -> &str {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        return "";
    }

    let mut previous_is_space = false;
    for (index, ch) in trimmed.char_indices() {
        if ch == '#' && previous_is_space {
            return &trimmed[..index];
        }
        previous_is_space = ch.is_whitespace();
    }
    trimmed
}

/// Compare a rendered expected artifact against the observed one
///
/// `observed` is `None` when the artifact does not exist on the system.
pub fn compare(expected: &str, observed: Option<&str>) -> Comparison {
    let Some(observed) = observed else {
        return Comparison::Missing;
    };

    let expected = normalize(expected);
    let observed = normalize(observed);

    if expected == observed {
        Comparison::Satisfied
    } else {
        Comparison::Drifted {
            diff: line_diff(&observed, &expected),
        }
    }
}

/// Shorthand for `compare(expected, observed).is_satisfied()`
pub fn is_satisfied(expected: &str, observed: Option<&str>) -> bool {
    compare(expected, observed).is_satisfied()
}

fn line_diff(observed: &[String], expected: &[String]) -> String {
    let old = join_lines(observed);
    let new = join_lines(expected);
    let diff = TextDiff::from_lines(&old, &new);

    let mut out = String::new();
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => '-',
            ChangeTag::Insert => '+',
            ChangeTag::Equal => continue,
        };
        out.push(sign);
        out.push(' ');
        out.push_str(change.value().trim_end_matches('\n'));
        out.push('\n');
    }
    out
}

fn join_lines(lines: &[String]) -> String {
    let mut joined = lines.join("\n");
    if !joined.is_empty() {
        joined.push('\n');
    }
    joined
}
