//! Human-readable formatting helpers

use std::time::Duration;

/// Format a duration compactly: `850ms`, `1.5s`, `2m 05s`
pub fn human_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1_000 {
        format!("{millis}ms")
    } else if millis < 60_000 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        let secs = duration.as_secs();
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}

/// `1 capability`, `3 capabilities`
pub fn pluralize(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{count} {singular}")
    } else {
        format!("{count} {plural}")
    }
}

/// Truncate text to `max_len` characters, ending with `...` when cut
pub fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() <= max_len {
        text.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let kept: String = text.chars().take(max_len - 3).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_duration_millis() {
        assert_eq!(human_duration(Duration::from_millis(0)), "0ms");
        assert_eq!(human_duration(Duration::from_millis(850)), "850ms");
    }

    #[test]
    fn test_human_duration_seconds() {
        assert_eq!(human_duration(Duration::from_millis(1_500)), "1.5s");
        assert_eq!(human_duration(Duration::from_secs(59)), "59.0s");
    }

    #[test]
    fn test_human_duration_minutes() {
        assert_eq!(human_duration(Duration::from_secs(125)), "2m 05s");
    }

    #[test]
    fn test_pluralize() {
        assert_eq!(pluralize(1, "capability", "capabilities"), "1 capability");
        assert_eq!(pluralize(0, "capability", "capabilities"), "0 capabilities");
        assert_eq!(pluralize(4, "rule", "rules"), "4 rules");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("this is far too long", 10), "this is...");
        assert_eq!(truncate("abc", 2), "...");
    }
}
