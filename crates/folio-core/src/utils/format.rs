use chrono::{DateTime, Utc};

/// Case-insensitive substring check. An empty needle matches everything.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Truncate a string to a maximum number of characters, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format a timestamp for display, e.g. "Mar 04, 2025"
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%b %d, %Y").to_string()
}

/// Format an optional string, returning a default if None or blank
pub fn format_optional(value: Option<&str>, default: &str) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Golang", "go"));
        assert!(contains_ignore_case("rust", "RUST"));
        assert!(contains_ignore_case("anything", ""));
        assert!(!contains_ignore_case("ts", "go"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello World", 8), "Hello...");
        assert_eq!(truncate("Hi", 2), "Hi");
        // Multi-byte characters are counted, not sliced
        assert_eq!(truncate("ñandú ñandú", 6), "ñan...");
    }

    #[test]
    fn test_format_date() {
        let date = Utc.with_ymd_and_hms(2025, 3, 4, 12, 0, 0).unwrap();
        assert_eq!(format_date(&date), "Mar 04, 2025");
    }

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(Some("x"), "-"), "x");
        assert_eq!(format_optional(Some("  "), "-"), "-");
        assert_eq!(format_optional(None, "-"), "-");
    }
}
