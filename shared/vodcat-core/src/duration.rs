//! Duration strings to ISO-8601 (`PT#H#M`) for structured data

use regex::Regex;
use std::sync::LazyLock;

/// Emitted in place of a duration that has no parseable minutes
pub const UNKNOWN_DURATION: &str = "Unknown Duration";

static MINUTES_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*分钟").expect("minutes pattern is valid"));

/// Extract the minute count from strings like "125分钟" or "共 45 分钟"
pub fn extract_minutes(duration: &str) -> Option<u32> {
    MINUTES_PATTERN
        .captures(duration)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

pub fn minutes_to_iso8601(minutes: u32) -> String {
    format!("PT{}H{}M", minutes / 60, minutes % 60)
}

pub fn iso8601_duration(duration: &str) -> Option<String> {
    extract_minutes(duration).map(minutes_to_iso8601)
}

/// Like [`iso8601_duration`] but never fails; falls back to [`UNKNOWN_DURATION`]
pub fn iso8601_or_unknown(duration: Option<&str>) -> String {
    duration
        .and_then(iso8601_duration)
        .unwrap_or_else(|| UNKNOWN_DURATION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_extraction() {
        assert_eq!(extract_minutes("125分钟"), Some(125));
        assert_eq!(extract_minutes("时长 45 分钟"), Some(45));
        assert_eq!(extract_minutes("2 hours"), None);
        assert_eq!(extract_minutes(""), None);
    }

    #[test]
    fn test_iso_conversion() {
        assert_eq!(iso8601_duration("125分钟").as_deref(), Some("PT2H5M"));
        assert_eq!(iso8601_duration("45分钟").as_deref(), Some("PT0H45M"));
        assert_eq!(iso8601_duration("60分钟").as_deref(), Some("PT1H0M"));
    }

    #[test]
    fn test_unknown_duration_sentinel() {
        assert_eq!(iso8601_or_unknown(Some("abc")), UNKNOWN_DURATION);
        assert_eq!(iso8601_or_unknown(None), UNKNOWN_DURATION);
        assert_eq!(iso8601_or_unknown(Some("90分钟")), "PT1H30M");
    }
}
