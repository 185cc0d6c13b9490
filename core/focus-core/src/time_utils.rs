//! Timestamp and duration formatting for display.
//!
//! All timestamps are Unix seconds rendered in local time. A timestamp of `0`
//! means "unset" and renders as `N/A`.

use chrono::{DateTime, Local, TimeZone, Utc};

const UNSET: &str = "N/A";

pub fn now_unix() -> i64 {
    Utc::now().timestamp()
}

fn local(timestamp: i64) -> Option<DateTime<Local>> {
    if timestamp == 0 {
        return None;
    }
    Local.timestamp_opt(timestamp, 0).single()
}

fn format_with(timestamp: i64, pattern: &str) -> String {
    local(timestamp)
        .map(|dt| dt.format(pattern).to_string())
        .unwrap_or_else(|| UNSET.to_string())
}

/// `2024-03-09 14:05:07`
pub fn format_timestamp(timestamp: i64) -> String {
    format_with(timestamp, "%Y-%m-%d %H:%M:%S")
}

/// `14:05:07`
pub fn format_time(timestamp: i64) -> String {
    format_with(timestamp, "%H:%M:%S")
}

/// `2024-03-09`
pub fn format_date(timestamp: i64) -> String {
    format_with(timestamp, "%Y-%m-%d")
}

/// `Saturday, March 09, 2024`
pub fn format_date_with_day(timestamp: i64) -> String {
    format_with(timestamp, "%A, %B %d, %Y")
}

/// Compact duration: `45s`, `2m 30s`, `1h 15m`.
pub fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

pub fn format_duration_ms(ms: u64) -> String {
    format_duration(i64::try_from(ms / 1000).unwrap_or(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_timestamp_is_unset() {
        assert_eq!(format_timestamp(0), "N/A");
        assert_eq!(format_time(0), "N/A");
        assert_eq!(format_date(0), "N/A");
        assert_eq!(format_date_with_day(0), "N/A");
    }

    #[test]
    fn test_formats_follow_local_time() {
        let ts = 1_710_000_000;
        let dt = Local.timestamp_opt(ts, 0).single().unwrap();
        assert_eq!(format_date(ts), dt.format("%Y-%m-%d").to_string());
        assert_eq!(format_time(ts), dt.format("%H:%M:%S").to_string());
        assert_eq!(
            format_timestamp(ts),
            format!("{} {}", format_date(ts), format_time(ts))
        );
        assert!(format_date_with_day(ts).ends_with(&dt.format("%Y").to_string()));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(150), "2m 30s");
        assert_eq!(format_duration(3600), "1h 0m");
        assert_eq!(format_duration(4500), "1h 15m");
        assert_eq!(format_duration(-5), "0s");
    }

    #[test]
    fn test_format_duration_ms_truncates() {
        assert_eq!(format_duration_ms(0), "0s");
        assert_eq!(format_duration_ms(1999), "1s");
        assert_eq!(format_duration_ms(8000), "8s");
        assert_eq!(format_duration_ms(90_500), "1m 30s");
    }
}
