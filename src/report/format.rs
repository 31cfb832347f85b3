//! Duration and timestamp text

use std::fmt::Write as _;
use std::time::Duration;

use chrono::{DateTime, TimeZone};

/// Default chrono strftime pattern, e.g. `2026-01-15 10:00:00.123`
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Appended to durations at or above the slow threshold
pub const SLOW_SUFFIX: &str = " (slow)";

/// Human-readable test duration.
///
/// | duration | text |
/// |---|---|
/// | < 1 ms | `< 1 ms` |
/// | < 1 s | `{n} ms`, fractional milliseconds kept (`1.5 ms`) |
/// | < 60 s | `{s:.2} s` |
/// | otherwise | `HH:MM:SS.fff` |
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    if duration < Duration::from_millis(1) {
        return "< 1 ms".to_string();
    }
    if duration < Duration::from_secs(1) {
        let ms = f64::from(duration.subsec_nanos()) / 1_000_000.0;
        return format!("{ms} ms");
    }
    if duration < Duration::from_secs(60) {
        return format!("{:.2} s", duration.as_secs_f64());
    }
    let total = duration.as_secs();
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        total / 3600,
        (total / 60) % 60,
        total % 60,
        duration.subsec_millis()
    )
}

/// Render `at` with a strftime `pattern`.
///
/// Patterns chrono cannot render fall back to [`DEFAULT_TIMESTAMP_FORMAT`]
/// instead of panicking.
#[must_use]
pub fn format_timestamp<Tz>(at: &DateTime<Tz>, pattern: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    if write!(out, "{}", at.format(pattern)).is_ok() {
        return out;
    }
    at.format(DEFAULT_TIMESTAMP_FORMAT).to_string()
}

/// Elapsed time between two instants, as `{s:.2} seconds`
#[must_use]
pub fn format_run_time<Tz: TimeZone>(from: &DateTime<Tz>, to: &DateTime<Tz>) -> String {
    let elapsed = to.clone().signed_duration_since(from.clone());
    let seconds = elapsed.to_std().unwrap_or_default().as_secs_f64();
    format!("{seconds:.2} seconds")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 4, 5).unwrap()
            + chrono::Duration::milliseconds(123)
    }

    #[test]
    fn test_sub_millisecond() {
        assert_eq!(format_duration(Duration::ZERO), "< 1 ms");
        assert_eq!(format_duration(Duration::from_micros(999)), "< 1 ms");
    }

    #[test]
    fn test_milliseconds() {
        assert_eq!(format_duration(Duration::from_millis(1)), "1 ms");
        assert_eq!(format_duration(Duration::from_millis(50)), "50 ms");
        assert_eq!(format_duration(Duration::from_millis(999)), "999 ms");
    }

    #[test]
    fn test_fractional_milliseconds() {
        assert_eq!(format_duration(Duration::from_micros(1500)), "1.5 ms");
        assert_eq!(format_duration(Duration::from_nanos(12_345_678)), "12.345678 ms");
    }

    #[test]
    fn test_seconds() {
        assert_eq!(format_duration(Duration::from_millis(1000)), "1.00 s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50 s");
        assert_eq!(format_duration(Duration::from_millis(59_990)), "59.99 s");
    }

    #[test]
    fn test_minutes_use_clock_format() {
        assert_eq!(format_duration(Duration::from_secs(60)), "00:01:00.000");
        assert_eq!(
            format_duration(Duration::from_millis(3_725_250)),
            "01:02:05.250"
        );
    }

    #[test]
    fn test_default_timestamp() {
        assert_eq!(
            format_timestamp(&at(), DEFAULT_TIMESTAMP_FORMAT),
            "2026-01-15 10:04:05.123"
        );
    }

    #[test]
    fn test_custom_timestamp() {
        assert_eq!(format_timestamp(&at(), "%H:%M"), "10:04");
    }

    #[test]
    fn test_malformed_timestamp_falls_back() {
        assert_eq!(format_timestamp(&at(), "%Q"), "2026-01-15 10:04:05.123");
    }

    #[test]
    fn test_run_time() {
        let start = at();
        let end = start + chrono::Duration::milliseconds(2340);
        assert_eq!(format_run_time(&start, &end), "2.34 seconds");
        // clock going backwards never renders a negative time
        assert_eq!(format_run_time(&end, &start), "0.00 seconds");
    }
}
