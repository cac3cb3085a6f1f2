//! Date parsing and formatting helpers for contest timestamps.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Parse a contest date string from the API.
///
/// Some resources omit the timezone suffix; bare timestamps are interpreted
/// as UTC.
pub fn parse_contest_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Serialize an instant the way the contest API expects its query
/// parameters: ISO 8601 with neither fractional seconds nor a suffix.
pub fn iso_no_ms(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Midnight at the start of the day after `now`, in `now`'s timezone.
pub fn start_of_tomorrow<Tz: TimeZone>(now: &DateTime<Tz>) -> DateTime<Tz> {
    let tomorrow = now.clone() + Duration::days(1);
    tomorrow
        .with_time(NaiveTime::MIN)
        .earliest()
        .unwrap_or(tomorrow)
}

/// Human-readable contest length, e.g. `"2 hours"` or
/// `"1 days 2 hours 30 minutes"`. Non-positive lengths render empty.
pub fn format_duration_seconds(total_seconds: i64) -> String {
    if total_seconds <= 0 {
        return String::new();
    }

    let minutes = (total_seconds / 60) % 60;
    let hours = (total_seconds / 3600) % 24;
    let days = total_seconds / 86400;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{} days", days));
    }
    if hours > 0 {
        parts.push(format!("{} hours", hours));
    }
    if minutes > 0 {
        parts.push(format!("{} minutes", minutes));
    }

    parts.join(" ")
}

/// Split an instant into the list UI's legacy dd/mm/yyyy date and 12-hour
/// clock time strings.
pub fn format_date_time<Tz: TimeZone>(dt: &DateTime<Tz>) -> (String, String)
where
    Tz::Offset: fmt::Display,
{
    (
        dt.format("%-d/%-m/%Y").to_string(),
        dt.format("%-I:%M:%S %p").to_string(),
    )
}

/// Compact countdown text, e.g. `"1d 2h 3m 4s"`. Negative remainders clamp
/// to zero.
pub fn format_countdown_ms(ms_remaining: i64) -> String {
    let total_seconds = (ms_remaining / 1000).max(0);
    let days = total_seconds / 86400;
    let hours = (total_seconds % 86400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if days > 0 {
        format!("{}d {}h {}m {}s", days, hours, minutes, seconds)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else {
        format!("{}m {}s", minutes, seconds)
    }
}

/// Countdown texts for one contest row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    pub starts_in: String,
    pub ends_in: String,
}

/// Countdown texts relative to `now_ms`; contests already past a boundary
/// render `"Started"` / `"Ended"`.
pub fn contest_countdown(start_ms: i64, end_ms: i64, now_ms: i64) -> Countdown {
    let starts_in_ms = start_ms - now_ms;
    let ends_in_ms = end_ms - now_ms;

    Countdown {
        starts_in: if starts_in_ms > 0 {
            format_countdown_ms(starts_in_ms)
        } else {
            "Started".to_string()
        },
        ends_in: if ends_in_ms > 0 {
            format_countdown_ms(ends_in_ms)
        } else {
            "Ended".to_string()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_parse_contest_date_without_suffix_is_utc() {
        let bare = parse_contest_date("2025-01-10T10:00:00").unwrap();
        let suffixed = parse_contest_date("2025-01-10T10:00:00Z").unwrap();
        assert_eq!(bare, suffixed);
    }

    #[test]
    fn test_parse_contest_date_with_offset() {
        let offset = parse_contest_date("2025-01-10T10:00:00+05:30").unwrap();
        assert_eq!(offset, Utc.with_ymd_and_hms(2025, 1, 10, 4, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_contest_date_invalid() {
        assert!(parse_contest_date("").is_none());
        assert!(parse_contest_date("soon").is_none());
        assert!(parse_contest_date("2025-13-40T99:00:00").is_none());
    }

    #[test]
    fn test_iso_no_ms() {
        let dt = Utc.with_ymd_and_hms(2025, 1, 9, 0, 0, 0).unwrap();
        assert_eq!(iso_no_ms(dt), "2025-01-09T00:00:00");
    }

    #[test]
    fn test_start_of_tomorrow() {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 18, 42, 5).unwrap();
        assert_eq!(
            start_of_tomorrow(&now),
            Utc.with_ymd_and_hms(2025, 1, 11, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_format_duration_seconds() {
        assert_eq!(format_duration_seconds(7200), "2 hours");
        assert_eq!(format_duration_seconds(93780), "1 days 2 hours 3 minutes");
        assert_eq!(format_duration_seconds(45), "");
        assert_eq!(format_duration_seconds(0), "");
        assert_eq!(format_duration_seconds(-60), "");
    }

    #[test]
    fn test_format_date_time() {
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let dt = ist.with_ymd_and_hms(2025, 1, 10, 15, 30, 0).unwrap();
        let (date, time) = format_date_time(&dt);
        assert_eq!(date, "10/1/2025");
        assert_eq!(time, "3:30:00 PM");
    }

    #[test]
    fn test_format_countdown_ms() {
        assert_eq!(format_countdown_ms(90_061_000), "1d 1h 1m 1s");
        assert_eq!(format_countdown_ms(3_723_000), "1h 2m 3s");
        assert_eq!(format_countdown_ms(59_000), "0m 59s");
        assert_eq!(format_countdown_ms(-5_000), "0m 0s");
    }

    #[test]
    fn test_contest_countdown_boundaries() {
        let countdown = contest_countdown(1_000, 2_000, 1_500);
        assert_eq!(countdown.starts_in, "Started");
        assert_eq!(countdown.ends_in, "0m 0s");

        let countdown = contest_countdown(1_000, 2_000, 2_500);
        assert_eq!(countdown.ends_in, "Ended");
    }
}
