//! Pure projection of raw contest records into display rows.
//!
//! `project_contests` is a pure function of its arguments: identical inputs
//! always yield an identical output list, and the order of surviving
//! records is the order received from upstream (the API already sorts by
//! start time). Surfaces memoize on the inputs and re-run only when one of
//! them changes.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};

use crate::models::{logo_src, DisplayContest, RawContest, TimeFilter};
use crate::utils::{format_date_time, format_duration_seconds, parse_contest_date, start_of_tomorrow};

/// Project raw records into the filtered, display-ready list.
///
/// Records are dropped when their start or end date fails to parse or when
/// their platform is not selected. The time predicate keeps contests that
/// are still relevant for the chosen window. Date and time strings are
/// rendered in `now`'s timezone; surfaces pass `Local::now()`, tests pass
/// fixed UTC instants.
pub fn project_contests<Tz: TimeZone>(
    raw: &[RawContest],
    selected_platforms: &[String],
    time_filter: TimeFilter,
    now: &DateTime<Tz>,
) -> Vec<DisplayContest>
where
    Tz::Offset: fmt::Display,
{
    let now_utc = now.with_timezone(&Utc);
    let tomorrow = start_of_tomorrow(now).with_timezone(&Utc);

    raw.iter()
        .filter_map(|contest| {
            let start = parse_contest_date(&contest.start)?;
            let end = parse_contest_date(&contest.end)?;

            if !selected_platforms.iter().any(|p| p == &contest.resource) {
                return None;
            }

            let keep = match time_filter {
                TimeFilter::Today => end > now_utc && start < tomorrow,
                TimeFilter::Upcoming => start > now_utc,
            };
            if !keep {
                return None;
            }

            let zone = now.timezone();
            let (start_date, start_time) = format_date_time(&start.with_timezone(&zone));
            let (end_date, end_time) = format_date_time(&end.with_timezone(&zone));

            Some(DisplayContest {
                id: contest.id,
                event: contest.event.clone(),
                href: contest.href.clone(),
                resource: contest.resource.clone(),
                start_ms: start.timestamp_millis(),
                end_ms: end.timestamp_millis(),
                start_date,
                start_time,
                end_date,
                end_time,
                duration_text: format_duration_seconds(contest.duration),
                logo_src: logo_src(&contest.resource),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codeforces_round() -> RawContest {
        RawContest {
            id: 1,
            event: "Codeforces Round".to_string(),
            href: Some("https://codeforces.com/contests/1".to_string()),
            resource: "codeforces.com".to_string(),
            start: "2025-01-10T10:00:00".to_string(),
            end: "2025-01-10T12:00:00".to_string(),
            duration: 7200,
        }
    }

    fn platforms(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn test_upcoming_includes_future_contest() {
        let now = Utc.with_ymd_and_hms(2025, 1, 9, 0, 0, 0).unwrap();
        let rows = project_contests(
            &[codeforces_round()],
            &platforms(&["codeforces.com"]),
            TimeFilter::Upcoming,
            &now,
        );

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].duration_text, "2 hours");
        assert_eq!(rows[0].logo_src.as_deref(), Some("/logos/codeforces.svg"));
    }

    #[test]
    fn test_upcoming_excludes_already_started_contest() {
        let now = Utc.with_ymd_and_hms(2025, 1, 11, 0, 0, 0).unwrap();
        let rows = project_contests(
            &[codeforces_round()],
            &platforms(&["codeforces.com"]),
            TimeFilter::Upcoming,
            &now,
        );
        assert!(rows.is_empty());
    }

    #[test]
    fn test_today_window() {
        let now = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
        let selected = platforms(&["codeforces.com"]);

        // Runs later today.
        let rows = project_contests(&[codeforces_round()], &selected, TimeFilter::Today, &now);
        assert_eq!(rows.len(), 1);

        // Started yesterday, still running: end > now keeps it.
        let mut ongoing = codeforces_round();
        ongoing.start = "2025-01-09T10:00:00".to_string();
        ongoing.end = "2025-01-10T10:00:00".to_string();
        let rows = project_contests(&[ongoing], &selected, TimeFilter::Today, &now);
        assert_eq!(rows.len(), 1);

        // Starts tomorrow: start < startOfTomorrow drops it.
        let mut tomorrow = codeforces_round();
        tomorrow.start = "2025-01-11T01:00:00".to_string();
        tomorrow.end = "2025-01-11T03:00:00".to_string();
        let rows = project_contests(&[tomorrow], &selected, TimeFilter::Today, &now);
        assert!(rows.is_empty());

        // Already ended today.
        let mut ended = codeforces_round();
        ended.start = "2025-01-10T06:00:00".to_string();
        ended.end = "2025-01-10T08:00:00".to_string();
        let rows = project_contests(&[ended], &selected, TimeFilter::Today, &now);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_unparseable_dates_are_dropped() {
        let mut broken = codeforces_round();
        broken.start = "soon".to_string();
        let now = Utc.with_ymd_and_hms(2025, 1, 9, 0, 0, 0).unwrap();

        let rows = project_contests(
            &[broken],
            &platforms(&["codeforces.com"]),
            TimeFilter::Upcoming,
            &now,
        );
        assert!(rows.is_empty());
    }

    #[test]
    fn test_bare_timestamps_are_read_as_utc() {
        let bare = codeforces_round();
        let mut suffixed = codeforces_round();
        suffixed.start = "2025-01-10T10:00:00Z".to_string();
        suffixed.end = "2025-01-10T12:00:00Z".to_string();

        let now = Utc.with_ymd_and_hms(2025, 1, 9, 0, 0, 0).unwrap();
        let selected = platforms(&["codeforces.com"]);
        let rows = project_contests(&[bare, suffixed], &selected, TimeFilter::Upcoming, &now);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].start_ms, rows[1].start_ms);
    }

    #[test]
    fn test_unselected_platform_is_dropped() {
        let now = Utc.with_ymd_and_hms(2025, 1, 9, 0, 0, 0).unwrap();
        let rows = project_contests(
            &[codeforces_round()],
            &platforms(&["atcoder.jp"]),
            TimeFilter::Upcoming,
            &now,
        );
        assert!(rows.is_empty());
    }

    #[test]
    fn test_unknown_platform_has_no_logo() {
        let mut contest = codeforces_round();
        contest.resource = "newjudge.example".to_string();
        let now = Utc.with_ymd_and_hms(2025, 1, 9, 0, 0, 0).unwrap();

        let rows = project_contests(
            &[contest],
            &platforms(&["newjudge.example"]),
            TimeFilter::Upcoming,
            &now,
        );
        assert_eq!(rows.len(), 1);
        assert!(rows[0].logo_src.is_none());
    }

    #[test]
    fn test_upstream_order_is_preserved() {
        let mut second = codeforces_round();
        second.id = 2;
        second.start = "2025-01-12T10:00:00".to_string();
        second.end = "2025-01-12T12:00:00".to_string();
        let first = codeforces_round();

        let now = Utc.with_ymd_and_hms(2025, 1, 9, 0, 0, 0).unwrap();
        let rows = project_contests(
            &[first, second],
            &platforms(&["codeforces.com"]),
            TimeFilter::Upcoming,
            &now,
        );

        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn test_projection_is_pure() {
        let raw = vec![codeforces_round()];
        let selected = platforms(&["codeforces.com"]);
        let now = Utc.with_ymd_and_hms(2025, 1, 9, 0, 0, 0).unwrap();

        let first = project_contests(&raw, &selected, TimeFilter::Today, &now);
        let second = project_contests(&raw, &selected, TimeFilter::Today, &now);
        assert_eq!(first, second);
    }

    #[test]
    fn test_rendered_fields() {
        let now = Utc.with_ymd_and_hms(2025, 1, 9, 0, 0, 0).unwrap();
        let rows = project_contests(
            &[codeforces_round()],
            &platforms(&["codeforces.com"]),
            TimeFilter::Upcoming,
            &now,
        );

        let row = &rows[0];
        assert_eq!(row.start_date, "10/1/2025");
        assert_eq!(row.start_time, "10:00:00 AM");
        assert_eq!(row.end_time, "12:00:00 PM");
        assert_eq!(
            row.start_ms,
            Utc.with_ymd_and_hms(2025, 1, 10, 10, 0, 0)
                .unwrap()
                .timestamp_millis()
        );
    }
}
