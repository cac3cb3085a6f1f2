//! Utility functions for date parsing and display formatting.

pub mod time;

pub use time::{
    contest_countdown, format_countdown_ms, format_date_time, format_duration_seconds,
    iso_no_ms, parse_contest_date, start_of_tomorrow, Countdown,
};
