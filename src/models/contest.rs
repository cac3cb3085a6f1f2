use serde::{Deserialize, Serialize};

/// A contest as returned by the clist.by API.
///
/// `start` and `end` are raw date strings; the API omits the timezone suffix
/// on some resources, so parsing happens in the projection pipeline rather
/// than at deserialization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawContest {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub resource: String,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
    /// Contest length in seconds.
    #[serde(default)]
    pub duration: i64,
}

/// Top-level response envelope from the contest endpoint.
#[derive(Debug, Deserialize)]
pub struct ContestsResponse {
    #[serde(default)]
    pub objects: Vec<RawContest>,
}

/// Display-ready projection of a [`RawContest`]. Derived, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayContest {
    pub id: i64,
    pub event: String,
    pub href: Option<String>,
    pub resource: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub start_date: String,
    pub start_time: String,
    pub end_date: String,
    pub end_time: String,
    pub duration_text: String,
    /// Asset path for the platform logo; `None` means the UI falls back to
    /// a text badge.
    pub logo_src: Option<String>,
}

/// Time-window preference for the contest list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFilter {
    /// Contests still running today: `end > now && start < start of tomorrow`.
    Today,
    /// Contests that have not started yet: `start > now`.
    #[default]
    Upcoming,
}

impl TimeFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFilter::Today => "today",
            TimeFilter::Upcoming => "upcoming",
        }
    }
}
