//! Storage keys, defaults, and tuning constants shared by both surfaces.
//!
//! The key names and their areas match the persisted layout consumed by the
//! backup export/import flow, so they must not be renamed casually.

use std::time::Duration;

use crate::models::TimeFilter;

/// Keys in the [`Local`](crate::store::StoreArea::Local) storage area.
pub mod local_keys {
    /// Selected platform ids, stored as a JSON array of resource strings.
    pub const HOSTS: &str = "hosts";
    /// Time-window filter, stored as `"today"` or `"upcoming"`.
    pub const TIME_FILTER: &str = "timeFilter";
    /// Cached raw contest list, written together with [`TIME_STAMP`].
    pub const CONTESTS: &str = "contests";
    /// RFC 3339 instant of the fetch that produced [`CONTESTS`].
    pub const TIME_STAMP: &str = "timeStamp";
}

/// Keys in the [`Synced`](crate::store::StoreArea::Synced) storage area.
pub mod synced_keys {
    /// Credentials and feature toggles, stored as one JSON object.
    pub const USER_SETTINGS: &str = "userSettings";
}

/// Quiet window after the last local edit before a preference write commits.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(300);

/// Cached contest data older than this is refetched.
pub const CACHE_TTL_HOURS: i64 = 12;

/// Platforms shown when no preference has been persisted yet.
pub fn default_platforms() -> Vec<String> {
    vec!["codeforces.com".to_string()]
}

/// Time filter used when no preference has been persisted yet.
pub const DEFAULT_TIME_FILTER: TimeFilter = TimeFilter::Upcoming;
