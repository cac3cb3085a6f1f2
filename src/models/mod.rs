//! Data models for contest tracking.
//!
//! This module contains the data structures shared by the cache, the
//! projection pipeline, and the preference surfaces:
//!
//! - `RawContest`: a contest as returned by the clist.by API
//! - `DisplayContest`: the derived, display-ready projection
//! - `TimeFilter`: the persisted time-window preference
//! - `UserSettings`: credentials and toggles from the synced area

pub mod contest;
pub mod platform;
pub mod settings;

pub use contest::{ContestsResponse, DisplayContest, RawContest, TimeFilter};
pub use platform::logo_src;
pub use settings::UserSettings;
