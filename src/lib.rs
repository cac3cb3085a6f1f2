//! Contestwatch - the state engine behind a contest-tracker UI.
//!
//! Two independently rendered surfaces (a compact popup and a full options
//! page) share the same persisted preferences and contest cache. This crate
//! implements the parts with real invariants:
//!
//! - **Preference sync** ([`sync`]): each surface hydrates once from the
//!   store, watches for external changes, and persists local edits through
//!   per-key debounced writers. Echo suppression guarantees a surface never
//!   re-writes a value it just received, so two surfaces converge without
//!   write feedback loops.
//! - **Contest cache** ([`cache`]): a 12-hour TTL over the remote contest
//!   list, with forced refresh and cancellation of in-flight fetches.
//! - **Projection** ([`projection`]): a pure function from raw records plus
//!   filter state to display rows.
//!
//! Rendering, the backup export/import flow, and the credential form live
//! in the embedding UI; they observe state through `watch` receivers,
//! mutate it through plain methods, and drain the notice channel for
//! user-visible errors.

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod projection;
pub mod store;
pub mod sync;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use cache::{CachePhase, CacheState, ContestCache, ContestFetcher, LoadOutcome};
pub use models::{DisplayContest, RawContest, TimeFilter, UserSettings};
pub use projection::project_contests;
pub use store::{FileStore, KeyValueStore, MemoryStore, StoreArea, StoreError};
pub use sync::{Notice, NoticeLevel, NoticeSender, PreferenceSurface, SurfaceState};
