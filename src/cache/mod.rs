//! TTL-bounded contest cache backed by the shared store.
//!
//! The cache keeps the raw contest list and the instant it was fetched as a
//! pair of keys in the local area, written together in a single batch.
//! `load` decides fetch-vs-serve-cache from the stored timestamp, `refresh`
//! deletes the pair and forces a fetch, and an in-flight fetch is aborted
//! when a new one starts or the owning surface unmounts.

pub mod contests;

pub use contests::{CachePhase, CacheState, ContestCache, ContestFetcher, LoadOutcome};
