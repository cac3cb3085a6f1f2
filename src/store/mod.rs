//! Persisted key-value storage shared by both surfaces.
//!
//! The store has two isolated areas with independent change notifications:
//! `Synced` holds credentials and feature toggles, `Local` holds the
//! platform/time preferences and the contest cache. Writes are atomic per
//! call; a multi-key `set` is observed by subscribers as a single batch.
//! The per-key-atomic write plus its change notification is the only
//! synchronization primitive between surfaces.

pub mod file;
pub mod kv;
pub mod memory;

pub use file::FileStore;
pub use kv::{
    get_value, set_value, ChangeBatch, KeyChange, KeyValueStore, StoreArea, StoreError,
};
pub use memory::MemoryStore;
