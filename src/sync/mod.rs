//! Cross-surface preference synchronization.
//!
//! Each UI surface owns a [`PreferenceSurface`]: it hydrates once from the
//! store, watches both areas for external changes, and writes local edits
//! back through per-key debounced persisters. Echo suppression keeps a
//! surface from re-writing a value it just received from the store, so two
//! mounted surfaces converge without write feedback loops.

pub mod notice;
pub mod persister;
pub mod surface;

pub use notice::{Notice, NoticeLevel, NoticeSender};
pub use persister::KeyPersister;
pub use surface::{PreferenceSurface, SurfaceState};
