use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::DEBOUNCE_WINDOW;
use crate::store::{KeyValueStore, StoreArea};

use super::notice::NoticeSender;

/// Debounced writer for a single preference key.
///
/// Every in-memory change of the key's value is routed through
/// [`on_change`](Self::on_change); only the last change in a burst inside
/// the quiet window reaches the store. An externally-applied change is
/// preceded by [`suppress_next_write`](Self::suppress_next_write), which
/// marks the next write attempt a no-op so the surface never echoes back
/// what it just received. The suppression token is scoped to this key; a
/// change to another key cannot consume it.
pub struct KeyPersister {
    store: Arc<dyn KeyValueStore>,
    area: StoreArea,
    key: &'static str,
    delay: Duration,
    /// Set when an external change is about to be applied to in-memory
    /// state; consumed by the next write attempt, which then does nothing.
    suppress_next: Arc<AtomicBool>,
    pending: Option<JoinHandle<()>>,
    notices: NoticeSender,
}

impl KeyPersister {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        area: StoreArea,
        key: &'static str,
        notices: NoticeSender,
    ) -> Self {
        Self {
            store,
            area,
            key,
            delay: DEBOUNCE_WINDOW,
            suppress_next: Arc::new(AtomicBool::new(false)),
            pending: None,
            notices,
        }
    }

    /// Mark the next write attempt for this key as a no-op.
    pub fn suppress_next_write(&self) {
        self.suppress_next.store(true, Ordering::SeqCst);
    }

    /// Route an in-memory change of the key's value.
    ///
    /// Cancels any pending write, then either consumes the suppression
    /// token (skipping a write that raced with the external change inside
    /// the window is the accepted last-writer-wins tradeoff) or starts the
    /// quiet-window timer for `value`.
    pub fn on_change(&mut self, value: Value) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }

        if self.suppress_next.swap(false, Ordering::SeqCst) {
            debug!(key = self.key, "Write suppressed, change originated from the store");
            return;
        }

        let store = Arc::clone(&self.store);
        let area = self.area;
        let key = self.key;
        let delay = self.delay;
        let notices = self.notices.clone();

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let entries = BTreeMap::from([(key.to_string(), value)]);
            if let Err(e) = store.set(area, entries).await {
                warn!(key, error = %e, "Failed to persist preference");
                notices.error(format!("Error saving {}: {}", key, e));
            }
        }));
    }

    /// Drop any pending write. Runs on surface teardown.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

impl Drop for KeyPersister {
    fn drop(&mut self) {
        self.cancel();
    }
}
