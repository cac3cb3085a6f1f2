use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::{default_platforms, local_keys, synced_keys, DEFAULT_TIME_FILTER};
use crate::models::{TimeFilter, UserSettings};
use crate::store::{ChangeBatch, KeyValueStore, StoreArea};

use super::notice::NoticeSender;
use super::persister::KeyPersister;

/// In-memory preference state of one surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceState {
    pub selected_platforms: Vec<String>,
    pub time_filter: TimeFilter,
    pub settings: UserSettings,
}

impl Default for SurfaceState {
    fn default() -> Self {
        Self {
            selected_platforms: default_platforms(),
            time_filter: DEFAULT_TIME_FILTER,
            settings: UserSettings::default(),
        }
    }
}

struct SurfaceCore {
    state: watch::Sender<SurfaceState>,
    hosts: KeyPersister,
    time_filter: KeyPersister,
    user_settings: KeyPersister,
    /// True only after the first successful read from the store. Local
    /// edits made before hydration update in-memory state but are never
    /// written, so defaults cannot clobber unread persisted state.
    hydrated: bool,
}

/// One mounted surface over the shared store.
///
/// Hydrates once on mount, then applies external change batches as they
/// arrive and persists local edits through per-key debounced writers.
pub struct PreferenceSurface {
    core: Arc<Mutex<SurfaceCore>>,
    listener: Option<JoinHandle<()>>,
}

impl PreferenceSurface {
    /// Mount a surface: hydrate from the store, then watch both areas.
    ///
    /// A failed hydration read is reported as a notice and leaves the
    /// surface on defaults with writes forbidden; it does not fail the
    /// mount.
    pub async fn mount(store: Arc<dyn KeyValueStore>, notices: NoticeSender) -> Self {
        // Subscribe before the hydration reads so a change landing in
        // between is replayed rather than lost.
        let local_rx = store.watch(StoreArea::Local);
        let synced_rx = store.watch(StoreArea::Synced);

        let mut state = SurfaceState::default();
        let mut hydrated = true;

        match store
            .get(StoreArea::Local, &[local_keys::HOSTS, local_keys::TIME_FILTER])
            .await
        {
            Ok(mut entries) => {
                if let Some(platforms) = entries
                    .remove(local_keys::HOSTS)
                    .as_ref()
                    .and_then(platforms_from_value)
                {
                    state.selected_platforms = platforms;
                }
                if let Some(filter) = entries
                    .remove(local_keys::TIME_FILTER)
                    .and_then(|v| serde_json::from_value(v).ok())
                {
                    state.time_filter = filter;
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to hydrate local preferences");
                notices.error(format!("Error loading preferences: {}", e));
                hydrated = false;
            }
        }

        match store
            .get(StoreArea::Synced, &[synced_keys::USER_SETTINGS])
            .await
        {
            Ok(mut entries) => {
                if let Some(value) = entries.remove(synced_keys::USER_SETTINGS) {
                    state.settings = UserSettings::from_value(&value);
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to hydrate user settings");
                notices.error(format!("Error loading settings: {}", e));
                hydrated = false;
            }
        }

        let (state_tx, _) = watch::channel(state);
        let core = Arc::new(Mutex::new(SurfaceCore {
            state: state_tx,
            hosts: KeyPersister::new(
                Arc::clone(&store),
                StoreArea::Local,
                local_keys::HOSTS,
                notices.clone(),
            ),
            time_filter: KeyPersister::new(
                Arc::clone(&store),
                StoreArea::Local,
                local_keys::TIME_FILTER,
                notices.clone(),
            ),
            user_settings: KeyPersister::new(
                Arc::clone(&store),
                StoreArea::Synced,
                synced_keys::USER_SETTINGS,
                notices,
            ),
            hydrated,
        }));

        let listener = tokio::spawn(listen(Arc::clone(&core), local_rx, synced_rx));

        Self {
            core,
            listener: Some(listener),
        }
    }

    /// Observe this surface's state.
    pub fn state(&self) -> watch::Receiver<SurfaceState> {
        self.lock_core().state.subscribe()
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> SurfaceState {
        self.lock_core().state.borrow().clone()
    }

    /// Whether the first store read has completed successfully.
    pub fn is_hydrated(&self) -> bool {
        self.lock_core().hydrated
    }

    /// Replace the selected platform set (local edit).
    pub fn set_platforms(&self, platforms: Vec<String>) {
        let mut core = self.lock_core();
        let changed = core.state.send_if_modified(|s| {
            if s.selected_platforms != platforms {
                s.selected_platforms = platforms.clone();
                true
            } else {
                false
            }
        });
        if changed && core.hydrated {
            core.hosts.on_change(Value::from(platforms));
        }
    }

    /// Add or remove one platform from the selection (local edit).
    pub fn toggle_platform(&self, platform: &str) {
        let mut platforms = self.snapshot().selected_platforms;
        match platforms.iter().position(|p| p == platform) {
            Some(index) => {
                platforms.remove(index);
            }
            None => platforms.push(platform.to_string()),
        }
        self.set_platforms(platforms);
    }

    /// Switch the time-window filter (local edit).
    pub fn set_time_filter(&self, filter: TimeFilter) {
        let mut core = self.lock_core();
        let changed = core.state.send_if_modified(|s| {
            if s.time_filter != filter {
                s.time_filter = filter;
                true
            } else {
                false
            }
        });
        if changed && core.hydrated {
            core.time_filter
                .on_change(Value::String(filter.as_str().to_string()));
        }
    }

    /// Replace the user settings (local edit).
    pub fn set_user_settings(&self, settings: UserSettings) {
        let mut core = self.lock_core();
        let changed = core.state.send_if_modified(|s| {
            if s.settings != settings {
                s.settings = settings.clone();
                true
            } else {
                false
            }
        });
        if !(changed && core.hydrated) {
            return;
        }
        match serde_json::to_value(&settings) {
            Ok(value) => core.user_settings.on_change(value),
            Err(e) => warn!(error = %e, "Failed to serialize user settings"),
        }
    }

    /// Unmount: stop watching the store and drop any pending writes.
    pub fn unmount(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
        }
        let mut core = self.lock_core();
        core.hosts.cancel();
        core.time_filter.cancel();
        core.user_settings.cancel();
    }

    fn lock_core(&self) -> MutexGuard<'_, SurfaceCore> {
        self.core.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for PreferenceSurface {
    fn drop(&mut self) {
        self.unmount();
    }
}

async fn listen(
    core: Arc<Mutex<SurfaceCore>>,
    mut local_rx: broadcast::Receiver<ChangeBatch>,
    mut synced_rx: broadcast::Receiver<ChangeBatch>,
) {
    loop {
        let batch = tokio::select! {
            batch = local_rx.recv() => batch,
            batch = synced_rx.recv() => batch,
        };

        match batch {
            Ok(batch) => apply_batch(&core, &batch),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "Missed store change notifications");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

/// Apply an external change batch. Each watched key is handled
/// independently: its own suppression token, its own state update.
fn apply_batch(core: &Arc<Mutex<SurfaceCore>>, batch: &ChangeBatch) {
    let mut core = core.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

    for change in &batch.changes {
        match (batch.area, change.key.as_str()) {
            (StoreArea::Local, local_keys::HOSTS) => {
                let platforms = change
                    .new_value
                    .as_ref()
                    .and_then(platforms_from_value)
                    .unwrap_or_else(|| core.state.borrow().selected_platforms.clone());
                core.hosts.suppress_next_write();
                core.state.send_if_modified(|s| {
                    if s.selected_platforms != platforms {
                        s.selected_platforms = platforms.clone();
                        true
                    } else {
                        false
                    }
                });
                core.hosts.on_change(Value::from(platforms));
            }
            (StoreArea::Local, local_keys::TIME_FILTER) => {
                let filter: TimeFilter = change
                    .new_value
                    .clone()
                    .and_then(|v| serde_json::from_value(v).ok())
                    .unwrap_or(core.state.borrow().time_filter);
                core.time_filter.suppress_next_write();
                core.state.send_if_modified(|s| {
                    if s.time_filter != filter {
                        s.time_filter = filter;
                        true
                    } else {
                        false
                    }
                });
                core.time_filter
                    .on_change(Value::String(filter.as_str().to_string()));
            }
            (StoreArea::Synced, synced_keys::USER_SETTINGS) => {
                let settings = match &change.new_value {
                    Some(value) => UserSettings::from_value(value),
                    None => core.state.borrow().settings.clone(),
                };
                core.user_settings.suppress_next_write();
                core.state.send_if_modified(|s| {
                    if s.settings != settings {
                        s.settings = settings.clone();
                        true
                    } else {
                        false
                    }
                });
                match serde_json::to_value(&settings) {
                    Ok(value) => core.user_settings.on_change(value),
                    Err(e) => warn!(error = %e, "Failed to serialize user settings"),
                }
            }
            (area, key) => {
                // Cache keys and anything else are not surface state.
                debug!(area = %area, key, "Ignoring unwatched key change");
            }
        }
    }
}

fn platforms_from_value(value: &Value) -> Option<Vec<String>> {
    value.as_array().map(|items| {
        items
            .iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect()
    })
}
