use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use futures::future::{AbortHandle, Abortable};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::api::ApiError;
use crate::config::{local_keys, synced_keys, CACHE_TTL_HOURS};
use crate::models::{RawContest, UserSettings};
use crate::store::{KeyValueStore, StoreArea};

/// Seam between the cache and the remote API, stubbed in tests.
#[async_trait]
pub trait ContestFetcher: Send + Sync {
    async fn fetch_contests(
        &self,
        settings: &UserSettings,
        now: DateTime<Utc>,
    ) -> Result<Vec<RawContest>, ApiError>;
}

/// Loading phase of the cache, published through the state channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Error,
}

/// Observable cache state for the owning surface.
#[derive(Debug, Clone, Default)]
pub struct CacheState {
    pub phase: CachePhase,
    pub contests: Vec<RawContest>,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// Outcome of a single `load` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Served from the store without network access.
    Cached,
    /// Fetched from the API and written back with a fresh timestamp.
    Fetched,
    /// Superseded or aborted mid-flight. Not an error: no store write, no
    /// state mutation.
    Cancelled,
}

struct Inflight {
    generation: u64,
    handle: Option<AbortHandle>,
}

/// TTL cache over the remote contest list.
pub struct ContestCache {
    store: Arc<dyn KeyValueStore>,
    fetcher: Arc<dyn ContestFetcher>,
    state: watch::Sender<CacheState>,
    inflight: Mutex<Inflight>,
}

impl ContestCache {
    pub fn new(store: Arc<dyn KeyValueStore>, fetcher: Arc<dyn ContestFetcher>) -> Self {
        let (state, _) = watch::channel(CacheState::default());
        Self {
            store,
            fetcher,
            state,
            inflight: Mutex::new(Inflight {
                generation: 0,
                handle: None,
            }),
        }
    }

    /// Observe loading state and the current contest list.
    pub fn state(&self) -> watch::Receiver<CacheState> {
        self.state.subscribe()
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> CacheState {
        self.state.borrow().clone()
    }

    /// Return contests, fetching only when the cache is absent or stale.
    ///
    /// With `force` set, or when no fresh cache exists, the remote API is
    /// queried and the record list is written back to the store together
    /// with its fetch timestamp. A fresh timestamp whose record list is
    /// missing or malformed falls through to a live fetch rather than
    /// returning a phantom empty result. Starting a new load aborts a
    /// prior in-flight fetch.
    pub async fn load(&self, force: bool) -> Result<LoadOutcome> {
        self.state.send_modify(|s| {
            s.phase = CachePhase::Loading;
            s.error = None;
        });

        if !force {
            if let Some((contests, fetched_at)) =
                self.read_fresh_cache().await.map_err(|e| self.fail(e))?
            {
                self.state.send_modify(|s| {
                    s.phase = CachePhase::Ready;
                    s.contests = contests;
                    s.last_fetched_at = Some(fetched_at);
                });
                return Ok(LoadOutcome::Cached);
            }
        }

        let settings = self.read_settings().await.map_err(|e| self.fail(e))?;

        let (handle, registration) = AbortHandle::new_pair();
        let generation = {
            let mut inflight = self.lock_inflight();
            if let Some(previous) = inflight.handle.replace(handle) {
                previous.abort();
            }
            inflight.generation += 1;
            inflight.generation
        };

        let fetch = self.fetcher.fetch_contests(&settings, Utc::now());
        let fetched = match Abortable::new(fetch, registration).await {
            Err(futures::future::Aborted) => {
                debug!("Contest fetch aborted");
                return Ok(LoadOutcome::Cancelled);
            }
            Ok(result) => result,
        };

        // A newer load may have started while the response was in flight;
        // its generation supersedes ours and we must not write.
        {
            let mut inflight = self.lock_inflight();
            if inflight.generation != generation {
                debug!("Contest fetch superseded before write-back");
                return Ok(LoadOutcome::Cancelled);
            }
            inflight.handle = None;
        }

        let contests = match fetched {
            Ok(contests) => contests,
            Err(e) => {
                self.state.send_modify(|s| {
                    s.phase = CachePhase::Error;
                    s.contests = Vec::new();
                    s.error = Some(e.to_string());
                });
                return Err(e).context("Failed to fetch contests");
            }
        };

        let fetched_at = Utc::now();
        let entries = BTreeMap::from([
            (
                local_keys::CONTESTS.to_string(),
                serde_json::to_value(&contests).context("Failed to serialize contests")?,
            ),
            (
                local_keys::TIME_STAMP.to_string(),
                Value::String(fetched_at.to_rfc3339()),
            ),
        ]);
        if let Err(e) = self.store.set(StoreArea::Local, entries).await {
            let error = anyhow::Error::new(e).context("Failed to write contest cache");
            return Err(self.fail(error));
        }

        self.state.send_modify(|s| {
            s.phase = CachePhase::Ready;
            s.contests = contests;
            s.last_fetched_at = Some(fetched_at);
        });
        Ok(LoadOutcome::Fetched)
    }

    /// Delete the cache entry, then load fresh data unconditionally.
    ///
    /// The next read is never stale: even if the delete races with a
    /// concurrent read, readers re-check the stored timestamp rather than
    /// assuming cache presence.
    pub async fn refresh(&self) -> Result<LoadOutcome> {
        self.store
            .remove(
                StoreArea::Local,
                &[local_keys::CONTESTS, local_keys::TIME_STAMP],
            )
            .await
            .context("Failed to clear contest cache")
            .map_err(|e| self.fail(e))?;
        self.load(true).await
    }

    /// Abort any in-flight fetch. Runs on surface unmount; an aborted
    /// fetch never writes to the cache.
    pub fn cancel(&self) {
        let mut inflight = self.lock_inflight();
        if let Some(handle) = inflight.handle.take() {
            handle.abort();
        }
        inflight.generation += 1;
    }

    /// Record a failed operation in the published state and hand the error
    /// back to the caller.
    fn fail(&self, error: anyhow::Error) -> anyhow::Error {
        self.state.send_modify(|s| {
            s.phase = CachePhase::Error;
            s.error = Some(error.to_string());
        });
        error
    }

    /// The stored `(records, fetchedAt)` pair, if present and younger than
    /// the TTL. A malformed timestamp or record list is treated as absent.
    async fn read_fresh_cache(&self) -> Result<Option<(Vec<RawContest>, DateTime<Utc>)>> {
        let entries = self
            .store
            .get(
                StoreArea::Local,
                &[local_keys::CONTESTS, local_keys::TIME_STAMP],
            )
            .await
            .context("Failed to read contest cache")?;

        let fetched_at = match entries
            .get(local_keys::TIME_STAMP)
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        {
            Some(stamp) => stamp.with_timezone(&Utc),
            None => return Ok(None),
        };

        if Utc::now() - fetched_at >= Duration::hours(CACHE_TTL_HOURS) {
            return Ok(None);
        }

        match entries.get(local_keys::CONTESTS) {
            Some(value) => match serde_json::from_value::<Vec<RawContest>>(value.clone()) {
                Ok(contests) => Ok(Some((contests, fetched_at))),
                Err(e) => {
                    warn!(error = %e, "Cached contest list is malformed, refetching");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn read_settings(&self) -> Result<UserSettings> {
        let mut entries = self
            .store
            .get(StoreArea::Synced, &[synced_keys::USER_SETTINGS])
            .await
            .context("Failed to read user settings")?;
        Ok(entries
            .remove(synced_keys::USER_SETTINGS)
            .map(|value| UserSettings::from_value(&value))
            .unwrap_or_default())
    }

    fn lock_inflight(&self) -> MutexGuard<'_, Inflight> {
        self.inflight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
