use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

/// An isolated namespace within the store, with its own change stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreArea {
    /// Credentials and feature toggles, synced across devices by the host.
    Synced,
    /// Platform/time preferences and the contest cache.
    Local,
}

impl StoreArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreArea::Synced => "synced",
            StoreArea::Local => "local",
        }
    }
}

impl std::fmt::Display for StoreArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One key's transition within a change batch.
#[derive(Debug, Clone)]
pub struct KeyChange {
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

/// The set of key changes applied to one area by a single store operation.
#[derive(Debug, Clone)]
pub struct ChangeBatch {
    pub area: StoreArea,
    pub changes: Vec<KeyChange>,
}

impl ChangeBatch {
    /// The new value for `key` in this batch, if that key changed.
    pub fn new_value(&self, key: &str) -> Option<&Option<Value>> {
        self.changes
            .iter()
            .find(|change| change.key == key)
            .map(|change| &change.new_value)
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage is not available in this context")]
    Unavailable,

    #[error("storage read failed: {0}")]
    ReadFailed(String),

    #[error("storage write failed: {0}")]
    WriteFailed(String),
}

/// Async key-value store with two areas and per-area change notifications.
///
/// Change batches produced by a surface's own writes are delivered to that
/// surface too; echo suppression is the subscriber's concern.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(
        &self,
        area: StoreArea,
        keys: &[&str],
    ) -> Result<BTreeMap<String, Value>, StoreError>;

    async fn set(
        &self,
        area: StoreArea,
        entries: BTreeMap<String, Value>,
    ) -> Result<(), StoreError>;

    async fn remove(&self, area: StoreArea, keys: &[&str]) -> Result<(), StoreError>;

    /// Subscribe to change batches for one area.
    fn watch(&self, area: StoreArea) -> broadcast::Receiver<ChangeBatch>;
}

/// Read one key, deserializing into `T`. Malformed stored values are logged
/// and treated as absent.
pub async fn get_value<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    area: StoreArea,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let mut entries = store.get(area, &[key]).await?;
    match entries.remove(key) {
        Some(value) => match serde_json::from_value(value) {
            Ok(typed) => Ok(Some(typed)),
            Err(e) => {
                debug!(area = %area, key, error = %e, "Malformed stored value, treating as absent");
                Ok(None)
            }
        },
        None => Ok(None),
    }
}

/// Write one key as the JSON form of `value`.
pub async fn set_value<T: Serialize>(
    store: &dyn KeyValueStore,
    area: StoreArea,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let json = serde_json::to_value(value).map_err(|e| StoreError::WriteFailed(e.to_string()))?;
    store
        .set(area, BTreeMap::from([(key.to_string(), json)]))
        .await
}
