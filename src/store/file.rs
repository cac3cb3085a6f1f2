use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::warn;

use super::kv::{ChangeBatch, KeyChange, KeyValueStore, StoreArea, StoreError};

/// Application name used for the default store directory.
const APP_NAME: &str = "contestwatch";

/// Capacity of each area's change-notification channel.
const CHANNEL_CAPACITY: usize = 32;

struct AreaFile {
    path: PathBuf,
    lock: Mutex<()>,
    events: broadcast::Sender<ChangeBatch>,
}

impl AreaFile {
    fn new(dir: &PathBuf, area: StoreArea) -> Self {
        let (events, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            path: dir.join(format!("{}.json", area.as_str())),
            lock: Mutex::new(()),
            events,
        }
    }
}

/// Store implementation persisting each area as one JSON file.
///
/// A corrupt or unreadable area file is treated as empty rather than
/// failing reads; the next write replaces it.
pub struct FileStore {
    synced: AreaFile,
    local: AreaFile,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Result<Self, StoreError> {
        std::fs::create_dir_all(&dir).map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        Ok(Self {
            synced: AreaFile::new(&dir, StoreArea::Synced),
            local: AreaFile::new(&dir, StoreArea::Local),
        })
    }

    /// Default per-user store location.
    pub fn default_dir() -> Result<PathBuf, StoreError> {
        let data_dir = dirs::data_local_dir().ok_or(StoreError::Unavailable)?;
        Ok(data_dir.join(APP_NAME))
    }

    fn area(&self, area: StoreArea) -> &AreaFile {
        match area {
            StoreArea::Synced => &self.synced,
            StoreArea::Local => &self.local,
        }
    }

    fn read_entries(&self, area: StoreArea) -> Result<BTreeMap<String, Value>, StoreError> {
        let path = &self.area(area).path;
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents =
            std::fs::read_to_string(path).map_err(|e| StoreError::ReadFailed(e.to_string()))?;
        match serde_json::from_str(&contents) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!(area = %area, error = %e, "Corrupt store file, treating area as empty");
                Ok(BTreeMap::new())
            }
        }
    }

    fn write_entries(
        &self,
        area: StoreArea,
        entries: &BTreeMap<String, Value>,
    ) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(entries)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))?;
        std::fs::write(&self.area(area).path, contents)
            .map_err(|e| StoreError::WriteFailed(e.to_string()))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(
        &self,
        area: StoreArea,
        keys: &[&str],
    ) -> Result<BTreeMap<String, Value>, StoreError> {
        let state = self.area(area);
        let _guard = state.lock.lock().map_err(|_| StoreError::Unavailable)?;
        let entries = self.read_entries(area)?;
        Ok(keys
            .iter()
            .filter_map(|key| entries.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect())
    }

    async fn set(
        &self,
        area: StoreArea,
        new_entries: BTreeMap<String, Value>,
    ) -> Result<(), StoreError> {
        let state = self.area(area);
        let changes = {
            let _guard = state.lock.lock().map_err(|_| StoreError::Unavailable)?;
            let mut entries = self.read_entries(area)?;
            let changes = new_entries
                .into_iter()
                .map(|(key, value)| {
                    let old_value = entries.insert(key.clone(), value.clone());
                    KeyChange {
                        key,
                        old_value,
                        new_value: Some(value),
                    }
                })
                .collect::<Vec<_>>();
            self.write_entries(area, &entries)?;
            changes
        };

        if !changes.is_empty() {
            let _ = state.events.send(ChangeBatch { area, changes });
        }
        Ok(())
    }

    async fn remove(&self, area: StoreArea, keys: &[&str]) -> Result<(), StoreError> {
        let state = self.area(area);
        let changes = {
            let _guard = state.lock.lock().map_err(|_| StoreError::Unavailable)?;
            let mut entries = self.read_entries(area)?;
            let changes = keys
                .iter()
                .filter_map(|key| {
                    entries.remove(*key).map(|old_value| KeyChange {
                        key: key.to_string(),
                        old_value: Some(old_value),
                        new_value: None,
                    })
                })
                .collect::<Vec<_>>();
            if !changes.is_empty() {
                self.write_entries(area, &entries)?;
            }
            changes
        };

        if !changes.is_empty() {
            let _ = state.events.send(ChangeBatch { area, changes });
        }
        Ok(())
    }

    fn watch(&self, area: StoreArea) -> broadcast::Receiver<ChangeBatch> {
        self.area(area).events.subscribe()
    }
}
