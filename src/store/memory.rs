use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use super::kv::{ChangeBatch, KeyChange, KeyValueStore, StoreArea, StoreError};

/// Capacity of each area's change-notification channel.
const CHANNEL_CAPACITY: usize = 32;

struct AreaState {
    entries: Mutex<BTreeMap<String, Value>>,
    events: broadcast::Sender<ChangeBatch>,
}

impl AreaState {
    fn new() -> Self {
        let (events, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            entries: Mutex::new(BTreeMap::new()),
            events,
        }
    }
}

/// In-process store implementation.
///
/// Used by the test suite and by embedders that bring their own persistence
/// layer but still want the shared-state semantics.
pub struct MemoryStore {
    synced: AreaState,
    local: AreaState,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            synced: AreaState::new(),
            local: AreaState::new(),
        }
    }

    fn area(&self, area: StoreArea) -> &AreaState {
        match area {
            StoreArea::Synced => &self.synced,
            StoreArea::Local => &self.local,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(
        &self,
        area: StoreArea,
        keys: &[&str],
    ) -> Result<BTreeMap<String, Value>, StoreError> {
        let entries = self
            .area(area)
            .entries
            .lock()
            .map_err(|_| StoreError::Unavailable)?;
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
            let mut entries = state.entries.lock().map_err(|_| StoreError::Unavailable)?;
            new_entries
                .into_iter()
                .map(|(key, value)| {
                    let old_value = entries.insert(key.clone(), value.clone());
                    KeyChange {
                        key,
                        old_value,
                        new_value: Some(value),
                    }
                })
                .collect::<Vec<_>>()
        };

        if !changes.is_empty() {
            let _ = state.events.send(ChangeBatch { area, changes });
        }
        Ok(())
    }

    async fn remove(&self, area: StoreArea, keys: &[&str]) -> Result<(), StoreError> {
        let state = self.area(area);
        let changes = {
            let mut entries = state.entries.lock().map_err(|_| StoreError::Unavailable)?;
            keys.iter()
                .filter_map(|key| {
                    entries.remove(*key).map(|old_value| KeyChange {
                        key: key.to_string(),
                        old_value: Some(old_value),
                        new_value: None,
                    })
                })
                .collect::<Vec<_>>()
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_remove_round_trip() {
        let store = MemoryStore::new();
        store
            .set(
                StoreArea::Local,
                BTreeMap::from([("hosts".to_string(), json!(["codeforces.com"]))]),
            )
            .await
            .unwrap();

        let entries = store.get(StoreArea::Local, &["hosts", "missing"]).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries["hosts"], json!(["codeforces.com"]));

        store.remove(StoreArea::Local, &["hosts"]).await.unwrap();
        assert!(store
            .get(StoreArea::Local, &["hosts"])
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_multi_key_set_is_one_batch_with_old_values() {
        let store = MemoryStore::new();
        store
            .set(
                StoreArea::Local,
                BTreeMap::from([("timeFilter".to_string(), json!("upcoming"))]),
            )
            .await
            .unwrap();

        let mut rx = store.watch(StoreArea::Local);
        store
            .set(
                StoreArea::Local,
                BTreeMap::from([
                    ("contests".to_string(), json!([])),
                    ("timeFilter".to_string(), json!("today")),
                ]),
            )
            .await
            .unwrap();

        let batch = rx.recv().await.unwrap();
        assert_eq!(batch.area, StoreArea::Local);
        assert_eq!(batch.changes.len(), 2);

        let filter_change = batch
            .changes
            .iter()
            .find(|c| c.key == "timeFilter")
            .unwrap();
        assert_eq!(filter_change.old_value, Some(json!("upcoming")));
        assert_eq!(filter_change.new_value, Some(json!("today")));

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_areas_are_isolated() {
        let store = MemoryStore::new();
        let mut synced_rx = store.watch(StoreArea::Synced);

        store
            .set(
                StoreArea::Local,
                BTreeMap::from([("hosts".to_string(), json!([]))]),
            )
            .await
            .unwrap();

        assert!(synced_rx.try_recv().is_err());
        assert!(store
            .get(StoreArea::Synced, &["hosts"])
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_remove_of_absent_key_emits_nothing() {
        let store = MemoryStore::new();
        let mut rx = store.watch(StoreArea::Local);
        store.remove(StoreArea::Local, &["missing"]).await.unwrap();
        assert!(rx.try_recv().is_err());
    }
}
