// ── In-memory debounce store ──

use dashmap::DashMap;

use super::{DebounceStore, StoreError};
use crate::model::{DebounceKey, DebounceRecord};

/// Non-durable store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<DebounceKey, DebounceRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from an existing set of records, e.g. a durable store's
    /// contents, so a dry run sees real history without writing to it.
    pub fn from_entries(entries: impl IntoIterator<Item = (DebounceKey, DebounceRecord)>) -> Self {
        let records = DashMap::new();
        for (key, record) in entries {
            records.insert(key, record);
        }
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl DebounceStore for MemoryStore {
    fn get(&self, key: &DebounceKey) -> Result<Option<DebounceRecord>, StoreError> {
        Ok(self.records.get(key).map(|r| *r.value()))
    }

    fn put(&self, key: &DebounceKey, record: DebounceRecord) -> Result<(), StoreError> {
        self.records.insert(key.clone(), record);
        Ok(())
    }

    fn clear(&self, key: &DebounceKey) -> Result<(), StoreError> {
        self.records.remove(key);
        Ok(())
    }

    fn entries(&self) -> Result<Vec<(DebounceKey, DebounceRecord)>, StoreError> {
        let mut out: Vec<_> = self
            .records
            .iter()
            .map(|e| (e.key().clone(), *e.value()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::ConditionKind;

    #[test]
    fn put_get_clear() {
        let store = MemoryStore::new();
        let key = DebounceKey::new("LP-01", ConditionKind::NoHub);

        assert_eq!(store.get(&key).unwrap(), None);
        store.put(&key, DebounceRecord::first()).unwrap();
        assert_eq!(store.get(&key).unwrap(), Some(DebounceRecord::first()));
        store.clear(&key).unwrap();
        assert_eq!(store.get(&key).unwrap(), None);
        store.clear(&key).unwrap();
    }

    #[test]
    fn conditions_are_independent_keys() {
        let store = MemoryStore::new();
        let hub = DebounceKey::new("LP-01", ConditionKind::NoHub);
        let docked = DebounceKey::new("LP-01", ConditionKind::NoDevices);

        store.put(&hub, DebounceRecord::first().advanced()).unwrap();
        assert_eq!(store.get(&docked).unwrap(), None);
        assert_eq!(store.entries().unwrap().len(), 1);
    }
}
