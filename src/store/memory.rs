//! In-memory store, not durable across restarts.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{PersistentStore, StoreError, StoreRecord};

/// A [`PersistentStore`] backed by a locked `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<Vec<u8>, StoreRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full record for `key`, including its creation time.
    pub fn record(&self, key: &[u8]) -> Option<StoreRecord> {
        self.records.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl PersistentStore for MemoryStore {
    fn create_or_update(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        let mut records = self.records.write();
        match records.get_mut(key) {
            Some(record) => record.value = value.to_vec(),
            None => {
                records.insert(key.to_vec(), StoreRecord::new(value.to_vec()));
            }
        }
        Ok(())
    }

    fn read(&self, key: &[u8]) -> Result<Vec<u8>, StoreError> {
        self.records
            .read()
            .get(key)
            .map(|r| r.value.clone())
            .ok_or(StoreError::NotFound)
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.records
            .write()
            .remove(key)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}
