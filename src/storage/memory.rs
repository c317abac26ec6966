//! In-process record store

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::errors::{StorageError, StorageResult};
use super::record::{EntityRecord, RecordId};
use super::store::RecordStore;

type Collections = HashMap<String, BTreeMap<RecordId, EntityRecord>>;

/// Thread-safe store holding every collection in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<Collections>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in a collection
    pub fn count(&self, collection: &str) -> StorageResult<usize> {
        Ok(self.read()?.get(collection).map_or(0, BTreeMap::len))
    }

    fn read(&self) -> StorageResult<RwLockReadGuard<'_, Collections>> {
        self.collections.read().map_err(|_| StorageError::LockPoisoned)
    }

    fn write(&self) -> StorageResult<RwLockWriteGuard<'_, Collections>> {
        self.collections.write().map_err(|_| StorageError::LockPoisoned)
    }
}

impl RecordStore for InMemoryStore {
    fn insert(&self, collection: &str, record: EntityRecord) -> StorageResult<()> {
        let mut collections = self.write()?;
        let records = collections.entry(collection.to_string()).or_default();
        if records.contains_key(&record.id) {
            return Err(StorageError::DuplicateId {
                collection: collection.to_string(),
                id: record.id,
            });
        }
        records.insert(record.id, record);
        Ok(())
    }

    fn get(&self, collection: &str, id: &RecordId) -> StorageResult<Option<EntityRecord>> {
        Ok(self
            .read()?
            .get(collection)
            .and_then(|records| records.get(id))
            .cloned())
    }

    fn replace(&self, collection: &str, record: EntityRecord) -> StorageResult<bool> {
        let mut collections = self.write()?;
        match collections
            .get_mut(collection)
            .and_then(|records| records.get_mut(&record.id))
        {
            Some(slot) => {
                *slot = record;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn remove(&self, collection: &str, id: &RecordId) -> StorageResult<bool> {
        Ok(self
            .write()?
            .get_mut(collection)
            .and_then(|records| records.remove(id))
            .is_some())
    }

    fn scan(&self, collection: &str, type_name: &str) -> StorageResult<Vec<EntityRecord>> {
        Ok(self
            .read()?
            .get(collection)
            .map(|records| {
                records
                    .values()
                    .filter(|record| record.type_name == type_name)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}
