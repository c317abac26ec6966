//! Record store abstraction
//!
//! Records are grouped into named collections. The engine owns all
//! validation; a store persists exactly what it is handed.

use super::errors::StorageResult;
use super::record::{EntityRecord, RecordId};

pub trait RecordStore: Send + Sync {
    /// Persists a new record. Fails if the id is already present.
    fn insert(&self, collection: &str, record: EntityRecord) -> StorageResult<()>;

    fn get(&self, collection: &str, id: &RecordId) -> StorageResult<Option<EntityRecord>>;

    /// Replaces a stored record whole. Returns false if it was absent.
    fn replace(&self, collection: &str, record: EntityRecord) -> StorageResult<bool>;

    /// Removes a record. Returns false if it was absent.
    fn remove(&self, collection: &str, id: &RecordId) -> StorageResult<bool>;

    /// Every record in the collection whose type is `type_name`, in id order.
    fn scan(&self, collection: &str, type_name: &str) -> StorageResult<Vec<EntityRecord>>;
}
