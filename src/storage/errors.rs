//! Storage error types
//!
//! Error codes:
//! - STORAGE_DUPLICATE_ID - an insert collided with an existing record
//! - STORAGE_LOCK_POISONED - a writer panicked while holding the store
//!
//! Storage failures are never retried; they surface as server errors.

use thiserror::Error;

use super::record::RecordId;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Record '{id}' already exists in collection '{collection}'")]
    DuplicateId { collection: String, id: RecordId },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

impl StorageError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::DuplicateId { .. } => "STORAGE_DUPLICATE_ID",
            StorageError::LockPoisoned => "STORAGE_LOCK_POISONED",
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
