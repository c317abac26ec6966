//! Engine error types
//!
//! Error codes:
//! - ENTITY_UNKNOWN_TYPE - the type is not in the registry
//! - ENTITY_VALIDATION_FAILED - the payload violates the schema
//! - ENTITY_MALFORMED_ID - the identifier is not 24 hex chars
//! - ENTITY_NOT_FOUND - no record, or a record of another type
//! - ENTITY_INTEGRITY_ERROR - a stored record's type is no longer registered
//! - STORAGE_* - propagated from the store

use thiserror::Error;

use crate::schema::ValidationResult;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unknown entity type '{0}'")]
    UnknownType(String),

    #[error("Validation failed: {0}")]
    Validation(ValidationResult),

    #[error("Malformed identifier '{0}'")]
    MalformedIdentifier(String),

    #[error("Entity '{id}' not found")]
    NotFound { id: String },

    #[error("Entity '{id}' has unregistered type '{type_name}'")]
    Integrity { id: String, type_name: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl EngineError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::UnknownType(_) => "ENTITY_UNKNOWN_TYPE",
            EngineError::Validation(_) => "ENTITY_VALIDATION_FAILED",
            EngineError::MalformedIdentifier(_) => "ENTITY_MALFORMED_ID",
            EngineError::NotFound { .. } => "ENTITY_NOT_FOUND",
            EngineError::Integrity { .. } => "ENTITY_INTEGRITY_ERROR",
            EngineError::Storage(e) => e.code(),
        }
    }

    pub(crate) fn not_found(id: impl ToString) -> Self {
        EngineError::NotFound { id: id.to_string() }
    }
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;
