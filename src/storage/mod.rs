//! Record storage subsystem
//!
//! Holds validated entity records grouped by collection. Validation and
//! identity rules live in the engine; storage only persists.
//!
//! # Design Principles
//!
//! - Full-record writes (no partial updates)
//! - Identifiers are generated, never supplied by callers
//! - Deleted identifiers are never reused
//! - Failures surface immediately, no retries

mod errors;
mod memory;
mod record;
mod store;

pub use errors::{StorageError, StorageResult};
pub use memory::InMemoryStore;
pub use record::{
    format_timestamp, next_updated, now_millis, EntityRecord, ParseRecordIdError, RecordId,
};
pub use store::RecordStore;
