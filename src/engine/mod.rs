//! Entity engine subsystem
//!
//! Generic create/read/update/delete/search over every registered type.
//!
//! # Invariants
//!
//! - Identity (`id`, `type`, creation time) never changes after create
//! - `updated_at` strictly increases on every successful write
//! - Invalid payloads are never persisted
//! - Search is scoped to one type; filters are OR-combined

mod engine;
mod errors;
mod filters;
mod query;
mod sorter;

pub use engine::EntityEngine;
pub use errors::{EngineError, EngineResult};
pub use filters::{FieldFilter, FilterSet};
pub use query::{
    sanitize_field_name, Limits, SearchQuery, SortDirection, SortKey, DEFAULT_LIMIT, MAX_LIMIT,
};
pub use sorter::RecordSorter;
