//! Schema registry subsystem
//!
//! Schemas are declarative JSON Schema documents loaded once at startup.
//!
//! # Design Principles
//!
//! - One document per entity type, discovered from the schema root
//! - Every `$ref` is inlined; only edges that close a cycle are replaced
//! - The registry is immutable once published
//! - Validation happens before every persist
//! - Validation never mutates the caller's document

mod errors;
mod loader;
mod registry;
mod resolver;
mod temporal;
mod types;
mod validator;
pub mod visit;

pub use errors::{SchemaError, SchemaResult, ValidationResult, Violation};
pub use loader::{type_name_for, LoaderConfig, SchemaLoader, DEFAULT_COLLECTION};
pub use registry::SchemaRegistry;
pub use resolver::{resolve, DocumentSet, ResolvedSchema};
pub use temporal::{canonical_date_time, normalize_temporal};
pub use types::{
    annotate_foreign_keys, PlaceholderMode, SchemaDefinition, FOREIGN_KEY_FORMAT,
    OBJECT_ID_PATTERN,
};
pub use validator::{strip_internal_fields, SchemaValidator, ROOT_FIELD};
