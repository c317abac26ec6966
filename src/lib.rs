//! schemadb - a schema-driven document store
//!
//! JSON Schema documents on disk define entity types. Every registered type
//! gets validated create/read/update/delete and field search over HTTP,
//! with plain JSON or linked-data output.

pub mod cli;
pub mod config;
pub mod engine;
pub mod observability;
pub mod rest_api;
pub mod schema;
pub mod serialize;
pub mod storage;
