//! # REST API Module
//!
//! HTTP endpoints for schema introspection and generic CRUD/search over
//! every registered entity type.

pub mod access;
pub mod errors;
pub mod server;

pub use access::{AccessError, AccessPolicy, ApiKeyPolicy, Capability, Role, API_KEY_HEADER};
pub use errors::{ErrorResponse, RestError, RestResult};
pub use server::{build_app, serve, RestServer};
