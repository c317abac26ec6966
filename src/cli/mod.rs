//! CLI module for schemadb
//!
//! - serve: load schemas, then serve the REST API
//! - schemas: load schemas and print the registry

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{run, run_command, schemas, serve};
pub use errors::{CliError, CliResult};
