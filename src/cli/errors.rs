//! CLI-specific error types
//!
//! All CLI errors are fatal: the process prints the error and exits non-zero.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::schema::SchemaError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("CLI_CONFIG_ERROR: {0}")]
    Config(#[from] ConfigError),

    #[error("{code}: {0}", code = .0.code())]
    SchemaLoad(#[from] SchemaError),

    #[error("CLI_BOOT_FAILED: {0}")]
    Boot(String),

    #[error("CLI_IO_ERROR: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    pub fn boot_failed(msg: impl Into<String>) -> Self {
        Self::Boot(msg.into())
    }

    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "CLI_CONFIG_ERROR",
            CliError::SchemaLoad(e) => e.code(),
            CliError::Boot(_) => "CLI_BOOT_FAILED",
            CliError::Io(_) => "CLI_IO_ERROR",
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
