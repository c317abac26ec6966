//! Schema error types
//!
//! Error codes:
//! - SCHEMA_CONFIGURATION_ERROR (FATAL) - schema root missing or unusable
//! - SCHEMA_LOAD_ERROR (FATAL) - a document failed to parse, resolve or compile
//!
//! Both are startup errors: a registry is published whole or not at all.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Errors raised while building the schema registry.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The schema root directory is missing or is not a directory
    #[error("Schema root '{}' is not usable: {reason}", path.display())]
    Configuration { path: PathBuf, reason: String },

    /// A single schema document could not be loaded
    #[error("Failed to load schema document '{}': {reason}", document.display())]
    Load { document: PathBuf, reason: String },
}

impl SchemaError {
    /// Create a configuration error for the schema root
    pub fn configuration(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a load error naming the offending document
    pub fn load(document: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Load {
            document: document.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::Configuration { .. } => "SCHEMA_CONFIGURATION_ERROR",
            SchemaError::Load { .. } => "SCHEMA_LOAD_ERROR",
        }
    }

    /// Returns the document that failed, if the error is document-specific
    pub fn document(&self) -> Option<&Path> {
        match self {
            SchemaError::Load { document, .. } => Some(document),
            SchemaError::Configuration { .. } => None,
        }
    }
}

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// A single validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Field path (e.g., "address.city", "tags[1]", "$root")
    pub field: String,
    /// Schema keyword that rejected the value (e.g., "required", "format")
    pub keyword: String,
    /// Human-readable message
    pub message: String,
}

impl Violation {
    pub fn new(
        field: impl Into<String>,
        keyword: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            keyword: keyword.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}': {} ({})", self.field, self.message, self.keyword)
    }
}

/// Outcome of validating one document. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    violations: Vec<Violation>,
}

impl ValidationResult {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// A result carrying exactly one violation
    pub fn single(violation: Violation) -> Self {
        Self {
            violations: vec![violation],
        }
    }

    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations in the order the validator reported them
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.violations.is_empty() {
            return write!(f, "valid");
        }
        let parts: Vec<String> = self.violations.iter().map(|v| v.to_string()).collect();
        write!(f, "{}", parts.join("; "))
    }
}
