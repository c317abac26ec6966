//! Schema type definitions
//!
//! A `SchemaDefinition` is built once per schema document at load time and is
//! immutable for the lifetime of the registry that owns it.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::errors::{SchemaError, SchemaResult};
use super::visit;

/// Lexical shape of a storage identifier (and of foreign-key references).
pub const OBJECT_ID_PATTERN: &str = "^[0-9a-fA-F]{24}$";

/// `format` value marking a string node as a reference to another entity.
pub const FOREIGN_KEY_FORMAT: &str = "objectid";

/// Shape substituted for a `$ref` edge that closes a reference cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaceholderMode {
    /// `{"type": "object"}`
    #[default]
    Object,
    /// A string holding the identifier of the referenced entity
    ForeignKey,
    /// A URI string pointing at the referenced entity
    Uri,
}

impl PlaceholderMode {
    /// Returns the schema fragment used in place of a cyclic reference
    pub fn placeholder(&self) -> Value {
        match self {
            PlaceholderMode::Object => json!({ "type": "object" }),
            PlaceholderMode::ForeignKey => json!({
                "type": "string",
                "format": FOREIGN_KEY_FORMAT,
                "pattern": OBJECT_ID_PATTERN,
            }),
            PlaceholderMode::Uri => json!({ "type": "string", "format": "uri" }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceholderMode::Object => "object",
            PlaceholderMode::ForeignKey => "foreign-key",
            PlaceholderMode::Uri => "uri",
        }
    }
}

impl fmt::Display for PlaceholderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlaceholderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "object" => Ok(PlaceholderMode::Object),
            "foreign-key" | "foreign_key" | "objectid" => Ok(PlaceholderMode::ForeignKey),
            "uri" => Ok(PlaceholderMode::Uri),
            other => Err(format!("unknown placeholder mode '{}'", other)),
        }
    }
}

/// Adds the storage identifier pattern to every `{type: string, format:
/// objectid}` node that does not already carry a pattern. The format marker
/// stays in place for introspection.
pub fn annotate_foreign_keys(schema: &mut Value) {
    visit::visit_mut(schema, &mut |node| {
        let Value::Object(map) = node else {
            return;
        };
        let is_foreign_key = map.get("type").and_then(Value::as_str) == Some("string")
            && map.get("format").and_then(Value::as_str) == Some(FOREIGN_KEY_FORMAT);
        if is_foreign_key && !map.contains_key("pattern") {
            map.insert("pattern".into(), Value::String(OBJECT_ID_PATTERN.into()));
        }
    });
}

/// A loaded entity type: the authored schema, its dereferenced form and the
/// compiled validator for it.
pub struct SchemaDefinition {
    type_name: String,
    source: PathBuf,
    raw_schema: Value,
    resolved_schema: Value,
    storage_collection: String,
    replaced_reference_paths: BTreeMap<String, String>,
    validator: jsonschema::Validator,
}

impl SchemaDefinition {
    /// Compiles the resolved schema into a definition.
    ///
    /// A resolved schema the validator cannot compile is a load error for
    /// the document it came from.
    pub fn compile(
        type_name: impl Into<String>,
        source: impl Into<PathBuf>,
        raw_schema: Value,
        resolved_schema: Value,
        storage_collection: impl Into<String>,
        replaced_reference_paths: BTreeMap<String, String>,
    ) -> SchemaResult<Self> {
        let source = source.into();
        let validator = jsonschema::options()
            .should_validate_formats(true)
            .build(&resolved_schema)
            .map_err(|e| SchemaError::load(&source, format!("Invalid schema: {}", e)))?;

        Ok(Self {
            type_name: type_name.into(),
            source,
            raw_schema,
            resolved_schema,
            storage_collection: storage_collection.into(),
            replaced_reference_paths,
            validator,
        })
    }

    /// Normalized type identifier (the record discriminator)
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Document the definition was loaded from, relative to the schema root
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// The schema as authored
    pub fn raw_schema(&self) -> &Value {
        &self.raw_schema
    }

    /// The dereferenced schema used for validation
    pub fn resolved_schema(&self) -> &Value {
        &self.resolved_schema
    }

    /// Logical bucket records of this type are stored in
    pub fn storage_collection(&self) -> &str {
        &self.storage_collection
    }

    /// JSON pointer → authored `$ref` for every edge replaced to break a cycle
    pub fn replaced_reference_paths(&self) -> &BTreeMap<String, String> {
        &self.replaced_reference_paths
    }

    /// Whether cycle breaking substituted any references
    pub fn is_partially_resolved(&self) -> bool {
        !self.replaced_reference_paths.is_empty()
    }

    pub(crate) fn validator(&self) -> &jsonschema::Validator {
        &self.validator
    }
}

impl fmt::Debug for SchemaDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaDefinition")
            .field("type_name", &self.type_name)
            .field("source", &self.source)
            .field("storage_collection", &self.storage_collection)
            .field("replaced_reference_paths", &self.replaced_reference_paths)
            .finish_non_exhaustive()
    }
}
