//! Runtime document validation
//!
//! Validation runs on a working copy of the document:
//! - keys beginning with `_` are storage bookkeeping and are removed
//! - top-level `id` and `type` are identity, not user data, and are removed
//! - `date-time` values are normalized to canonical UTC
//!
//! The copy is then checked against the compiled draft schema with format
//! assertion on. A document that satisfies more than one `oneOf` branch is
//! accepted; schemas in the wild routinely declare overlapping branches.
//! The caller's document is never mutated.

use jsonschema::error::ValidationErrorKind;
use jsonschema::ValidationError;
use serde_json::Value;

use super::errors::{ValidationResult, Violation};
use super::temporal::normalize_temporal;
use super::types::SchemaDefinition;
use super::visit;

/// Field path reported for violations at the document root
pub const ROOT_FIELD: &str = "$root";

/// Stateless validator over compiled schema definitions.
pub struct SchemaValidator;

impl SchemaValidator {
    /// Validates `document` against `definition`, collecting every violation.
    pub fn validate(document: &Value, definition: &SchemaDefinition) -> ValidationResult {
        let candidate = Self::prepare(document, definition);

        let violations: Vec<Violation> = definition
            .validator()
            .iter_errors(&candidate)
            .filter(|error| !is_oneof_ambiguity(error))
            .map(|error| to_violation(&candidate, &error))
            .collect();

        ValidationResult::new(violations)
    }

    /// The working copy validation actually runs against
    pub fn prepare(document: &Value, definition: &SchemaDefinition) -> Value {
        let mut candidate = document.clone();
        strip_internal_fields(&mut candidate);
        if let Value::Object(map) = &mut candidate {
            map.remove("id");
            map.remove("type");
        }
        normalize_temporal(definition.resolved_schema(), &mut candidate);
        candidate
    }
}

/// Removes every `_`-prefixed key at any depth.
pub fn strip_internal_fields(value: &mut Value) {
    visit::visit_mut(value, &mut |node| {
        if let Value::Object(map) = node {
            map.retain(|key, _| !key.starts_with('_'));
        }
    });
}

fn is_oneof_ambiguity(error: &ValidationError<'_>) -> bool {
    matches!(error.kind, ValidationErrorKind::OneOfMultipleValid { .. })
}

fn to_violation(instance: &Value, error: &ValidationError<'_>) -> Violation {
    let mut segments = pointer_segments(&error.instance_path.to_string());
    if let ValidationErrorKind::Required { property } = &error.kind {
        if let Some(name) = property.as_str() {
            segments.push(name.to_string());
        }
    }

    let keyword = pointer_segments(&error.schema_path.to_string())
        .into_iter()
        .rev()
        .find(|segment| segment.parse::<usize>().is_err())
        .unwrap_or_else(|| "schema".to_string());

    Violation::new(field_path(instance, &segments), keyword, error.to_string())
}

fn pointer_segments(pointer: &str) -> Vec<String> {
    pointer
        .split('/')
        .skip(1)
        .map(|segment| segment.replace("~1", "/").replace("~0", "~"))
        .collect()
}

/// `["tags", "1", "name"]` → `tags[1].name`; no segments → `$root`.
///
/// A segment is rendered as an index only where the instance holds an array,
/// so numeric object keys stay dotted.
fn field_path(instance: &Value, segments: &[String]) -> String {
    if segments.is_empty() {
        return ROOT_FIELD.to_string();
    }

    let mut path = String::new();
    let mut current = Some(instance);
    for segment in segments {
        match current {
            Some(Value::Array(items)) => {
                path.push('[');
                path.push_str(segment);
                path.push(']');
                current = segment.parse::<usize>().ok().and_then(|index| items.get(index));
            }
            other => {
                if !path.is_empty() {
                    path.push('.');
                }
                path.push_str(segment);
                current = other.and_then(|value| value.get(segment.as_str()));
            }
        }
    }
    path
}
