//! Field filtering for search
//!
//! A filter is a trimmed, case-insensitive substring test on one field.
//! Several filters are OR-combined: a record is kept if any filter matches.

use serde_json::{Map, Value};

/// Substring test against one top-level field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    field: String,
    needle: String,
}

impl FieldFilter {
    pub fn new(field: impl Into<String>, needle: &str) -> Self {
        Self {
            field: field.into(),
            needle: needle.trim().to_lowercase(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn needle(&self) -> &str {
        &self.needle
    }

    /// Missing fields never match.
    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        fields
            .get(&self.field)
            .is_some_and(|value| self.value_matches(value))
    }

    fn value_matches(&self, value: &Value) -> bool {
        match value {
            Value::String(s) => s.to_lowercase().contains(&self.needle),
            Value::Number(n) => n.to_string().contains(&self.needle),
            Value::Bool(b) => b.to_string().contains(&self.needle),
            Value::Array(items) => items.iter().any(|item| self.value_matches(item)),
            Value::Null | Value::Object(_) => false,
        }
    }
}

/// OR-combination of field filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    filters: Vec<FieldFilter>,
}

impl FilterSet {
    pub fn new(filters: Vec<FieldFilter>) -> Self {
        Self { filters }
    }

    /// An empty set matches everything.
    pub fn matches(&self, fields: &Map<String, Value>) -> bool {
        self.filters.is_empty() || self.filters.iter().any(|f| f.matches(fields))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldFilter> {
        self.filters.iter()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
