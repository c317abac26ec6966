//! Output projection of stored records
//!
//! Two representations:
//! - plain JSON: user fields plus `id`/`type`
//! - linked data: user fields plus `@id`, `@type` and `@context`
//!
//! Both strip `_` bookkeeping keys at every depth and drop object members
//! whose value is an empty array or empty object.

use serde_json::{Map, Value};

use crate::schema::{strip_internal_fields, visit};
use crate::storage::EntityRecord;

/// Context emitted when none is configured
pub const DEFAULT_CONTEXT: &str = "http://schema.org/";

const LINKED_DATA_MEDIA_TYPE: &str = "application/ld+json";

/// Requested output form
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Representation {
    #[default]
    Json,
    LinkedData,
}

impl Representation {
    /// Linked data when the Accept header names `application/ld+json`.
    pub fn from_accept(accept: Option<&str>) -> Self {
        match accept {
            Some(value) if value.to_ascii_lowercase().contains(LINKED_DATA_MEDIA_TYPE) => {
                Representation::LinkedData
            }
            _ => Representation::Json,
        }
    }

    /// Content type of responses in this representation
    pub fn content_type(&self) -> &'static str {
        match self {
            Representation::Json => "application/json",
            Representation::LinkedData => LINKED_DATA_MEDIA_TYPE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Serializer {
    base_uri: Option<String>,
    context: String,
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Serializer {
    pub fn new(base_uri: Option<String>) -> Self {
        Self {
            base_uri: base_uri
                .map(|uri| uri.trim_end_matches('/').to_string())
                .filter(|uri| !uri.is_empty()),
            context: DEFAULT_CONTEXT.to_string(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn base_uri(&self) -> Option<&str> {
        self.base_uri.as_deref()
    }

    /// Plain JSON form. With a base URI configured, identity is emitted as
    /// `@id`/`@type` URIs instead of `id`/`type`.
    pub fn to_public(&self, record: &EntityRecord) -> Value {
        let mut out = user_fields(record);
        match &self.base_uri {
            Some(base) => {
                out.insert("@id".into(), Value::String(entity_uri(base, record)));
                out.insert("@type".into(), Value::String(type_uri(base, &record.type_name)));
            }
            None => {
                out.insert("id".into(), Value::String(record.id.to_string()));
                out.insert("type".into(), Value::String(record.type_name.clone()));
            }
        }
        Value::Object(out)
    }

    /// Linked-data form with `@id`, `@type` and `@context`.
    pub fn to_linked_data(&self, record: &EntityRecord) -> Value {
        let mut out = user_fields(record);
        let base = self.base_uri.as_deref().unwrap_or("");
        out.insert("@context".into(), Value::String(self.context.clone()));
        out.insert("@id".into(), Value::String(entity_uri(base, record)));
        out.insert("@type".into(), Value::String(type_uri(base, &record.type_name)));
        Value::Object(out)
    }

    pub fn project(&self, record: &EntityRecord, representation: Representation) -> Value {
        match representation {
            Representation::Json => self.to_public(record),
            Representation::LinkedData => self.to_linked_data(record),
        }
    }

    pub fn project_all(&self, records: &[EntityRecord], representation: Representation) -> Value {
        Value::Array(
            records
                .iter()
                .map(|record| self.project(record, representation))
                .collect(),
        )
    }
}

/// Removes object members whose value is an empty array or empty object,
/// innermost first, so members emptied by pruning are pruned as well.
pub fn prune_empty(value: &mut Value) {
    visit::visit_mut(value, &mut |node| {
        if let Value::Object(map) = node {
            map.retain(|_, member| !is_empty_container(member));
        }
    });
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn user_fields(record: &EntityRecord) -> Map<String, Value> {
    let mut document = Value::Object(record.fields.clone());
    strip_internal_fields(&mut document);
    prune_empty(&mut document);
    match document {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn entity_uri(base: &str, record: &EntityRecord) -> String {
    format!("{}/{}/{}", base, record.type_name, record.id)
}

fn type_uri(base: &str, type_name: &str) -> String {
    format!("{}/{}", base, type_name)
}
