//! Generic entity engine
//!
//! Every write follows the same order:
//! 1. Sanitize the payload (drop identity and `_` bookkeeping keys)
//! 2. Normalize temporal values
//! 3. Stamp identity and timestamps
//! 4. Validate against the type's schema
//! 5. Persist
//!
//! Nothing is persisted unless validation passes.
//!
//! Read-then-write on update is not atomic: two concurrent updates of the
//! same record both succeed and the later replace wins.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::schema::{
    normalize_temporal, strip_internal_fields, SchemaDefinition, SchemaRegistry,
    SchemaValidator, ValidationResult, Violation, DEFAULT_COLLECTION, ROOT_FIELD,
};
use crate::storage::{next_updated, EntityRecord, RecordId, RecordStore};

use super::errors::{EngineError, EngineResult};
use super::filters::FilterSet;
use super::query::SearchQuery;
use super::sorter::RecordSorter;

/// Type-discriminated CRUD and search over a record store.
pub struct EntityEngine<S: RecordStore + ?Sized = dyn RecordStore> {
    registry: Arc<SchemaRegistry>,
    store: Arc<S>,
    default_collection: String,
}

impl<S: RecordStore + ?Sized> EntityEngine<S> {
    pub fn new(registry: Arc<SchemaRegistry>, store: Arc<S>) -> Self {
        Self {
            registry,
            store,
            default_collection: DEFAULT_COLLECTION.to_string(),
        }
    }

    /// Collection consulted by reads that do not name a type
    pub fn with_default_collection(mut self, collection: impl Into<String>) -> Self {
        self.default_collection = collection.into();
        self
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Validates and persists a new record of `type_name`.
    pub fn create(&self, type_name: &str, payload: Value) -> EngineResult<EntityRecord> {
        let definition = self.definition(type_name)?;

        let mut fields = sanitize(payload)?;
        normalize(definition, &mut fields);
        let record = EntityRecord::new(definition.type_name(), fields);
        validate(definition, &record)?;

        self.store
            .insert(definition.storage_collection(), record.clone())?;

        tracing::info!(
            event = "RECORD_CREATED",
            type_name = %record.type_name,
            id = %record.id,
        );
        Ok(record)
    }

    /// Reads a record. When `type_name` is given the record must be of that
    /// type; a record of any other type reads as not found.
    pub fn get(&self, type_name: Option<&str>, id: &str) -> EngineResult<EntityRecord> {
        let record_id = parse_id(id)?;
        let collection = match type_name {
            Some(name) => self.definition(name)?.storage_collection(),
            None => self.default_collection.as_str(),
        };

        let record = self
            .store
            .get(collection, &record_id)?
            .ok_or_else(|| EngineError::not_found(record_id))?;

        if !self.registry.contains(&record.type_name) {
            tracing::error!(
                event = "INTEGRITY_VIOLATION",
                id = %record.id,
                type_name = %record.type_name,
                "Stored record has a type that is no longer registered"
            );
            return Err(EngineError::Integrity {
                id: record.id.to_string(),
                type_name: record.type_name,
            });
        }

        match type_name {
            Some(name) if record.type_name != name => Err(EngineError::not_found(record_id)),
            _ => Ok(record),
        }
    }

    /// Replaces a record's user data whole. Identity, type and creation
    /// time are carried over from the stored record.
    pub fn update(&self, type_name: &str, id: &str, payload: Value) -> EngineResult<EntityRecord> {
        let existing = self.get(Some(type_name), id)?;
        let definition = self.definition(type_name)?;

        let mut fields = sanitize(payload)?;
        normalize(definition, &mut fields);
        let record = EntityRecord {
            id: existing.id,
            type_name: existing.type_name,
            created_at: existing.created_at,
            updated_at: next_updated(existing.updated_at),
            fields,
        };
        validate(definition, &record)?;

        if !self
            .store
            .replace(definition.storage_collection(), record.clone())?
        {
            return Err(EngineError::not_found(record.id));
        }

        tracing::info!(
            event = "RECORD_UPDATED",
            type_name = %record.type_name,
            id = %record.id,
        );
        Ok(record)
    }

    /// Permanently removes a record.
    pub fn delete(&self, type_name: &str, id: &str) -> EngineResult<()> {
        let existing = self.get(Some(type_name), id)?;
        let definition = self.definition(type_name)?;

        if !self
            .store
            .remove(definition.storage_collection(), &existing.id)?
        {
            return Err(EngineError::not_found(existing.id));
        }

        tracing::info!(
            event = "RECORD_DELETED",
            type_name = %existing.type_name,
            id = %existing.id,
        );
        Ok(())
    }

    /// Records of `type_name` matching any filter, sorted and limited.
    pub fn search(&self, type_name: &str, query: &SearchQuery) -> EngineResult<Vec<EntityRecord>> {
        let definition = self.definition(type_name)?;

        let mut records: Vec<EntityRecord> = self
            .store
            .scan(definition.storage_collection(), type_name)?
            .into_iter()
            .filter(|record| self.registry.contains(&record.type_name))
            .filter(|record| query.filters.matches(&record.fields))
            .collect();

        RecordSorter::sort(&mut records, &query.sort);
        records.truncate(query.limit);

        tracing::debug!(
            event = "SEARCH_EXECUTED",
            type_name,
            filters = query.filters.len(),
            results = records.len(),
        );
        Ok(records)
    }

    /// Shorthand for an unfiltered, unsorted search
    pub fn list(&self, type_name: &str, limit: usize) -> EngineResult<Vec<EntityRecord>> {
        self.search(
            type_name,
            &SearchQuery {
                filters: FilterSet::default(),
                sort: Vec::new(),
                limit,
            },
        )
    }

    fn definition(&self, type_name: &str) -> EngineResult<&SchemaDefinition> {
        self.registry
            .get(type_name)
            .ok_or_else(|| EngineError::UnknownType(type_name.to_string()))
    }
}

fn parse_id(id: &str) -> EngineResult<RecordId> {
    id.parse()
        .map_err(|_| EngineError::MalformedIdentifier(id.to_string()))
}

/// Keeps user data only: identity keys and `_` keys at any depth are dropped.
fn sanitize(payload: Value) -> EngineResult<Map<String, Value>> {
    let Value::Object(mut fields) = payload else {
        return Err(EngineError::Validation(ValidationResult::single(Violation::new(
            ROOT_FIELD,
            "type",
            "payload must be a JSON object",
        ))));
    };

    fields.remove("id");
    fields.remove("type");
    let mut document = Value::Object(fields);
    strip_internal_fields(&mut document);
    match document {
        Value::Object(fields) => Ok(fields),
        _ => Ok(Map::new()),
    }
}

fn normalize(definition: &SchemaDefinition, fields: &mut Map<String, Value>) {
    let mut document = Value::Object(std::mem::take(fields));
    normalize_temporal(definition.resolved_schema(), &mut document);
    if let Value::Object(normalized) = document {
        *fields = normalized;
    }
}

fn validate(definition: &SchemaDefinition, record: &EntityRecord) -> EngineResult<()> {
    let result = SchemaValidator::validate(&Value::Object(record.fields.clone()), definition);
    if result.is_valid() {
        return Ok(());
    }

    tracing::debug!(
        event = "VALIDATION_FAILED",
        type_name = definition.type_name(),
        violations = result.violations().len(),
    );
    Err(EngineError::Validation(result))
}
