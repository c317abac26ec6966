//! Entity Engine Property Tests
//!
//! Behaviour of generic CRUD and search over registered types:
//! - create then read returns the same data
//! - identity and creation time never change
//! - every successful update moves updated_at forward
//! - a rejected write leaves the store untouched
//! - a deleted record stays gone
//! - search filters are OR-combined and results are capped

use std::collections::BTreeMap;
use std::sync::Arc;

use schemadb::engine::{EngineError, EntityEngine, Limits, SearchQuery};
use schemadb::schema::{SchemaDefinition, SchemaRegistry};
use schemadb::storage::{EntityRecord, InMemoryStore, RecordStore};
use serde_json::{json, Map, Value};

// =============================================================================
// Helper Functions
// =============================================================================

fn definition(type_name: &str, schema: Value) -> SchemaDefinition {
    SchemaDefinition::compile(
        type_name,
        format!("{}.json", type_name),
        schema.clone(),
        schema,
        "entities",
        BTreeMap::new(),
    )
    .unwrap()
}

fn person_schema() -> Value {
    json!({
        "type": "object",
        "required": ["name"],
        "properties": {
            "name": { "type": "string", "minLength": 1 },
            "email": { "type": "string", "format": "email" },
            "birthDate": { "type": "string", "format": "date-time" },
            "city": { "type": "string" },
            "age": { "type": "integer", "minimum": 0 }
        }
    })
}

fn setup() -> (Arc<InMemoryStore>, EntityEngine) {
    let registry = SchemaRegistry::from_definitions(vec![
        definition("Person", person_schema()),
        definition(
            "Place",
            json!({ "type": "object", "required": ["name"], "properties": { "name": { "type": "string" } } }),
        ),
        definition(
            "Event",
            json!({
                "type": "object",
                "properties": {
                    "location": {
                        "oneOf": [
                            { "type": "object", "properties": { "name": { "type": "string" } } },
                            { "type": "object", "properties": { "url": { "type": "string" } } }
                        ]
                    }
                }
            }),
        ),
    ])
    .unwrap();

    let memory = Arc::new(InMemoryStore::new());
    let store: Arc<dyn RecordStore> = memory.clone();
    (memory, EntityEngine::new(Arc::new(registry), store))
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {}", other),
    }
}

// =============================================================================
// Round Trip Tests
// =============================================================================

/// A created record reads back with identical user data.
#[test]
fn test_create_then_get_round_trip() {
    let (_store, engine) = setup();
    let created = engine
        .create("Person", json!({ "name": "Ada", "email": "ada@example.com", "age": 36 }))
        .unwrap();

    let fetched = engine.get(Some("Person"), &created.id.to_string()).unwrap();
    assert_eq!(fetched, created);
    assert_eq!(
        fetched.fields,
        object(json!({ "name": "Ada", "email": "ada@example.com", "age": 36 }))
    );
}

/// Reads that do not name a type use the shared collection.
#[test]
fn test_get_without_type() {
    let (_store, engine) = setup();
    let created = engine.create("Place", json!({ "name": "Paris" })).unwrap();

    let fetched = engine.get(None, &created.id.to_string()).unwrap();
    assert_eq!(fetched.type_name, "Place");
}

/// Client-supplied identity and bookkeeping keys are ignored.
#[test]
fn test_create_drops_identity_and_internal_keys() {
    let (_store, engine) = setup();
    let created = engine
        .create(
            "Person",
            json!({
                "id": "65a1b2c3d4e5f60718293a4b",
                "type": "Organization",
                "_created": "yesterday",
                "name": "Ada",
                "address": { "_secret": 1, "street": "Main" }
            }),
        )
        .unwrap();

    assert_ne!(created.id.to_string(), "65a1b2c3d4e5f60718293a4b");
    assert_eq!(created.type_name, "Person");
    assert!(created.fields.get("id").is_none());
    assert!(created.fields.get("_created").is_none());
    assert_eq!(created.fields.get("address"), Some(&json!({ "street": "Main" })));
}

/// Date-only and offset timestamps are stored as canonical UTC.
#[test]
fn test_date_time_values_normalized() {
    let (_store, engine) = setup();
    let created = engine
        .create("Person", json!({ "name": "Ada", "birthDate": "2000-01-01" }))
        .unwrap();
    assert_eq!(created.fields.get("birthDate"), Some(&json!("2000-01-01T00:00:00.000Z")));

    let updated = engine
        .update(
            "Person",
            &created.id.to_string(),
            json!({ "name": "Ada", "birthDate": "2000-01-01T02:00:00+02:00" }),
        )
        .unwrap();
    assert_eq!(updated.fields.get("birthDate"), Some(&json!("2000-01-01T00:00:00.000Z")));
}

// =============================================================================
// Identity and Timestamp Tests
// =============================================================================

/// Updates never change id, type or created_at, and always advance updated_at.
#[test]
fn test_update_preserves_identity_and_advances_updated_at() {
    let (_store, engine) = setup();
    let created = engine.create("Person", json!({ "name": "Ada" })).unwrap();
    let id = created.id.to_string();

    let mut previous = created.clone();
    for n in 0..5 {
        let updated = engine
            .update("Person", &id, json!({ "name": format!("Ada {}", n) }))
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.type_name, "Person");
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > previous.updated_at);
        previous = updated;
    }
}

/// Update is a full replace: omitted fields disappear.
#[test]
fn test_update_replaces_whole_document() {
    let (_store, engine) = setup();
    let created = engine
        .create("Person", json!({ "name": "Ada", "email": "ada@example.com" }))
        .unwrap();

    let updated = engine
        .update("Person", &created.id.to_string(), json!({ "name": "Ada Lovelace" }))
        .unwrap();
    assert_eq!(updated.fields, object(json!({ "name": "Ada Lovelace" })));
}

// =============================================================================
// Validation Tests
// =============================================================================

/// A missing required field is reported by name and nothing is stored.
#[test]
fn test_required_failure_leaves_store_unchanged() {
    let (store, engine) = setup();

    let err = engine.create("Person", json!({ "email": "ada@example.com" })).unwrap_err();
    match err {
        EngineError::Validation(result) => {
            assert_eq!(result.violations()[0].field, "name");
            assert_eq!(result.violations()[0].keyword, "required");
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(store.count("entities").unwrap(), 0);
}

/// A rejected update keeps the previously stored version.
#[test]
fn test_failed_update_keeps_previous_version() {
    let (_store, engine) = setup();
    let created = engine.create("Person", json!({ "name": "Ada" })).unwrap();
    let id = created.id.to_string();

    let err = engine
        .update("Person", &id, json!({ "name": "Ada", "email": "not an email" }))
        .unwrap_err();
    assert_eq!(err.code(), "ENTITY_VALIDATION_FAILED");

    assert_eq!(engine.get(Some("Person"), &id).unwrap(), created);
}

/// A payload that is not an object is a root-level violation.
#[test]
fn test_non_object_payload() {
    let (_store, engine) = setup();
    let err = engine.create("Person", json!(["Ada"])).unwrap_err();
    match err {
        EngineError::Validation(result) => assert_eq!(result.violations()[0].field, "$root"),
        other => panic!("expected validation error, got {:?}", other),
    }
}

/// Matching more than one oneOf branch is accepted.
#[test]
fn test_oneof_ambiguity_accepted() {
    let (_store, engine) = setup();
    let created = engine
        .create("Event", json!({ "location": { "name": "Hall A" } }))
        .unwrap();
    assert_eq!(created.fields.get("location"), Some(&json!({ "name": "Hall A" })));
}

// =============================================================================
// Lookup Failure Tests
// =============================================================================

#[test]
fn test_unknown_type() {
    let (_store, engine) = setup();
    let err = engine.create("Unicorn", json!({})).unwrap_err();
    assert!(matches!(err, EngineError::UnknownType(ref t) if t == "Unicorn"));
}

#[test]
fn test_malformed_identifier() {
    let (_store, engine) = setup();
    let err = engine.get(Some("Person"), "xyz").unwrap_err();
    assert!(matches!(err, EngineError::MalformedIdentifier(_)));
}

/// A record read under another type name is not found.
#[test]
fn test_type_mismatch_reads_as_not_found() {
    let (_store, engine) = setup();
    let place = engine.create("Place", json!({ "name": "Paris" })).unwrap();

    let err = engine.get(Some("Person"), &place.id.to_string()).unwrap_err();
    assert!(matches!(err, EngineError::NotFound { .. }));
}

/// Deleting twice: the second attempt and any later read are not found.
#[test]
fn test_delete_is_final() {
    let (_store, engine) = setup();
    let created = engine.create("Person", json!({ "name": "Ada" })).unwrap();
    let id = created.id.to_string();

    engine.delete("Person", &id).unwrap();
    assert!(matches!(engine.get(Some("Person"), &id), Err(EngineError::NotFound { .. })));
    assert!(matches!(engine.delete("Person", &id), Err(EngineError::NotFound { .. })));
    assert!(matches!(
        engine.update("Person", &id, json!({ "name": "Ada" })),
        Err(EngineError::NotFound { .. })
    ));
}

/// A stored record whose type is not registered is an integrity error.
#[test]
fn test_unregistered_stored_type_is_integrity_error() {
    let (store, engine) = setup();
    let orphan = EntityRecord::new("Ghost", object(json!({ "name": "Boo" })));
    store.insert("entities", orphan.clone()).unwrap();

    let err = engine.get(None, &orphan.id.to_string()).unwrap_err();
    assert_eq!(err.code(), "ENTITY_INTEGRITY_ERROR");
}

// =============================================================================
// Search Tests
// =============================================================================

/// Filters combine with OR and match case-insensitive substrings.
#[test]
fn test_search_filters_are_or_combined() {
    let (_store, engine) = setup();
    engine.create("Person", json!({ "name": "Ada", "city": "London" })).unwrap();
    engine.create("Person", json!({ "name": "Grace", "city": "Paris" })).unwrap();
    engine.create("Person", json!({ "name": "Linus", "city": "Helsinki" })).unwrap();
    engine.create("Place", json!({ "name": "Ada's Cafe" })).unwrap();

    let query = SearchQuery::parse(
        vec![("name", "ADA"), ("city", "par"), ("sort", "name")],
        &Limits::default(),
    );
    let results = engine.search("Person", &query).unwrap();

    let names: Vec<&Value> = results.iter().filter_map(|r| r.fields.get("name")).collect();
    assert_eq!(names, vec![&json!("Ada"), &json!("Grace")]);
}

/// Sorting by a numeric field, descending.
#[test]
fn test_search_sort_descending() {
    let (_store, engine) = setup();
    for (name, age) in [("a", 30), ("b", 50), ("c", 40)] {
        engine.create("Person", json!({ "name": name, "age": age })).unwrap();
    }

    let query = SearchQuery::parse(vec![("sort", "-age")], &Limits::default());
    let ages: Vec<Value> = engine
        .search("Person", &query)
        .unwrap()
        .into_iter()
        .filter_map(|r| r.fields.get("age").cloned())
        .collect();
    assert_eq!(ages, vec![json!(50), json!(40), json!(30)]);
}

/// Requested limits above the maximum are clamped to it.
#[test]
fn test_search_limit_clamped() {
    let (_store, engine) = setup();
    for n in 0..1005 {
        engine.create("Place", json!({ "name": format!("Place {}", n) })).unwrap();
    }

    let clamped = SearchQuery::parse(vec![("limit", "5000")], &Limits::default());
    assert_eq!(engine.search("Place", &clamped).unwrap().len(), 1000);

    let defaulted = SearchQuery::parse(vec![("limit", "abc")], &Limits::default());
    assert_eq!(engine.search("Place", &defaulted).unwrap().len(), 100);

    assert_eq!(engine.list("Place", 7).unwrap().len(), 7);
}

#[test]
fn test_search_unknown_type() {
    let (_store, engine) = setup();
    let err = engine.search("Unicorn", &SearchQuery::default()).unwrap_err();
    assert_eq!(err.code(), "ENTITY_UNKNOWN_TYPE");
}
