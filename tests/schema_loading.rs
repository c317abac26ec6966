//! Schema Loading Tests
//!
//! Registry construction from a directory of JSON Schema documents:
//! - cross-document references are inlined
//! - only the edge that closes a cycle is replaced
//! - draft-04 fragments are upgraded for later-draft hosts
//! - load failures are fatal and name the document
//! - concurrent first calls share a single scan

use std::path::Path;
use std::sync::Arc;

use schemadb::schema::{LoaderConfig, PlaceholderMode, SchemaLoader, SchemaValidator};
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn write(dir: &Path, relative: &str, value: Value) {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, serde_json::to_string_pretty(&value).unwrap()).unwrap();
}

fn person_organization_place(dir: &Path) {
    write(
        dir,
        "Person.json",
        json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": { "type": "string" },
                "worksFor": { "$ref": "Organization.json" }
            }
        }),
    );
    write(
        dir,
        "Organization.json",
        json!({
            "type": "object",
            "properties": {
                "name": { "type": "string" },
                "founder": { "$ref": "Person.json" },
                "location": { "$ref": "Place.json" }
            }
        }),
    );
    write(
        dir,
        "Place.json",
        json!({
            "type": "object",
            "required": ["name"],
            "properties": { "name": { "type": "string" } }
        }),
    );
}

// =============================================================================
// Reference Resolution Tests
// =============================================================================

/// Person → Organization → Person: the back edge alone becomes a placeholder.
#[tokio::test]
async fn test_cycle_replaces_only_closing_edge() {
    let dir = TempDir::new().unwrap();
    person_organization_place(dir.path());

    let registry = SchemaLoader::new(LoaderConfig::new(dir.path()))
        .load()
        .await
        .unwrap();

    let person = registry.get("Person").unwrap();
    let schema = person.resolved_schema();

    assert_eq!(
        schema.pointer("/properties/worksFor/properties/founder"),
        Some(&json!({ "type": "object" }))
    );
    assert_eq!(
        schema.pointer("/properties/worksFor/properties/location/required"),
        Some(&json!(["name"]))
    );
    assert!(person.is_partially_resolved());
    assert_eq!(
        person
            .replaced_reference_paths()
            .get("/properties/worksFor/properties/founder")
            .map(String::as_str),
        Some("Person.json")
    );

    let place = registry.get("Place").unwrap();
    assert!(!place.is_partially_resolved());
}

/// The raw schema is kept as authored.
#[tokio::test]
async fn test_raw_schema_is_untouched() {
    let dir = TempDir::new().unwrap();
    person_organization_place(dir.path());

    let registry = SchemaLoader::new(LoaderConfig::new(dir.path()))
        .load()
        .await
        .unwrap();

    let raw = registry.get("Person").unwrap().raw_schema();
    assert_eq!(raw["properties"]["worksFor"], json!({ "$ref": "Organization.json" }));
}

/// Foreign-key placeholders constrain the cyclic edge to an identifier.
#[tokio::test]
async fn test_foreign_key_placeholder_validates_identifiers() {
    let dir = TempDir::new().unwrap();
    person_organization_place(dir.path());

    let loader = SchemaLoader::new(
        LoaderConfig::new(dir.path()).with_placeholder(PlaceholderMode::ForeignKey),
    );
    let registry = loader.load().await.unwrap();
    let person = registry.get("Person").unwrap();

    let ok = json!({
        "name": "Ada",
        "worksFor": { "name": "Analytical Engines", "founder": "65a1b2c3d4e5f60718293a4b" }
    });
    assert!(SchemaValidator::validate(&ok, person).is_valid());

    let bad = json!({
        "name": "Ada",
        "worksFor": { "name": "Analytical Engines", "founder": "not-an-id" }
    });
    let result = SchemaValidator::validate(&bad, person);
    assert!(!result.is_valid());
    assert_eq!(result.violations()[0].field, "worksFor.founder");
}

/// Constraints of an inlined acyclic reference are enforced two hops down.
#[tokio::test]
async fn test_inlined_reference_violation_rejected() {
    let dir = TempDir::new().unwrap();
    person_organization_place(dir.path());

    let registry = SchemaLoader::new(LoaderConfig::new(dir.path()))
        .load()
        .await
        .unwrap();
    let person = registry.get("Person").unwrap();

    let doc = json!({
        "name": "Ada",
        "worksFor": { "name": "Analytical Engines", "location": { "city": "London" } }
    });
    let result = SchemaValidator::validate(&doc, person);

    assert!(!result.is_valid());
    assert_eq!(result.violations().len(), 1);
    assert_eq!(result.violations()[0].field, "worksFor.location.name");
    assert_eq!(result.violations()[0].keyword, "required");
}

/// References into other directories resolve relative to the referrer.
#[tokio::test]
async fn test_relative_reference_across_directories() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "shared/definitions.json",
        json!({ "definitions": { "PostalCode": { "type": "string", "pattern": "^[0-9]{5}$" } } }),
    );
    write(
        dir.path(),
        "types/Address.json",
        json!({
            "type": "object",
            "properties": { "zip": { "$ref": "../shared/definitions.json#/definitions/PostalCode" } }
        }),
    );

    let registry = SchemaLoader::new(LoaderConfig::new(dir.path()))
        .load()
        .await
        .unwrap();

    let address = registry.get("Address").unwrap();
    assert_eq!(
        address.resolved_schema()["properties"]["zip"]["pattern"],
        json!("^[0-9]{5}$")
    );
    assert!(registry.contains("Definitions"));
}

// =============================================================================
// Draft Compatibility Tests
// =============================================================================

fn age_draft4(dir: &Path) {
    write(
        dir,
        "Age.json",
        json!({
            "$schema": "http://json-schema.org/draft-04/schema#",
            "type": "number",
            "minimum": 0,
            "exclusiveMinimum": true
        }),
    );
}

/// A draft-04 fragment referenced from a draft-07 document keeps its meaning.
#[tokio::test]
async fn test_draft4_reference_from_draft7_document() {
    let dir = TempDir::new().unwrap();
    age_draft4(dir.path());
    write(
        dir.path(),
        "Person.json",
        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "properties": { "age": { "$ref": "Age.json" } }
        }),
    );

    let registry = SchemaLoader::new(LoaderConfig::new(dir.path()))
        .load()
        .await
        .unwrap();
    let person = registry.get("Person").unwrap();

    assert!(SchemaValidator::validate(&json!({ "age": 36 }), person).is_valid());

    let result = SchemaValidator::validate(&json!({ "age": 0 }), person);
    assert!(!result.is_valid());
    assert_eq!(result.violations()[0].field, "age");

    let age = registry.get("Age").unwrap();
    assert!(!SchemaValidator::validate(&json!(0), age).is_valid());
}

/// A draft-04 document cannot inline a fragment written for another draft.
#[tokio::test]
async fn test_mixed_drafts_name_referenced_document() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "Place.json",
        json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "properties": { "capacity": { "type": "integer", "exclusiveMinimum": 0 } }
        }),
    );
    write(
        dir.path(),
        "Event.json",
        json!({
            "$schema": "http://json-schema.org/draft-04/schema#",
            "type": "object",
            "properties": { "location": { "$ref": "Place.json" } }
        }),
    );

    let loader = SchemaLoader::new(LoaderConfig::new(dir.path()));
    let err = loader.load().await.unwrap_err();

    assert_eq!(err.code(), "SCHEMA_LOAD_ERROR");
    assert_eq!(err.document(), Some(Path::new("Place.json")));
    assert!(err.to_string().contains("Mixed schema drafts"));
    assert!(loader.loaded().is_none());
}

// =============================================================================
// Failure Tests
// =============================================================================

/// A missing root is a configuration error and nothing is published.
#[tokio::test]
async fn test_missing_root() {
    let dir = TempDir::new().unwrap();
    let loader = SchemaLoader::new(LoaderConfig::new(dir.path().join("nope")));

    let err = loader.load().await.unwrap_err();
    assert_eq!(err.code(), "SCHEMA_CONFIGURATION_ERROR");
    assert!(loader.loaded().is_none());
}

/// A dangling reference fails the whole load and names the referrer.
#[tokio::test]
async fn test_dangling_reference_is_load_error() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "Person.json",
        json!({ "type": "object", "properties": { "home": { "$ref": "Missing.json" } } }),
    );

    let loader = SchemaLoader::new(LoaderConfig::new(dir.path()));
    let err = loader.load().await.unwrap_err();

    assert_eq!(err.code(), "SCHEMA_LOAD_ERROR");
    assert_eq!(err.document(), Some(Path::new("Person.json")));
}

/// Two documents mapping to the same type name cannot both register.
#[tokio::test]
async fn test_duplicate_type_names_rejected() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a/Person.json", json!({ "type": "object" }));
    write(dir.path(), "b/Person.json", json!({ "type": "object" }));

    let err = SchemaLoader::new(LoaderConfig::new(dir.path()))
        .load()
        .await
        .unwrap_err();
    assert_eq!(err.code(), "SCHEMA_LOAD_ERROR");
}

/// A failed load can be retried once the documents are fixed.
#[tokio::test]
async fn test_failed_load_is_retried() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("Person.json"), "{ broken").unwrap();

    let loader = SchemaLoader::new(LoaderConfig::new(dir.path()));
    assert!(loader.load().await.is_err());

    write(dir.path(), "Person.json", json!({ "type": "object" }));
    let registry = loader.load().await.unwrap();
    assert!(registry.contains("Person"));
    assert_eq!(loader.scan_count(), 2);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

/// Concurrent first calls await one scan and observe the same registry.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_load_scans_once() {
    let dir = TempDir::new().unwrap();
    person_organization_place(dir.path());

    let loader = Arc::new(SchemaLoader::new(LoaderConfig::new(dir.path())));
    let (a, b, c) = tokio::join!(loader.load(), loader.load(), loader.load());

    let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
    assert!(Arc::ptr_eq(&a, &b));
    assert!(Arc::ptr_eq(&b, &c));
    assert_eq!(loader.scan_count(), 1);
}
