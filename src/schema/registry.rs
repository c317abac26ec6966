//! Immutable type name → definition map published by the loader.

use std::collections::BTreeMap;

use super::errors::{SchemaError, SchemaResult};
use super::types::SchemaDefinition;

#[derive(Debug, Default)]
pub struct SchemaRegistry {
    definitions: BTreeMap<String, SchemaDefinition>,
}

impl SchemaRegistry {
    /// Builds a registry, rejecting two documents that share a type name.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = SchemaDefinition>,
    ) -> SchemaResult<Self> {
        let mut map: BTreeMap<String, SchemaDefinition> = BTreeMap::new();
        for definition in definitions {
            if let Some(existing) = map.get(definition.type_name()) {
                return Err(SchemaError::load(
                    definition.source(),
                    format!(
                        "Type name '{}' is already defined by '{}'",
                        definition.type_name(),
                        existing.source().display()
                    ),
                ));
            }
            map.insert(definition.type_name().to_string(), definition);
        }
        Ok(Self { definitions: map })
    }

    pub fn get(&self, type_name: &str) -> Option<&SchemaDefinition> {
        self.definitions.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.definitions.contains_key(type_name)
    }

    /// Registered type names in sorted order
    pub fn type_names(&self) -> Vec<&str> {
        self.definitions.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaDefinition> {
        self.definitions.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn definition(name: &str, source: &str) -> SchemaDefinition {
        let schema = json!({ "type": "object" });
        SchemaDefinition::compile(name, source, schema.clone(), schema, "entities", BTreeMap::new())
            .unwrap()
    }

    #[test]
    fn test_lookup_and_sorted_names() {
        let registry = SchemaRegistry::from_definitions(vec![
            definition("Place", "Place.json"),
            definition("Person", "Person.json"),
        ])
        .unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.contains("Person"));
        assert!(!registry.contains("person"));
        assert_eq!(registry.type_names(), vec!["Person", "Place"]);
        assert_eq!(registry.get("Place").unwrap().type_name(), "Place");
    }

    #[test]
    fn test_duplicate_type_name_rejected() {
        let err = SchemaRegistry::from_definitions(vec![
            definition("NewsArticle", "news-article.json"),
            definition("NewsArticle", "news_article.json"),
        ])
        .unwrap_err();

        assert_eq!(err.code(), "SCHEMA_LOAD_ERROR");
        assert!(err.to_string().contains("news-article.json"));
    }
}
