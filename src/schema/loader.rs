//! Schema loader for building the registry from disk at startup
//!
//! - Every `*.json` file below the schema root is a schema document
//! - The type name is the PascalCase form of the file stem
//! - Documents are read and resolved in parallel
//! - The registry is published whole or not at all
//! - Concurrent first callers share one scan

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures_util::future::try_join_all;
use serde_json::Value;
use tokio::fs;
use tokio::sync::OnceCell;

use super::errors::{SchemaError, SchemaResult};
use super::registry::SchemaRegistry;
use super::resolver::{self, DocumentSet, ResolvedSchema};
use super::types::{annotate_foreign_keys, PlaceholderMode, SchemaDefinition};

/// Collection used when none is configured
pub const DEFAULT_COLLECTION: &str = "entities";

/// Inputs of a registry build.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    /// Root directory scanned for schema documents
    pub schema_dir: PathBuf,
    /// Storage collection assigned to every loaded type
    pub collection: String,
    /// Shape substituted for cyclic references
    pub placeholder: PlaceholderMode,
}

impl LoaderConfig {
    pub fn new(schema_dir: impl Into<PathBuf>) -> Self {
        Self {
            schema_dir: schema_dir.into(),
            collection: DEFAULT_COLLECTION.to_string(),
            placeholder: PlaceholderMode::default(),
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_placeholder(mut self, placeholder: PlaceholderMode) -> Self {
        self.placeholder = placeholder;
        self
    }
}

/// Loads the schema registry once and hands out shared references to it.
pub struct SchemaLoader {
    config: LoaderConfig,
    registry: OnceCell<Arc<SchemaRegistry>>,
    scans: AtomicUsize,
}

impl SchemaLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            registry: OnceCell::new(),
            scans: AtomicUsize::new(0),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Returns the registry, scanning the schema root on first use.
    ///
    /// Callers arriving while a scan is in flight wait for it instead of
    /// starting another. A failed scan leaves nothing published; the next
    /// call scans again.
    pub async fn load(&self) -> SchemaResult<Arc<SchemaRegistry>> {
        self.registry
            .get_or_try_init(|| self.scan())
            .await
            .map(Arc::clone)
            .map_err(|e| {
                tracing::error!(
                    event = "SCHEMA_LOAD_FAILED",
                    code = e.code(),
                    error = %e,
                    "Schema registry could not be built"
                );
                e
            })
    }

    /// The registry, if a load has completed
    pub fn loaded(&self) -> Option<Arc<SchemaRegistry>> {
        self.registry.get().cloned()
    }

    /// Number of scans started so far
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    async fn scan(&self) -> SchemaResult<Arc<SchemaRegistry>> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        let root = self.config.schema_dir.as_path();

        let metadata = fs::metadata(root)
            .await
            .map_err(|e| SchemaError::configuration(root, e.to_string()))?;
        if !metadata.is_dir() {
            return Err(SchemaError::configuration(root, "not a directory"));
        }

        let files = discover(root).await?;
        tracing::debug!(event = "SCHEMA_SCAN", root = %root.display(), documents = files.len());

        let documents = try_join_all(files.iter().map(|file| read_document(root, file))).await?;
        let documents = Arc::new(DocumentSet::new(documents));

        let builds = documents.paths().into_iter().map(|path| {
            let documents = Arc::clone(&documents);
            let collection = self.config.collection.clone();
            let placeholder = self.config.placeholder;
            tokio::task::spawn_blocking(move || {
                build_definition(&documents, &path, &collection, placeholder)
            })
        });
        let definitions = try_join_all(builds)
            .await
            .map_err(|e| SchemaError::load(root, format!("Schema build task failed: {}", e)))?
            .into_iter()
            .collect::<SchemaResult<Vec<_>>>()?;

        for definition in &definitions {
            tracing::info!(
                event = "SCHEMA_LOADED",
                type_name = definition.type_name(),
                source = %definition.source().display(),
                collection = definition.storage_collection(),
                "Loaded schema"
            );
            if definition.is_partially_resolved() {
                tracing::warn!(
                    event = "CYCLIC_REFERENCES_REPLACED",
                    type_name = definition.type_name(),
                    replaced = definition.replaced_reference_paths().len(),
                    "Schema is partially resolved"
                );
            }
        }

        let registry = SchemaRegistry::from_definitions(definitions)?;
        tracing::info!(
            event = "REGISTRY_PUBLISHED",
            types = registry.len(),
            "Schema registry ready"
        );
        Ok(Arc::new(registry))
    }
}

/// PascalCase of the file stem: `news-article.json` → `NewsArticle`.
pub fn type_name_for(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let name: String = stem
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();

    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Finds every `*.json` file below `root`, as sorted root-relative paths.
async fn discover(root: &Path) -> SchemaResult<Vec<PathBuf>> {
    let mut pending = vec![root.to_path_buf()];
    let mut found = Vec::new();

    while let Some(dir) = pending.pop() {
        let mut entries = fs::read_dir(&dir).await.map_err(|e| {
            SchemaError::configuration(&dir, format!("Failed to read directory: {}", e))
        })?;

        while let Some(entry) = entries.next_entry().await.map_err(|e| {
            SchemaError::configuration(&dir, format!("Failed to read directory entry: {}", e))
        })? {
            let path = entry.path();
            let file_type = entry.file_type().await.map_err(|e| {
                SchemaError::configuration(&path, format!("Failed to stat entry: {}", e))
            })?;

            if file_type.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "json") {
                let relative = path.strip_prefix(root).map(Path::to_path_buf).unwrap_or(path);
                found.push(relative);
            }
        }
    }

    found.sort();
    Ok(found)
}

async fn read_document(root: &Path, relative: &Path) -> SchemaResult<(PathBuf, Value)> {
    let content = fs::read_to_string(root.join(relative))
        .await
        .map_err(|e| SchemaError::load(relative, format!("Failed to read file: {}", e)))?;

    let document: Value = serde_json::from_str(&content)
        .map_err(|e| SchemaError::load(relative, format!("Invalid JSON: {}", e)))?;

    Ok((relative.to_path_buf(), document))
}

fn build_definition(
    documents: &DocumentSet,
    path: &Path,
    collection: &str,
    placeholder: PlaceholderMode,
) -> SchemaResult<SchemaDefinition> {
    let type_name = type_name_for(path)
        .ok_or_else(|| SchemaError::load(path, "File name does not yield a type name"))?;
    let raw_schema = documents
        .get(path)
        .cloned()
        .ok_or_else(|| SchemaError::load(path, "Document disappeared during load"))?;

    let ResolvedSchema {
        schema: mut resolved,
        replaced,
    } = resolver::resolve(documents, path, placeholder)?;
    if let Some(map) = resolved.as_object_mut() {
        // Every local reference is inlined; a file-relative $id has nothing left to anchor
        map.remove("$id");
    }
    annotate_foreign_keys(&mut resolved);

    SchemaDefinition::compile(type_name, path, raw_schema, resolved, collection, replaced)
}
