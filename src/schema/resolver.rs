//! `$ref` resolution with cycle breaking
//!
//! Every reference edge is inlined with its target. An edge whose target is
//! already being expanded further up the current path closes a cycle; that
//! edge alone is replaced with a placeholder and recorded, so a document
//! with no cycles comes out fully inlined and a cyclic one comes out with
//! every acyclic edge still inlined.
//!
//! Supported targets: local pointers (`#/definitions/Address`) and documents
//! relative to the referring document (`Place.json`,
//! `../shared/Address.json#/definitions/Street`).
//!
//! Inlined fragments are compiled under the host document's draft. Draft-04
//! fragments are rewritten to later-draft forms when the host is not draft-04;
//! a draft-04 host referencing a document that declares another draft is a
//! load error.

use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};

use serde_json::Value;

use super::errors::{SchemaError, SchemaResult};
use super::types::PlaceholderMode;
use super::visit::{self, JsonPointer, Rewrite};

/// Every schema document under the schema root, keyed by its path relative
/// to the root.
#[derive(Debug, Default)]
pub struct DocumentSet {
    documents: HashMap<PathBuf, Value>,
}

impl DocumentSet {
    pub fn new(documents: impl IntoIterator<Item = (PathBuf, Value)>) -> Self {
        Self {
            documents: documents
                .into_iter()
                .map(|(path, doc)| (normalize_path(&path), doc))
                .collect(),
        }
    }

    pub fn get(&self, path: &Path) -> Option<&Value> {
        self.documents.get(path)
    }

    /// Document paths in a stable order
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.documents.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    fn lookup(&self, target: &RefTarget) -> Option<&Value> {
        self.documents.get(&target.document)?.pointer(&target.pointer)
    }
}

/// A fully or partially dereferenced schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSchema {
    pub schema: Value,
    /// JSON pointer (in `schema`) → authored `$ref` of each substituted edge
    pub replaced: BTreeMap<String, String>,
}

/// Dereferences the document at `root` against `documents`.
pub fn resolve(
    documents: &DocumentSet,
    root: &Path,
    placeholder: PlaceholderMode,
) -> SchemaResult<ResolvedSchema> {
    let root = normalize_path(root);
    let document = documents
        .get(&root)
        .ok_or_else(|| SchemaError::load(&root, "Document is not part of the schema set"))?;

    let mut resolver = Resolver {
        documents,
        root: root.clone(),
        root_draft4: is_draft4(document),
        placeholder,
        frames: vec![RefTarget {
            document: root,
            pointer: String::new(),
        }],
        replaced: BTreeMap::new(),
    };

    let mut schema = visit::rewrite(document, &mut JsonPointer::root(), &mut |node, pointer| {
        resolver.expand(node, pointer)
    })?;
    // A root that is itself a `$ref` is replaced whole; keep its declared draft
    if let (Some(draft), Value::Object(map)) = (document.get("$schema"), &mut schema) {
        map.entry("$schema").or_insert_with(|| draft.clone());
    }

    Ok(ResolvedSchema {
        schema,
        replaced: resolver.replaced,
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct RefTarget {
    document: PathBuf,
    pointer: String,
}

struct Resolver<'d> {
    documents: &'d DocumentSet,
    root: PathBuf,
    root_draft4: bool,
    placeholder: PlaceholderMode,
    /// Targets currently being expanded, outermost first
    frames: Vec<RefTarget>,
    replaced: BTreeMap<String, String>,
}

impl<'d> Resolver<'d> {
    fn expand(&mut self, node: &Value, pointer: &mut JsonPointer) -> SchemaResult<Rewrite> {
        let Some(reference) = node.get("$ref").and_then(Value::as_str) else {
            return Ok(Rewrite::Descend);
        };

        let target = self.locate(reference)?;
        if self.frames.contains(&target) {
            self.replaced.insert(pointer.to_string(), reference.to_string());
            return Ok(Rewrite::Replace(self.placeholder.placeholder()));
        }

        let documents = self.documents;
        let fragment = documents.lookup(&target).ok_or_else(|| {
            SchemaError::load(
                &self.root,
                format!("Unresolvable reference '{}' at '{}'", reference, pointer),
            )
        })?;

        let upgraded;
        let fragment = match documents.get(&target.document) {
            Some(source) if is_draft4(source) && !self.root_draft4 => {
                let mut copy = fragment.clone();
                upgrade_draft4(&mut copy);
                upgraded = copy;
                &upgraded
            }
            Some(source) if self.root_draft4 && declares_other_draft(source) => {
                return Err(SchemaError::load(
                    &target.document,
                    format!(
                        "Mixed schema drafts: referenced from draft-04 document '{}' but declares '{}'",
                        self.root.display(),
                        source.get("$schema").and_then(Value::as_str).unwrap_or_default()
                    ),
                ));
            }
            _ => fragment,
        };

        self.frames.push(target);
        let expanded = visit::rewrite(fragment, pointer, &mut |n, p| self.expand(n, p));
        self.frames.pop();

        let mut expanded = expanded?;
        if let Value::Object(map) = &mut expanded {
            // Inlined documents must not re-base identifiers of the host schema
            map.remove("$id");
            map.remove("$schema");
        }
        Ok(Rewrite::Replace(expanded))
    }

    /// Turns a `$ref` string into a (document, pointer) pair relative to the
    /// document currently being expanded.
    fn locate(&self, reference: &str) -> SchemaResult<RefTarget> {
        let (file, fragment) = reference.split_once('#').unwrap_or((reference, ""));

        if file.contains("://") {
            return Err(SchemaError::load(
                &self.root,
                format!("Remote reference '{}' is not supported", reference),
            ));
        }
        if !fragment.is_empty() && !fragment.starts_with('/') {
            return Err(SchemaError::load(
                &self.root,
                format!("Reference '{}' must use a JSON pointer fragment", reference),
            ));
        }

        let current = self
            .frames
            .last()
            .map(|frame| frame.document.clone())
            .unwrap_or_else(|| self.root.clone());

        let document = if file.is_empty() {
            current
        } else {
            let base = current.parent().unwrap_or_else(|| Path::new(""));
            normalize_path(&base.join(file))
        };

        Ok(RefTarget {
            document,
            pointer: fragment.to_string(),
        })
    }
}

fn is_draft4(document: &Value) -> bool {
    document
        .get("$schema")
        .and_then(Value::as_str)
        .is_some_and(|uri| uri.contains("draft-04"))
}

fn declares_other_draft(document: &Value) -> bool {
    document.get("$schema").and_then(Value::as_str).is_some() && !is_draft4(document)
}

/// Rewrites draft-04 boolean `exclusiveMinimum`/`exclusiveMaximum` into the
/// numeric form later drafts expect.
fn upgrade_draft4(schema: &mut Value) {
    visit::visit_mut(schema, &mut |node| {
        let Value::Object(map) = node else {
            return;
        };
        for (flag, bound) in [("exclusiveMinimum", "minimum"), ("exclusiveMaximum", "maximum")] {
            let Some(exclusive) = map.get(flag).and_then(Value::as_bool) else {
                continue;
            };
            map.remove(flag);
            if exclusive {
                if let Some(limit) = map.remove(bound) {
                    map.insert(flag.to_string(), limit);
                }
            }
        }
    });
}

/// Lexically collapses `.` and `..` so the same document is always keyed by
/// the same path.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
