//! Generic tree rewriting over JSON values.
//!
//! Schema-agnostic: the resolver, the foreign-key annotator and the
//! serializer all express their passes as a per-node transform.

use std::fmt;

use serde_json::{Map, Value};

/// Location of a node below the root of a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonPointer {
    segments: Vec<String>,
}

impl JsonPointer {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    pub fn pop(&mut self) {
        self.segments.pop();
    }
}

impl fmt::Display for JsonPointer {
    /// RFC 6901 form: `""` for the root, `/a/b~1c` otherwise.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", segment.replace('~', "~0").replace('/', "~1"))?;
        }
        Ok(())
    }
}

/// What a per-node transform wants done with the node it was shown.
#[derive(Debug)]
pub enum Rewrite {
    /// Use this value in place of the node; its children are not visited.
    Replace(Value),
    /// Keep the node and visit its children.
    Descend,
}

/// Builds a rewritten copy of `node`, consulting `f` at every node before
/// its children. `pointer` tracks the position in the output tree and is
/// left as it was found when this returns.
pub fn rewrite<E, F>(node: &Value, pointer: &mut JsonPointer, f: &mut F) -> Result<Value, E>
where
    F: FnMut(&Value, &mut JsonPointer) -> Result<Rewrite, E>,
{
    if let Rewrite::Replace(value) = f(node, pointer)? {
        return Ok(value);
    }

    match node {
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, child) in map {
                pointer.push(key.clone());
                let rewritten = rewrite(child, pointer, f);
                pointer.pop();
                out.insert(key.clone(), rewritten?);
            }
            Ok(Value::Object(out))
        }
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (index, child) in items.iter().enumerate() {
                pointer.push(index.to_string());
                let rewritten = rewrite(child, pointer, f);
                pointer.pop();
                out.push(rewritten?);
            }
            Ok(Value::Array(out))
        }
        scalar => Ok(scalar.clone()),
    }
}

/// Applies `f` to every node in place, children before their parent.
pub fn visit_mut<F>(node: &mut Value, f: &mut F)
where
    F: FnMut(&mut Value),
{
    match node {
        Value::Object(map) => {
            for child in map.values_mut() {
                visit_mut(child, f);
            }
        }
        Value::Array(items) => {
            for child in items.iter_mut() {
                visit_mut(child, f);
            }
        }
        _ => {}
    }
    f(node);
}
