//! Reference expansion with cycle preservation
//!
//! Expansion walks the working structure depth-first and replaces every
//! `$ref` with its dereferenced target. Targets in other documents are
//! fetched through the same loader chain that loaded the root document,
//! so custom loaders apply transitively; fetched documents are memoized
//! for the duration of one expansion. A reference whose target is
//! already being expanded is a cycle and is left in place as a pointer,
//! which keeps expansion terminating while all acyclic paths are fully
//! inlined.
//!
//! Copyright (c) 2025 specloads contributors
//! Licensed under the Apache-2.0 license

use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};

use log::{debug, trace};
use serde_json::{Map, Value};
use url::Url;

use crate::error::{Error, Result};
use crate::loader::as_http_url;
use crate::options::LoadOptions;
use crate::parser;
use crate::swagger::Swagger;

/// Expand all references in `spec`, resolving relative external
/// references against `base_locator` and fetching through `options`.
///
/// The input is not mutated; a fully expanded copy is returned.
pub fn expand(spec: &Swagger, base_locator: &str, options: &LoadOptions) -> Result<Swagger> {
    let root = serde_json::to_value(spec)
        .map_err(|e| Error::expansion(base_locator, e.to_string()))?;

    let mut ctx = Context {
        options,
        documents: HashMap::from([(base_locator.to_string(), root.clone())]),
        in_progress: HashSet::new(),
    };

    debug!("expanding references against base '{base_locator}'");
    let expanded = ctx.expand_value(&root, base_locator)?;

    serde_json::from_value(expanded).map_err(|e| Error::expansion(base_locator, e.to_string()))
}

struct Context<'a> {
    options: &'a LoadOptions,
    /// Decoded documents by locator, the base document included
    documents: HashMap<String, Value>,
    /// Reference targets currently on the expansion stack
    in_progress: HashSet<String>,
}

impl Context<'_> {
    fn expand_value(&mut self, value: &Value, base: &str) -> Result<Value> {
        match value {
            Value::Object(obj) => {
                if let Some(Value::String(reference)) = obj.get("$ref") {
                    return self.expand_ref(reference, base, value);
                }
                let mut expanded = Map::with_capacity(obj.len());
                for (key, val) in obj {
                    expanded.insert(key.clone(), self.expand_value(val, base)?);
                }
                Ok(Value::Object(expanded))
            }
            Value::Array(items) => {
                let mut expanded = Vec::with_capacity(items.len());
                for item in items {
                    expanded.push(self.expand_value(item, base)?);
                }
                Ok(Value::Array(expanded))
            }
            other => Ok(other.clone()),
        }
    }

    fn expand_ref(&mut self, reference: &str, base: &str, original: &Value) -> Result<Value> {
        let (locator, pointer) = split_reference(reference, base);
        let target_id = format!("{locator}#{pointer}");

        if self.in_progress.contains(&target_id) {
            // Cycle: keep the pointer instead of recursing forever.
            trace!("reference '{reference}' revisits '{target_id}', left as pointer");
            return Ok(original.clone());
        }

        let document = self.document(&locator, reference)?;
        let target = if pointer.is_empty() {
            document
        } else {
            document.pointer(&pointer).cloned().ok_or_else(|| {
                Error::expansion(
                    reference,
                    format!("pointer '{pointer}' not found in '{locator}'"),
                )
            })?
        };

        self.in_progress.insert(target_id.clone());
        // The target document becomes the base for anything nested in it.
        let expanded = self.expand_value(&target, &locator);
        self.in_progress.remove(&target_id);
        expanded
    }

    fn document(&mut self, locator: &str, reference: &str) -> Result<Value> {
        if let Some(doc) = self.documents.get(locator) {
            return Ok(doc.clone());
        }
        debug!("fetching external reference target '{locator}'");
        let raw = self
            .options
            .resolve(locator)
            .map_err(|e| Error::expansion(reference, e.to_string()))?;
        let value = parser::decode(&raw, locator)
            .map_err(|e| Error::expansion(reference, e.to_string()))?;
        self.documents.insert(locator.to_string(), value.clone());
        Ok(value)
    }
}

/// Split a reference into the locator of the document it targets and a
/// JSON pointer within it. An empty document part targets the base
/// document; relative document parts join against the base locator.
fn split_reference(reference: &str, base: &str) -> (String, String) {
    let (doc_part, pointer) = match reference.split_once('#') {
        Some((doc, ptr)) => (doc, ptr.to_string()),
        None => (reference, String::new()),
    };
    if doc_part.is_empty() {
        (base.to_string(), pointer)
    } else {
        (join_locator(base, doc_part), pointer)
    }
}

/// Resolve a possibly relative document locator against a base locator.
/// URL bases join per RFC 3986; filesystem bases join against the base
/// document's directory. Joined paths are lexically normalized so that
/// `./shared.json` and `shared.json` name the same memoization and
/// cycle-identity key.
pub(crate) fn join_locator(base: &str, reference: &str) -> String {
    if as_http_url(reference).is_some() || Path::new(reference).is_absolute() {
        return reference.to_string();
    }
    if let Some(base_url) = as_http_url(base) {
        return base_url
            .join(reference)
            .as_ref()
            .map(Url::as_str)
            .unwrap_or(reference)
            .to_string();
    }
    let joined = match Path::new(base).parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.join(reference),
        _ => PathBuf::from(reference),
    };
    normalize(&joined).to_string_lossy().into_owned()
}

/// Remove `.` components and fold `..` into the preceding component
/// without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    normalized.push(component.as_os_str());
                }
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
