//! The document aggregate: raw bytes, pristine/working/expanded views
//!
//! A `Document` binds the bytes fetched for one locator to the decoded
//! specification structure in three forms: the pristine copy as
//! originally decoded, the working copy callers may mutate, and a lazily
//! computed expanded copy with references dereferenced. The pristine
//! copy never changes after load; the working and expanded copies never
//! share storage with it.
//!
//! A `Document` is owned by one logical operation at a time; callers
//! needing concurrent mutation must serialize access themselves.
//!
//! Copyright (c) 2025 specloads contributors
//! Licensed under the Apache-2.0 license

use log::debug;

use crate::error::{Error, Result};
use crate::expand;
use crate::options::LoadOptions;
use crate::parser;
use crate::swagger::Swagger;

/// The only spec version this crate understands
const SUPPORTED_VERSION: &str = "2.0";

/// Locator recorded for documents built from in-memory bytes
const MEMORY_LOCATOR: &str = "";

/// A loaded specification document.
///
/// Cloning a `Document` deep-copies every representation; the clone and
/// the original never observe each other's mutations.
#[derive(Debug, Clone)]
pub struct Document {
    raw: Vec<u8>,
    specfile: String,
    options: LoadOptions,
    pristine: Swagger,
    working: Swagger,
    expanded: Option<Swagger>,
}

impl Document {
    /// Fetch `locator` through the chain configured in `options`, decode
    /// the bytes, and build a document. Both fetch and decode failures
    /// abort the load; no partial document is ever returned.
    pub fn load(locator: &str, options: LoadOptions) -> Result<Document> {
        debug!("loading document from '{locator}'");
        let raw = options.resolve(locator)?;
        Self::from_raw(raw, locator.to_string(), options)
    }

    /// Build a document from in-memory bytes. An empty `version` defaults
    /// to "2.0"; any other version is unsupported.
    pub fn analyzed(raw: Vec<u8>, version: &str) -> Result<Document> {
        if !version.is_empty() && version != SUPPORTED_VERSION {
            return Err(Error::decode(
                MEMORY_LOCATOR,
                format!("spec version '{version}' is not supported"),
            ));
        }
        Self::from_raw(raw, MEMORY_LOCATOR.to_string(), LoadOptions::default())
    }

    /// Build a document from separate raw bytes and an already
    /// normalized specification, without any fetch.
    pub fn embedded(raw: Vec<u8>, spec: Vec<u8>) -> Result<Document> {
        let value = parser::decode(&spec, MEMORY_LOCATOR)?;
        let working: Swagger =
            serde_json::from_value(value).map_err(|e| Error::decode(MEMORY_LOCATOR, e.to_string()))?;
        Ok(Document {
            raw,
            specfile: MEMORY_LOCATOR.to_string(),
            options: LoadOptions::default(),
            pristine: working.clone(),
            working,
            expanded: None,
        })
    }

    fn from_raw(raw: Vec<u8>, specfile: String, options: LoadOptions) -> Result<Document> {
        let value = parser::decode(&raw, &specfile)?;

        if let Some(found) = value.get("swagger") {
            if found.as_str() != Some(SUPPORTED_VERSION) {
                return Err(Error::decode(
                    &specfile,
                    format!("spec version {found} is not supported"),
                ));
            }
        }

        let mut working: Swagger =
            serde_json::from_value(value).map_err(|e| Error::decode(&specfile, e.to_string()))?;
        if working.swagger.is_none() {
            working.swagger = Some(SUPPORTED_VERSION.to_string());
        }

        Ok(Document {
            raw,
            specfile,
            options,
            pristine: working.clone(),
            working,
            expanded: None,
        })
    }

    /// The bytes as originally fetched, byte for byte
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// The working structure
    pub fn spec(&self) -> &Swagger {
        &self.working
    }

    /// Mutable access to the working structure. Taking this borrow
    /// invalidates any previously computed expanded result, so a later
    /// `expanded` call never serves a result predating the edit.
    pub fn spec_mut(&mut self) -> &mut Swagger {
        self.expanded = None;
        &mut self.working
    }

    /// The pristine structure as originally decoded, never mutated
    pub fn orig_spec(&self) -> &Swagger {
        &self.pristine
    }

    /// The expanded structure, computed on first call by resolving every
    /// reference in the working structure against the originating
    /// locator and the configured loader chain; cached until
    /// invalidated. Cyclic reference chains are preserved as pointers.
    ///
    /// On failure the working and pristine structures are untouched and
    /// nothing is cached, so a later call retries fresh.
    pub fn expanded(&mut self) -> Result<&Swagger> {
        match self.expanded {
            Some(ref expanded) => Ok(expanded),
            None => {
                let expanded = expand::expand(&self.working, &self.specfile, &self.options)?;
                Ok(self.expanded.insert(expanded))
            }
        }
    }

    /// Restore the working structure's definitions from the pristine
    /// copy, discarding accumulated edits to that section, and
    /// invalidate the expanded cache.
    pub fn reset_definitions(&mut self) -> &mut Self {
        self.working.definitions = self.pristine.definitions.clone();
        self.expanded = None;
        self
    }

    /// A new document whose working copy is a deep copy of this
    /// document's pristine structure, sharing raw bytes, locator, and
    /// options. No filesystem or network access happens.
    pub fn pristine(&self) -> Document {
        Document {
            raw: self.raw.clone(),
            specfile: self.specfile.clone(),
            options: self.options.clone(),
            pristine: self.pristine.clone(),
            working: self.pristine.clone(),
            expanded: None,
        }
    }

    /// The locator this document was loaded from; empty for in-memory
    /// documents
    pub fn spec_file_path(&self) -> &str {
        &self.specfile
    }

    /// The spec version of the working structure
    pub fn version(&self) -> &str {
        self.working.swagger.as_deref().unwrap_or_default()
    }

    /// The host of the working structure, when set
    pub fn host(&self) -> Option<&str> {
        self.working.host.as_deref()
    }

    /// The base path of the working structure, when set
    pub fn base_path(&self) -> Option<&str> {
        self.working.base_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    const MINIMAL_YAML: &[u8] = b"swagger: \"2.0\"\nhost: api.example.com\ninfo:\n  version: \"2.0\"\npaths: {}\n";

    const PETS_JSON: &str = r##"{
  "swagger": "2.0",
  "info": {"title": "Pets", "version": "1.0.0"},
  "host": "petstore.example.com",
  "basePath": "/api",
  "paths": {
    "/pets": {
      "get": {
        "responses": {
          "200": {"schema": {"$ref": "#/definitions/Pet"}}
        }
      }
    }
  },
  "definitions": {
    "Pet": {"type": "object", "properties": {"name": {"type": "string"}}}
  }
}"##;

    fn write_fixture(dir: &tempfile::TempDir, name: &str, content: &[u8]) -> String {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn test_load_minimal_yaml() {
        let dir = tempdir().unwrap();
        let path = write_fixture(&dir, "spec.yaml", MINIMAL_YAML);

        let document = Document::load(&path, LoadOptions::default()).unwrap();
        assert_eq!(document.host(), Some("api.example.com"));
        assert_eq!(document.version(), "2.0");
        assert_eq!(
            document
                .spec()
                .info
                .as_ref()
                .and_then(|i| i.version.as_deref()),
            Some("2.0")
        );
        assert_eq!(document.spec_file_path(), path);
    }

    #[test]
    fn test_raw_is_byte_for_byte() {
        let dir = tempdir().unwrap();
        let path = write_fixture(&dir, "spec.yaml", MINIMAL_YAML);

        let document = Document::load(&path, LoadOptions::default()).unwrap();
        assert_eq!(document.raw(), MINIMAL_YAML);

        let json_doc = Document::analyzed(PETS_JSON.as_bytes().to_vec(), "").unwrap();
        assert_eq!(json_doc.raw(), PETS_JSON.as_bytes());
    }

    #[test]
    fn test_load_failure_surfaces_fetch_error() {
        let err = Document::load("/no/such/spec.yaml", LoadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }

    #[test]
    fn test_load_failure_surfaces_decode_error() {
        let dir = tempdir().unwrap();
        let path = write_fixture(&dir, "bad.json", b"{]");
        let err = Document::load(&path, LoadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_analyzed_version_gate() {
        assert!(Document::analyzed(PETS_JSON.as_bytes().to_vec(), "2.0").is_ok());
        let err = Document::analyzed(PETS_JSON.as_bytes().to_vec(), "0.9").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_version_defaults_to_20() {
        let document =
            Document::analyzed(br#"{"info": {"version": "1.0.0"}, "paths": {}}"#.to_vec(), "")
                .unwrap();
        assert_eq!(document.version(), "2.0");
    }

    #[test]
    fn test_embedded_round_trip() {
        let source = Document::analyzed(PETS_JSON.as_bytes().to_vec(), "").unwrap();
        let spec_bytes = serde_json::to_vec(source.spec()).unwrap();

        let document = Document::embedded(source.raw().to_vec(), spec_bytes).unwrap();
        assert_eq!(document.raw(), source.raw());
        assert_eq!(document.spec(), source.spec());
    }

    #[test]
    fn test_working_mutation_does_not_touch_pristine() {
        let mut document = Document::analyzed(PETS_JSON.as_bytes().to_vec(), "").unwrap();

        document.spec_mut().definitions = None;
        assert!(document.spec().definitions.is_none());
        assert!(document
            .orig_spec()
            .definitions
            .as_ref()
            .is_some_and(|d| d.contains_key("Pet")));
    }

    #[test]
    fn test_reset_definitions_restores_pristine_section() {
        let mut document = Document::analyzed(PETS_JSON.as_bytes().to_vec(), "").unwrap();

        document.spec_mut().definitions = None;
        document.reset_definitions();

        assert_eq!(document.spec().definitions, document.orig_spec().definitions);
        assert!(document
            .spec()
            .definitions
            .as_ref()
            .is_some_and(|d| d.contains_key("Pet")));
    }

    #[test]
    fn test_pristine_view() {
        let mut document = Document::analyzed(PETS_JSON.as_bytes().to_vec(), "").unwrap();
        document.spec_mut().host = Some("mutated.example.com".to_string());

        let view = document.pristine();
        assert_eq!(view.host(), Some("petstore.example.com"));
        assert_eq!(view.raw(), document.raw());
        assert_eq!(view.spec_file_path(), document.spec_file_path());
        assert_eq!(view.spec(), document.orig_spec());
    }

    #[test]
    fn test_expanded_inlines_refs_without_mutating_working() {
        let mut document = Document::analyzed(PETS_JSON.as_bytes().to_vec(), "").unwrap();

        let expanded = document.expanded().unwrap().clone();
        let value = serde_json::to_value(&expanded).unwrap();
        let schema = &value["paths"]["/pets"]["get"]["responses"]["200"]["schema"];
        assert_eq!(schema["type"], "object");

        // the working copy still carries the pointer
        let working = serde_json::to_value(document.spec()).unwrap();
        assert_eq!(
            working["paths"]["/pets"]["get"]["responses"]["200"]["schema"]["$ref"],
            "#/definitions/Pet"
        );
        assert_eq!(document.spec(), document.orig_spec());
    }

    #[test]
    fn test_expanded_cache_invalidated_by_mutation() {
        let mut document = Document::analyzed(PETS_JSON.as_bytes().to_vec(), "").unwrap();
        document.expanded().unwrap();

        if let Some(defs) = document.spec_mut().definitions.as_mut() {
            defs.insert("Pet".to_string(), json!({"type": "string"}));
        }

        let value = serde_json::to_value(document.expanded().unwrap()).unwrap();
        assert_eq!(
            value["paths"]["/pets"]["get"]["responses"]["200"]["schema"]["type"],
            "string"
        );
    }

    #[test]
    fn test_expanded_failure_does_not_poison() {
        let mut document = Document::analyzed(
            br##"{"swagger": "2.0", "paths": {}, "definitions": {"A": {"$ref": "#/definitions/Gone"}}}"##
                .to_vec(),
            "",
        )
        .unwrap();

        assert!(document.expanded().is_err());
        assert_eq!(document.spec(), document.orig_spec());

        // repair the working copy; the retry is attempted fresh
        if let Some(defs) = document.spec_mut().definitions.as_mut() {
            defs.insert("Gone".to_string(), json!({"type": "boolean"}));
        }
        assert!(document.expanded().is_ok());
    }

    #[test]
    fn test_custom_loader_mismatch_falls_through() {
        // a .json-only custom loader is ignored for a .yaml locator
        let dir = tempdir().unwrap();
        let path = write_fixture(&dir, "spec.yaml", MINIMAL_YAML);

        let options = LoadOptions::default().with_doc_loader_match(
            |_| Ok(br#"{"swagger": "2.0", "host": "wrong.example.com", "paths": {}}"#.to_vec()),
            |l: &str| l.ends_with(".json"),
        );

        let document = Document::load(&path, options).unwrap();
        assert_eq!(document.host(), Some("api.example.com"));
    }

    #[test]
    fn test_failing_catch_all_loader_commits() {
        // the always-matching loader wins even though the default could
        // have read the file
        let dir = tempdir().unwrap();
        let path = write_fixture(&dir, "spec.yaml", MINIMAL_YAML);

        let options = LoadOptions::default().with_doc_loader(|l: &str| {
            Err(Error::fetch(l, "refused".to_string()))
        });

        let err = Document::load(&path, options).unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }));
    }

    #[test]
    fn test_custom_loader_applies_to_external_refs() {
        let dir = tempdir().unwrap();
        let main = write_fixture(
            &dir,
            "main.json",
            br#"{"swagger": "2.0", "paths": {}, "definitions": {"Remote": {"$ref": "https://example.com/shared.json#/definitions/Shared"}}}"#,
        );

        let options = LoadOptions::default().with_doc_loader_match(
            |_| Ok(br#"{"definitions": {"Shared": {"type": "number"}}}"#.to_vec()),
            |l: &str| l.starts_with("https://"),
        );

        let mut document = Document::load(&main, options).unwrap();
        let value = serde_json::to_value(document.expanded().unwrap()).unwrap();
        assert_eq!(value["definitions"]["Remote"]["type"], "number");
    }

    #[test]
    fn test_document_clone_is_independent() {
        let original = Document::analyzed(PETS_JSON.as_bytes().to_vec(), "").unwrap();
        let mut copy = original.clone();

        copy.spec_mut().host = Some("copy.example.com".to_string());
        assert_eq!(original.host(), Some("petstore.example.com"));
        assert_eq!(copy.host(), Some("copy.example.com"));
    }
}
