//! specloads - loading and expansion of API specification documents
//!
//! This crate loads a Swagger 2.0 description document from a file path,
//! an HTTP(S) URL, or a virtual filesystem, normalizes it to a canonical
//! in-memory form, and can produce a fully self-contained version with
//! all `$ref` pointers resolved.
//!
//! ## Features
//!
//! - **Pluggable loaders**: a chain of (matcher, fetch) pairs resolved
//!   by first match, with a filesystem/HTTP default; custom loaders
//!   override defaults by registering after them
//! - **Pristine/working separation**: caller edits never leak into the
//!   originally decoded structure, and can always be discarded
//! - **Reference expansion**: internal and external `$ref`s are inlined
//!   on demand, with cyclic chains preserved as pointers instead of
//!   recursing forever
//! - **JSON and YAML**: YAML input is converted to JSON-compatible
//!   values at decode time
//!
//! ## Quick Start
//!
//! ```no_run
//! let mut document = specloads::spec("api/swagger.yaml")?;
//! println!("loaded spec for host {:?}", document.host());
//!
//! let expanded = document.expanded()?;
//! println!("definitions: {:?}", expanded.definitions.as_ref().map(|d| d.len()));
//! # Ok::<(), specloads::Error>(())
//! ```
//!
//! Custom loaders are registered through [`LoadOptions`]; the most
//! recently registered loader wins:
//!
//! ```no_run
//! use specloads::{Document, Error, LoadOptions};
//!
//! let options = LoadOptions::new().with_doc_loader_match(
//!     |locator: &str| std::fs::read(locator).map_err(|e| Error::fetch(locator, e)),
//!     |locator: &str| locator.ends_with(".json"),
//! );
//! let document = Document::load("spec.json", options)?;
//! # Ok::<(), specloads::Error>(())
//! ```
//!
//! Copyright (c) 2025 specloads contributors
//! Licensed under the Apache-2.0 license

pub mod document;
pub mod error;
pub mod expand;
pub mod loader;
pub mod options;
pub mod parser;
pub mod swagger;

pub use document::Document;
pub use error::{Error, Result};
pub use loader::{DocMatcher, Fetcher, LoaderChain, Matcher, Transport, VirtualFs};
pub use options::LoadOptions;
pub use parser::Format;
pub use swagger::{Info, Swagger};

/// Load a document from a path or URL with the default loader chain
pub fn spec(locator: &str) -> Result<Document> {
    Document::load(locator, LoadOptions::default())
}

/// Load a document from a path or URL with custom options
pub fn spec_with(locator: &str, options: LoadOptions) -> Result<Document> {
    Document::load(locator, options)
}

/// Load a document with a JSON loader registered ahead of the defaults:
/// `.json` locators are read from the filesystem and must parse as JSON
pub fn json_spec(locator: &str) -> Result<Document> {
    let options = LoadOptions::default().with_doc_loader_match(
        |pth: &str| std::fs::read(pth).map_err(|e| Error::fetch(pth, e)),
        |pth: &str| Format::from_locator(pth) == Some(Format::Json),
    );
    Document::load(locator, options)
}

/// Build a document from in-memory bytes; an empty version defaults to 2.0
pub fn analyzed(raw: Vec<u8>, version: &str) -> Result<Document> {
    Document::analyzed(raw, version)
}

/// Build a document from separate raw and normalized spec bytes
pub fn embedded(raw: Vec<u8>, spec: Vec<u8>) -> Result<Document> {
    Document::embedded(raw, spec)
}
