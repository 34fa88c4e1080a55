//! Configuration surface for document loading
//!
//! Options carry the loader chain and the transport parameters used by
//! the built-in default fetchers. There is no global mutable registry:
//! the default chain is an explicit value, and customization always goes
//! through `register`, which leaves shared chains untouched.
//!
//! Copyright (c) 2025 specloads contributors
//! Licensed under the Apache-2.0 license

use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::loader::{DocMatcher, LoaderChain, Transport, VirtualFs};

/// Options controlling how a document is fetched and which loaders apply.
///
/// Cheap to clone; the chain shares structure and the transport holds
/// only small values. A Document keeps its options so that expansion of
/// external references reuses the same chain transitively.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    loaders: LoaderChain,
    transport: Transport,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an always-matching loader. It becomes the fallback for
    /// every locator not claimed by a loader registered after it.
    #[must_use]
    pub fn with_doc_loader<F>(mut self, fetch: F) -> Self
    where
        F: Fn(&str) -> Result<Vec<u8>> + Send + Sync + 'static,
    {
        self.loaders = self.loaders.register(DocMatcher::with_fetch(fetch));
        self
    }

    /// Register a loader gated by a match predicate. Loaders registered
    /// later take priority.
    #[must_use]
    pub fn with_doc_loader_match<F, M>(mut self, fetch: F, matcher: M) -> Self
    where
        F: Fn(&str) -> Result<Vec<u8>> + Send + Sync + 'static,
        M: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.loaders = self.loaders.register(DocMatcher::new(fetch, matcher));
        self
    }

    /// Register a pre-built loader entry
    #[must_use]
    pub fn with_loader(mut self, entry: DocMatcher) -> Self {
        self.loaders = self.loaders.register(entry);
        self
    }

    /// Add a header applied to HTTP(S) fetches only
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.transport.headers.insert(name.into(), value.into());
        self
    }

    /// Set the transport-level timeout for HTTP(S) fetches. This is the
    /// only way to abort a slow fetch; there is no cancellation primitive.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.transport.timeout = Some(timeout);
        // the cached HTTP client bakes in the timeout at build time
        self.transport.reset_client();
        self
    }

    /// Substitute a virtual filesystem for local reads of non-URL locators
    #[must_use]
    pub fn with_virtual_fs(mut self, vfs: Arc<dyn VirtualFs>) -> Self {
        self.transport.virtual_fs = Some(vfs);
        self
    }

    /// The configured loader chain
    pub fn loaders(&self) -> &LoaderChain {
        &self.loaders
    }

    /// Resolve a locator through the configured chain and transport
    pub(crate) fn resolve(&self, locator: &str) -> Result<Vec<u8>> {
        self.loaders.resolve(locator, &self.transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_builder_accumulates_loaders() {
        let options = LoadOptions::new()
            .with_doc_loader_match(|_| Ok(b"json".to_vec()), |l: &str| l.ends_with(".json"))
            .with_doc_loader_match(|_| Ok(b"yaml".to_vec()), |l: &str| l.ends_with(".yaml"));

        assert_eq!(options.loaders().len(), 2);
        assert_eq!(options.resolve("a.json").unwrap(), b"json");
        assert_eq!(options.resolve("a.yaml").unwrap(), b"yaml");
    }

    #[test]
    fn test_last_registered_replaces_earlier_catch_all() {
        // Mirrors replacing a catch-all loader: only the last one runs.
        let options = LoadOptions::new()
            .with_doc_loader(|_| Ok(b"first".to_vec()))
            .with_doc_loader(|_| Ok(b"second".to_vec()));

        assert_eq!(options.resolve("anything").unwrap(), b"second");
    }

    #[test]
    fn test_options_clone_is_independent() {
        let base = LoadOptions::new().with_doc_loader(|_| Ok(b"base".to_vec()));
        let extended = base
            .clone()
            .with_doc_loader(|l: &str| Err(Error::fetch(l, "nope".to_string())));

        assert_eq!(base.resolve("x").unwrap(), b"base");
        assert!(extended.resolve("x").is_err());
    }

    #[test]
    fn test_header_collection() {
        let options = LoadOptions::new()
            .with_header("Authorization", "Bearer token")
            .with_header("Accept", "application/json");
        // headers only influence HTTP fetches; just check they are kept
        assert_eq!(options.transport.headers.len(), 2);
    }
}
