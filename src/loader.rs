//! Pluggable loader chain resolving a document locator to raw bytes
//!
//! Loaders form a persistent singly-linked chain of (matcher, fetch)
//! pairs. Registration prepends a new head and never mutates the tail,
//! so a base chain can be shared read-only across concurrent resolves
//! and extended per call without copying.
//!
//! Resolution commits to the first entry whose matcher accepts the
//! locator: once matched, that entry's fetch result is final, success or
//! error. An entry with no matcher always matches, which makes it the
//! universal fallback for every locator not claimed by an earlier entry;
//! registering one anywhere but last shadows everything behind it.
//!
//! Copyright (c) 2025 specloads contributors
//! Licensed under the Apache-2.0 license

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use log::{debug, trace};
use url::Url;

use crate::error::{Error, Result};

/// Predicate deciding whether a loader entry applies to a locator
pub type Matcher = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Fetch function mapping a matched locator to raw bytes
pub type Fetcher = Arc<dyn Fn(&str) -> Result<Vec<u8>> + Send + Sync>;

/// Caller-supplied abstraction replacing direct filesystem access for
/// non-URL locators.
pub trait VirtualFs: Send + Sync {
    fn open(&self, path: &str) -> std::io::Result<Vec<u8>>;
}

/// Transport-level parameters applied by the built-in default fetchers.
#[derive(Clone, Default)]
pub struct Transport {
    /// Header name/value pairs, applied only to HTTP(S) fetches
    pub headers: BTreeMap<String, String>,
    /// Request timeout for HTTP(S) fetches; the only abort mechanism
    pub timeout: Option<Duration>,
    /// Virtual filesystem substituted for local reads when set
    pub virtual_fs: Option<Arc<dyn VirtualFs>>,
    /// HTTP client built on first fetch and reused afterwards, so an
    /// expansion touching many external references shares one
    /// connection pool. Clones share the same client.
    client: Arc<OnceLock<reqwest::blocking::Client>>,
}

impl Transport {
    fn http_client(&self, url: &Url) -> Result<&reqwest::blocking::Client> {
        if let Some(client) = self.client.get() {
            return Ok(client);
        }
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| Error::fetch(url.as_str(), e))?;
        Ok(self.client.get_or_init(|| client))
    }

    /// Drop the cached client; the next fetch rebuilds it with the
    /// current timeout.
    pub(crate) fn reset_client(&mut self) {
        self.client = Arc::new(OnceLock::new());
    }
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("headers", &self.headers)
            .field("timeout", &self.timeout)
            .field("virtual_fs", &self.virtual_fs.is_some())
            .finish()
    }
}

/// One entry of the loader chain: a match predicate paired with a fetch
/// function. A `None` matcher always matches.
#[derive(Clone)]
pub struct DocMatcher {
    matcher: Option<Matcher>,
    fetch: Option<Fetcher>,
}

impl DocMatcher {
    /// Create an entry from a fetch function and a match predicate
    pub fn new<F, M>(fetch: F, matcher: M) -> Self
    where
        F: Fn(&str) -> Result<Vec<u8>> + Send + Sync + 'static,
        M: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            matcher: Some(Arc::new(matcher)),
            fetch: Some(Arc::new(fetch)),
        }
    }

    /// Create an always-matching entry: the universal fallback for every
    /// locator not claimed by an entry registered after it
    pub fn with_fetch<F>(fetch: F) -> Self
    where
        F: Fn(&str) -> Result<Vec<u8>> + Send + Sync + 'static,
    {
        Self {
            matcher: None,
            fetch: Some(Arc::new(fetch)),
        }
    }

    fn matches(&self, locator: &str) -> bool {
        self.matcher.as_ref().map_or(true, |m| m(locator))
    }

    fn invoke(&self, locator: &str) -> Result<Vec<u8>> {
        match &self.fetch {
            Some(fetch) => fetch(locator),
            None => Err(Error::configuration(format!(
                "loader entry matched '{locator}' but has no fetch function"
            ))),
        }
    }
}

impl fmt::Debug for DocMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocMatcher")
            .field("matcher", &self.matcher.is_some())
            .field("fetch", &self.fetch.is_some())
            .finish()
    }
}

struct Node {
    entry: DocMatcher,
    next: Option<Arc<Node>>,
}

/// Immutable chain of loader entries, walked head to tail.
///
/// The empty chain resolves every locator through the built-in default:
/// `http`/`https` URLs over HTTP, everything else from the (virtual)
/// filesystem.
#[derive(Clone, Default)]
pub struct LoaderChain {
    head: Option<Arc<Node>>,
}

impl LoaderChain {
    /// Chain with no registered entries
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new chain with `entry` prepended. The receiver is left
    /// untouched; the new head shares the old tail structurally, so
    /// callers concurrently walking the old chain are unaffected.
    /// Entries registered later take priority over earlier ones.
    #[must_use]
    pub fn register(&self, entry: DocMatcher) -> Self {
        Self {
            head: Some(Arc::new(Node {
                entry,
                next: self.head.clone(),
            })),
        }
    }

    /// Number of registered entries (excluding the built-in default)
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut node = self.head.as_deref();
        while let Some(n) = node {
            count += 1;
            node = n.next.as_deref();
        }
        count
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Resolve a locator to raw bytes. The first entry whose matcher
    /// accepts the locator is committed, even if its fetch fails; later
    /// entries are never consulted after a match. With the chain
    /// exhausted, the built-in default applies.
    pub fn resolve(&self, locator: &str, transport: &Transport) -> Result<Vec<u8>> {
        let mut node = self.head.as_deref();
        let mut position = 0usize;
        while let Some(n) = node {
            if n.entry.matches(locator) {
                trace!("loader entry {position} matched '{locator}'");
                return n.entry.invoke(locator);
            }
            node = n.next.as_deref();
            position += 1;
        }
        trace!("no loader entry matched '{locator}', using default");
        default_fetch(locator, transport)
    }
}

impl fmt::Debug for LoaderChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderChain")
            .field("entries", &self.len())
            .finish()
    }
}

/// Parse a locator as an HTTP(S) URL, if it is one
pub(crate) fn as_http_url(locator: &str) -> Option<Url> {
    Url::parse(locator)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"))
}

/// Built-in fallback strategy: HTTP(S) URLs over the network, anything
/// else from the virtual or local filesystem.
pub(crate) fn default_fetch(locator: &str, transport: &Transport) -> Result<Vec<u8>> {
    match as_http_url(locator) {
        Some(url) => http_fetch(&url, transport),
        None => local_fetch(locator, transport),
    }
}

fn local_fetch(locator: &str, transport: &Transport) -> Result<Vec<u8>> {
    if let Some(vfs) = &transport.virtual_fs {
        debug!("reading '{locator}' from virtual filesystem");
        return vfs.open(locator).map_err(|e| Error::fetch(locator, e));
    }
    debug!("reading '{locator}' from local filesystem");
    std::fs::read(locator).map_err(|e| Error::fetch(locator, e))
}

fn http_fetch(url: &Url, transport: &Transport) -> Result<Vec<u8>> {
    debug!("fetching '{url}' over HTTP");
    let client = transport.http_client(url)?;

    let mut request = client.get(url.clone());
    for (name, value) in &transport.headers {
        request = request.header(name, value);
    }

    // Single attempt, no retry. Non-success statuses surface as fetch
    // errors carrying the status code.
    let response = request
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::fetch(url.as_str(), e))?;

    let body = response.bytes().map_err(|e| Error::fetch(url.as_str(), e))?;
    Ok(body.to_vec())
}
