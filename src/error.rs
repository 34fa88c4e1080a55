//! Error types for document loading and expansion
//!
//! Copyright (c) 2025 specloads contributors
//! Licensed under the Apache-2.0 license

use std::error::Error as StdError;
use thiserror::Error;

/// Result type for load and expansion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced while fetching, decoding, or expanding a specification
/// document.
///
/// None of these are retried internally; they are reported synchronously
/// from the operation that detected them.
#[derive(Error, Debug)]
pub enum Error {
    /// The locator could not be fetched: unreachable host, non-success
    /// HTTP status, missing file, or an invalid loader locator.
    #[error("failed to fetch '{locator}': {source}")]
    Fetch {
        locator: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// The fetched bytes could not be decoded into a specification
    /// structure: malformed JSON/YAML, YAML that has no JSON-compatible
    /// representation, or an unsupported spec version.
    #[error("failed to decode '{locator}': {reason}")]
    Decode { locator: String, reason: String },

    /// A reference could not be expanded: broken pointer target or a
    /// nested fetch failure during external reference resolution.
    #[error("failed to expand reference '{reference}': {reason}")]
    Expansion { reference: String, reason: String },

    /// A caller-supplied option is structurally invalid, e.g. a loader
    /// entry with no fetch function that ends up being committed.
    #[error("invalid loader configuration: {reason}")]
    Configuration { reason: String },
}

impl Error {
    /// Create a fetch error with locator context
    pub fn fetch(
        locator: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self::Fetch {
            locator: locator.into(),
            source: source.into(),
        }
    }

    /// Create a decode error with locator context
    pub fn decode(locator: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            locator: locator.into(),
            reason: reason.into(),
        }
    }

    /// Create an expansion error for a reference
    pub fn expansion(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Expansion {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Get the locator or reference associated with this error, if any
    pub fn locator(&self) -> Option<&str> {
        match self {
            Self::Fetch { locator, .. } => Some(locator),
            Self::Decode { locator, .. } => Some(locator),
            Self::Expansion { reference, .. } => Some(reference),
            Self::Configuration { .. } => None,
        }
    }
}
