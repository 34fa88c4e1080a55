//! Format detection and decoding of raw document bytes
//!
//! JSON is parsed directly; YAML is parsed and converted to
//! JSON-compatible values, so the rest of the crate only ever deals
//! with `serde_json::Value`.
//!
//! Copyright (c) 2025 specloads contributors
//! Licensed under the Apache-2.0 license

use serde_json::Value;

use crate::error::{Error, Result};

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Yaml,
}

impl Format {
    /// Detect format from a locator's extension, when it has a known one
    pub fn from_locator(locator: &str) -> Option<Self> {
        let path = locator.split(['?', '#']).next().unwrap_or(locator);
        let ext = path.rsplit('.').next()?;
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Format::Json),
            "yaml" | "yml" => Some(Format::Yaml),
            _ => None,
        }
    }
}

/// Decode raw bytes into a canonical JSON value.
///
/// The locator's extension selects the decoder when recognized;
/// otherwise the content decides: bytes opening with `{` or `[` are
/// JSON, everything else goes through the YAML conversion.
pub fn decode(raw: &[u8], locator: &str) -> Result<Value> {
    match Format::from_locator(locator) {
        Some(Format::Json) => parse_json(raw, locator),
        Some(Format::Yaml) => yaml_to_json(raw, locator),
        None => {
            if looks_like_json(raw) {
                parse_json(raw, locator)
            } else {
                yaml_to_json(raw, locator)
            }
        }
    }
}

/// Parse YAML bytes and convert the result to a JSON-compatible value.
/// YAML that cannot be represented in JSON (e.g. non-string map keys)
/// is a decode error.
pub fn yaml_to_json(raw: &[u8], locator: &str) -> Result<Value> {
    let yaml: serde_yaml::Value =
        serde_yaml::from_slice(raw).map_err(|e| Error::decode(locator, e.to_string()))?;
    serde_json::to_value(yaml).map_err(|e| {
        Error::decode(
            locator,
            format!("YAML document is not representable as JSON: {e}"),
        )
    })
}

fn parse_json(raw: &[u8], locator: &str) -> Result<Value> {
    serde_json::from_slice(raw).map_err(|e| Error::decode(locator, e.to_string()))
}

fn looks_like_json(raw: &[u8]) -> bool {
    let trimmed = strip_bom(raw)
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .copied();
    matches!(trimmed, Some(b'{') | Some(b'['))
}

fn strip_bom(raw: &[u8]) -> &[u8] {
    raw.strip_prefix(b"\xef\xbb\xbf").unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_locator("spec.json"), Some(Format::Json));
        assert_eq!(Format::from_locator("spec.yaml"), Some(Format::Yaml));
        assert_eq!(Format::from_locator("spec.yml"), Some(Format::Yaml));
        assert_eq!(
            Format::from_locator("https://example.com/spec.json?version=2"),
            Some(Format::Json)
        );
        assert_eq!(Format::from_locator("spec.txt"), None);
        assert_eq!(Format::from_locator("spec"), None);
    }

    #[test]
    fn test_decode_json() {
        let value = decode(br#"{"swagger": "2.0", "paths": {}}"#, "spec.json").unwrap();
        assert_eq!(value["swagger"], "2.0");
    }

    #[test]
    fn test_decode_yaml() {
        let value = decode(b"swagger: '2.0'\nhost: api.example.com\n", "spec.yaml").unwrap();
        assert_eq!(value["swagger"], "2.0");
        assert_eq!(value["host"], "api.example.com");
    }

    #[test]
    fn test_decode_sniffs_content_without_extension() {
        let json = decode(br#"  {"swagger": "2.0"}"#, "<memory>").unwrap();
        assert_eq!(json["swagger"], "2.0");

        let yaml = decode(b"swagger: '2.0'", "<memory>").unwrap();
        assert_eq!(yaml["swagger"], "2.0");
    }

    #[test]
    fn test_decode_strips_bom() {
        let mut raw = b"\xef\xbb\xbf".to_vec();
        raw.extend_from_slice(br#"{"swagger": "2.0"}"#);
        let value = decode(&raw, "<memory>").unwrap();
        assert_eq!(value["swagger"], "2.0");
    }

    #[test]
    fn test_malformed_json_is_a_decode_error() {
        let err = decode(b"{]", "bad.json").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        assert_eq!(err.locator(), Some("bad.json"));
    }

    #[test]
    fn test_yaml_non_string_keys_are_a_decode_error() {
        // a sequence used as a map key has no JSON representation
        let err = decode(b"? [1, 2]\n: pair\n", "keys.yaml").unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }
}
