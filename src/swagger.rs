//! Typed top-level model of a Swagger 2.0 specification document
//!
//! Only the top level is strongly typed; everything below it stays as
//! JSON values so that arbitrary vendor extensions and schema shapes
//! survive a load/serialize round trip unchanged. Unknown top-level
//! fields are preserved in `extras`.
//!
//! Copyright (c) 2025 specloads contributors
//! Licensed under the Apache-2.0 license

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A Swagger 2.0 document root.
///
/// `Clone` produces a deep, independent copy: the underlying
/// representation is a value tree, so structural equality holds between
/// a clone and its original while mutation of either never shows through
/// the other.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Swagger {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swagger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<Info>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(rename = "basePath", skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub schemes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub consumes: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub produces: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<Map<String, Value>>,
    /// The reusable-component section restored by `reset_definitions`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definitions: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responses: Option<Map<String, Value>>,
    #[serde(rename = "securityDefinitions", skip_serializing_if = "Option::is_none")]
    pub security_definitions: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Value>,
    #[serde(rename = "externalDocs", skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<Value>,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}

/// The `info` section of a document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Info {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "termsOfService", skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(flatten)]
    pub extras: Map<String, Value>,
}
