//! Runtime value model matched and generated against pattern trees.
//!
//! These are the concrete payload shapes the engine sees at match time and
//! produces at generation time. All numeric values use
//! `rust_decimal::Decimal` -- never `f64`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ──────────────────────────────────────────────
// XML nodes
// ──────────────────────────────────────────────

/// One XML element: tag name, attributes, ordered children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XmlNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<XmlItem>,
}

/// A child of an XML element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum XmlItem {
    Node(XmlNode),
    Text { text: String },
}

impl fmt::Display for XmlNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (key, val) in &self.attributes {
            write!(f, " {}=\"{}\"", key, val)?;
        }
        write!(f, ">")?;
        for child in &self.children {
            match child {
                XmlItem::Node(node) => write!(f, "{}", node)?,
                XmlItem::Text { text } => write!(f, "{}", text)?,
            }
        }
        write!(f, "</{}>", self.name)
    }
}

// ──────────────────────────────────────────────
// Values
// ──────────────────────────────────────────────

/// A runtime value: request/response payloads, multipart parts, and the
/// samples the generators produce.
///
/// `NoValue` is the absence of a value and is distinct from `Null` (an
/// explicit null literal on the wire).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    String(String),
    Number(Decimal),
    Boolean(bool),
    #[serde(with = "base64_bytes")]
    Binary(Vec<u8>),
    Null,
    NoValue,
    Object(BTreeMap<String, Value>),
    Array(Vec<Value>),
    Xml(XmlNode),
    MultiPartContent {
        name: String,
        content: Box<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content_type: Option<String>,
    },
    MultiPartFile {
        name: String,
        filename: String,
        #[serde(with = "base64_bytes")]
        content: Vec<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content_type: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content_encoding: Option<String>,
    },
}

impl Value {
    /// Human type name, used in mismatch messages.
    pub fn display_type(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Boolean(_) => "boolean",
            Value::Binary(_) => "binary",
            Value::Null => "null",
            Value::NoValue => "no value",
            Value::Object(_) => "object",
            Value::Array(_) => "array",
            Value::Xml(_) => "xml",
            Value::MultiPartContent { .. } => "multipart content",
            Value::MultiPartFile { .. } => "multipart file",
        }
    }

    /// The literal text form of this value, used when a submitted literal
    /// is re-interpreted as the declared content type.
    pub fn to_string_literal(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Binary(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            Value::Null => "null".to_string(),
            Value::NoValue => String::new(),
            Value::Object(_) | Value::Array(_) => {
                serde_json::to_string(&self.to_json()).unwrap_or_default()
            }
            Value::Xml(node) => node.to_string(),
            Value::MultiPartContent { content, .. } => content.to_string_literal(),
            Value::MultiPartFile { content, .. } => String::from_utf8_lossy(content).into_owned(),
        }
    }

    /// Quoted/abbreviated rendering for failure messages.
    pub fn display_value(&self) -> String {
        match self {
            Value::String(s) => format!("\"{}\"", s),
            Value::NoValue => "no value".to_string(),
            other => other.to_string_literal(),
        }
    }

    /// The part name for multipart values, `None` for everything else.
    ///
    /// Invariant: multipart values always carry a non-empty name.
    pub fn part_name(&self) -> Option<&str> {
        match self {
            Value::MultiPartContent { name, .. } | Value::MultiPartFile { name, .. } => {
                Some(name.as_str())
            }
            _ => None,
        }
    }

    /// Plain-JSON projection of object/array trees (scalars as JSON
    /// scalars), used for literal rendering.
    fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Number(n) => serde_json::from_str(&n.to_string())
                .unwrap_or_else(|_| serde_json::Value::String(n.to_string())),
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Null | Value::NoValue => serde_json::Value::Null,
            Value::Object(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            other => serde_json::Value::String(other.to_string_literal()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_literal())
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        BASE64.decode(text.as_bytes()).map_err(serde::de::Error::custom)
    }
}
