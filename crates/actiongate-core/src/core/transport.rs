// crates/actiongate-core/src/core/transport.rs
// ============================================================================
// Module: ActionGate Transport Parameters
// Description: Raw parameters collected from HTTP query strings, forms, and bodies.
// Purpose: Accumulate repeated keys without ever dropping a value.
// Dependencies: indexmap, serde_json
// ============================================================================

//! ## Overview
//! [`TransportParams`] is an insertion-ordered multimap. Inserting a key that
//! already holds a value coalesces both into a list, promoting a scalar to a
//! one-element list first, so repeated form fields keep submission order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use indexmap::IndexMap;

// ============================================================================
// SECTION: Values
// ============================================================================

/// File received through a multipart upload.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Client-supplied file name (untrusted).
    pub filename: String,
    /// Declared content type.
    pub content_type: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedFile")
            .field("filename", &self.filename)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// One raw parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportValue {
    /// JSON boolean.
    Bool(bool),
    /// String value.
    Text(String),
    /// Repeated values.
    List(Vec<TransportValue>),
    /// Uploaded file.
    Upload(UploadedFile),
    /// Shape the engine cannot bind; carries a label for the warning.
    Unsupported(&'static str),
}

impl TransportValue {
    /// Returns a short label describing the shape.
    #[must_use]
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Text(_) => "string",
            Self::List(_) => "list",
            Self::Upload(_) => "file",
            Self::Unsupported(label) => *label,
        }
    }

    /// Converts a JSON value; numbers become their decimal text.
    #[must_use]
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Bool(flag) => Self::Bool(flag),
            serde_json::Value::String(text) => Self::Text(text),
            serde_json::Value::Number(number) => Self::Text(number.to_string()),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from_json).collect())
            }
            serde_json::Value::Null => Self::Unsupported("null"),
            serde_json::Value::Object(_) => Self::Unsupported("object"),
        }
    }

    /// Diagnostic JSON view; uploads render as their client file name.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(flag) => serde_json::Value::Bool(*flag),
            Self::Text(text) => serde_json::Value::String(text.clone()),
            Self::List(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Upload(upload) => serde_json::Value::String(upload.filename.clone()),
            Self::Unsupported(_) => serde_json::Value::Null,
        }
    }
}

impl From<&str> for TransportValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for TransportValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

// ============================================================================
// SECTION: Parameter Map
// ============================================================================

/// Ordered multimap of raw parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportParams {
    /// Values keyed by parameter name, in first-seen order.
    entries: IndexMap<String, TransportValue>,
}

impl TransportParams {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds parameters from a JSON object; other JSON shapes yield an empty map.
    #[must_use]
    pub fn from_json_object(value: serde_json::Value) -> Self {
        let mut params = Self::new();
        if let serde_json::Value::Object(map) = value {
            for (key, value) in map {
                params.insert(key, TransportValue::from_json(value));
            }
        }
        params
    }

    /// Inserts a value, coalescing with any existing value under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: TransportValue) {
        let key = key.into();
        let Some(existing) = self.entries.get_mut(&key) else {
            self.entries.insert(key, value);
            return;
        };
        if !matches!(existing, TransportValue::List(_)) {
            let previous = std::mem::replace(existing, TransportValue::List(Vec::new()));
            if let TransportValue::List(items) = existing {
                items.push(previous);
            }
        }
        if let TransportValue::List(items) = existing {
            match value {
                TransportValue::List(more) => items.extend(more),
                other => items.push(other),
            }
        }
    }

    /// Inserts a value only when `key` is not already present.
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: TransportValue) {
        self.entries.entry(key.into()).or_insert(value);
    }

    /// Returns the value under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&TransportValue> {
        self.entries.get(key)
    }

    /// Returns true when `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterates entries in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TransportValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Returns the number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no parameter is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Diagnostic JSON object of the raw parameters, in first-seen order.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> =
            self.entries.iter().map(|(key, value)| (key.clone(), value.to_json())).collect();
        serde_json::Value::Object(map)
    }
}

impl<K: Into<String>, V: Into<TransportValue>> FromIterator<(K, V)> for TransportParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value.into());
        }
        params
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::print_stdout,
        clippy::print_stderr,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::use_debug,
        clippy::dbg_macro,
        clippy::panic_in_result_fn,
        clippy::unwrap_in_result,
        reason = "Test-only output and panic-based assertions are permitted."
    )]

    use super::*;

    #[test]
    fn repeated_keys_coalesce_in_order() {
        let params: TransportParams =
            [("tag", "a"), ("tag", "b"), ("tag", "c"), ("name", "x")].into_iter().collect();
        assert_eq!(
            params.get("tag"),
            Some(&TransportValue::List(vec!["a".into(), "b".into(), "c".into()]))
        );
        assert_eq!(params.get("name"), Some(&TransportValue::Text("x".into())));
    }

    #[test]
    fn list_after_scalar_extends() {
        let mut params = TransportParams::new();
        params.insert("tag", "a".into());
        params.insert("tag", TransportValue::List(vec!["b".into(), "c".into()]));
        assert_eq!(
            params.get("tag"),
            Some(&TransportValue::List(vec!["a".into(), "b".into(), "c".into()]))
        );
    }

    #[test]
    fn json_shapes_are_labelled() {
        let params = TransportParams::from_json_object(serde_json::json!({
            "n": 3,
            "nested": {"a": 1},
            "nothing": null,
        }));
        assert_eq!(params.get("n"), Some(&TransportValue::Text("3".into())));
        assert_eq!(params.get("nested").map(TransportValue::shape), Some("object"));
        assert_eq!(params.get("nothing").map(TransportValue::shape), Some("null"));
    }

    #[test]
    fn diagnostic_view_names_uploads_without_contents() {
        let mut params = TransportParams::new();
        params.insert("tag", "a".into());
        params.insert("tag", "b".into());
        params.insert(
            "file",
            TransportValue::Upload(UploadedFile {
                filename: "dump.tar".to_string(),
                content_type: None,
                bytes: b"secret".to_vec(),
            }),
        );
        assert_eq!(params.to_json(), serde_json::json!({"tag": ["a", "b"], "file": "dump.tar"}));
    }
}
