// crates/actiongate-core/src/core/arguments.rs
// ============================================================================
// Module: ActionGate Canonical Arguments
// Description: Transport-agnostic argument values and parser tokens.
// Purpose: Define the only argument shapes actions ever observe.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Both surfaces reduce their input to a stream of [`ArgToken`]s that the
//! shared parser turns into a [`CanonicalArgumentSet`]. Tokens are typed, so
//! a value that happens to start with `--` can never be mistaken for an
//! option name.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::path::Path;
use std::path::PathBuf;

use serde::Serialize;
use serde::Serializer;
use serde::ser::SerializeMap;

// ============================================================================
// SECTION: Values
// ============================================================================

/// Canonical value of one argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentValue {
    /// No value supplied and no default.
    Absent,
    /// Flag state.
    Bool(bool),
    /// Single string.
    Text(String),
    /// Ordered list of strings.
    List(Vec<String>),
    /// Path to a staged upload or a file named on the command line.
    Path(PathBuf),
}

impl ArgumentValue {
    /// Returns the string value, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the flag value, if any.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    /// Returns the list value, if any.
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the path value, if any.
    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            _ => None,
        }
    }

    /// Returns true for [`ArgumentValue::Absent`].
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    /// Converts the value to JSON (`Absent` becomes `null`).
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Absent => serde_json::Value::Null,
            Self::Bool(flag) => serde_json::Value::Bool(*flag),
            Self::Text(text) => serde_json::Value::String(text.clone()),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().cloned().map(serde_json::Value::String).collect())
            }
            Self::Path(path) => serde_json::Value::String(path.display().to_string()),
        }
    }
}

impl Serialize for ArgumentValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

// ============================================================================
// SECTION: Canonical Set
// ============================================================================

/// Ordered `(name, value)` pairs produced by the shared parser.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalArgumentSet {
    /// Entries in schema order.
    entries: Vec<(String, ArgumentValue)>,
}

impl CanonicalArgumentSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends an entry.
    pub fn push(&mut self, name: impl Into<String>, value: ArgumentValue) {
        self.entries.push((name.into(), value));
    }

    /// Returns the value bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ArgumentValue> {
        self.entries.iter().find(|(entry, _)| entry == name).map(|(_, value)| value)
    }

    /// Iterates entries in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgumentValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Converts the set to an ordered JSON object.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> =
            self.entries.iter().map(|(name, value)| (name.clone(), value.to_json())).collect();
        serde_json::Value::Object(map)
    }
}

impl Serialize for CanonicalArgumentSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<N: Into<String>> FromIterator<(N, ArgumentValue)> for CanonicalArgumentSet {
    fn from_iter<I: IntoIterator<Item = (N, ArgumentValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(name, value)| (name.into(), value)).collect(),
        }
    }
}

// ============================================================================
// SECTION: Tokens
// ============================================================================

/// One token of the canonical argument stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgToken {
    /// Option name without dashes.
    Option(String),
    /// Bare value.
    Value(String),
}

impl ArgToken {
    /// Builds an option token.
    #[must_use]
    pub fn option(name: impl Into<String>) -> Self {
        Self::Option(name.into())
    }

    /// Builds a value token.
    #[must_use]
    pub fn value(value: impl Into<String>) -> Self {
        Self::Value(value.into())
    }
}

impl fmt::Display for ArgToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Option(name) => write!(f, "--{name}"),
            Self::Value(value) => f.write_str(value),
        }
    }
}
