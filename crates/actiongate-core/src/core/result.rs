// crates/actiongate-core/src/core/result.rs
// ============================================================================
// Module: ActionGate Action Results
// Description: Result values returned by actions and their JSON encoding.
// Purpose: Encode sets, date-times, and opaque values deterministically.
// Dependencies: indexmap, serde_json, time, tracing
// ============================================================================

//! ## Overview
//! Actions return a [`ResultValue`]. Plain JSON shapes encode as-is; the
//! extended shapes follow fixed rules:
//! - sets encode as sorted, de-duplicated lists;
//! - date-times encode as ISO-8601 with an explicit offset, and values
//!   without an offset are taken as UTC (`+00:00`);
//! - opaque values encode as their textual form and log a warning.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;

use indexmap::IndexMap;
use time::Date;
use time::OffsetDateTime;
use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// ISO-8601 with seconds precision and a mandatory `+HH:MM` offset.
const ISO_SECONDS: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory]:[offset_minute]"
);

/// ISO-8601 with microseconds precision and a mandatory `+HH:MM` offset.
const ISO_MICROS: &[BorrowedFormatItem<'static>] = format_description!(
    "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6][offset_hour sign:mandatory]:[offset_minute]"
);

// ============================================================================
// SECTION: Types
// ============================================================================

/// Value returned by an action.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultValue {
    /// No content.
    Null,
    /// Boolean.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// String.
    Text(String),
    /// Ordered list.
    List(Vec<ResultValue>),
    /// Unordered collection; encoded sorted and de-duplicated.
    Set(Vec<ResultValue>),
    /// Ordered map.
    Map(IndexMap<String, ResultValue>),
    /// Date-time carrying its offset.
    DateTime(OffsetDateTime),
    /// Date-time without offset, taken as UTC.
    NaiveDateTime(PrimitiveDateTime),
    /// Calendar date, taken as midnight UTC.
    Date(Date),
    /// Value with no JSON form; carries its textual representation.
    Opaque(String),
}

impl ResultValue {
    /// Returns true when the value has no content (null, empty string, or empty container).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Text(text) => text.is_empty(),
            Self::List(items) | Self::Set(items) => items.is_empty(),
            Self::Map(entries) => entries.is_empty(),
            _ => false,
        }
    }

    /// Encodes the value to JSON using the extended rules.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(flag) => serde_json::Value::Bool(*flag),
            Self::Int(number) => serde_json::Value::from(*number),
            Self::Float(number) => serde_json::Number::from_f64(*number)
                .map_or_else(|| opaque(&number.to_string()), serde_json::Value::Number),
            Self::Text(text) => serde_json::Value::String(text.clone()),
            Self::List(items) => serde_json::Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Set(items) => {
                let mut encoded: Vec<serde_json::Value> = items.iter().map(Self::to_json).collect();
                encoded.sort_by(compare_json);
                encoded.dedup();
                serde_json::Value::Array(encoded)
            }
            Self::Map(entries) => serde_json::Value::Object(
                entries.iter().map(|(key, value)| (key.clone(), value.to_json())).collect(),
            ),
            Self::DateTime(value) => encode_datetime(*value),
            Self::NaiveDateTime(value) => encode_datetime(value.assume_utc()),
            Self::Date(value) => encode_datetime(value.midnight().assume_utc()),
            Self::Opaque(text) => opaque(text),
        }
    }
}

impl From<serde_json::Value> for ResultValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(flag) => Self::Bool(flag),
            serde_json::Value::Number(number) => number
                .as_i64()
                .map(Self::Int)
                .or_else(|| number.as_f64().map(Self::Float))
                .unwrap_or_else(|| Self::Text(number.to_string())),
            serde_json::Value::String(text) => Self::Text(text),
            serde_json::Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            serde_json::Value::Object(entries) => {
                Self::Map(entries.into_iter().map(|(key, value)| (key, Self::from(value))).collect())
            }
        }
    }
}

impl From<&str> for ResultValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ResultValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for ResultValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ResultValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<OffsetDateTime> for ResultValue {
    fn from(value: OffsetDateTime) -> Self {
        Self::DateTime(value)
    }
}

// ============================================================================
// SECTION: Encoding Helpers
// ============================================================================

/// Formats a date-time with an explicit offset, falling back to opaque text.
fn encode_datetime(value: OffsetDateTime) -> serde_json::Value {
    let format = if value.microsecond() == 0 { ISO_SECONDS } else { ISO_MICROS };
    match value.format(format) {
        Ok(text) => serde_json::Value::String(text),
        Err(_) => opaque(&value.to_string()),
    }
}

/// Encodes an unencodable value as text and logs a warning.
fn opaque(text: &str) -> serde_json::Value {
    tracing::warn!(value = %text, "{}", crate::t!("encode.unencodable", value = text));
    serde_json::Value::String(text.to_string())
}

/// Total order over encoded set members: null, bool, number, string, array, object.
fn compare_json(left: &serde_json::Value, right: &serde_json::Value) -> Ordering {
    use serde_json::Value;

    const fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or(f64::NAN);
            let b = b.as_f64().unwrap_or(f64::NAN);
            a.total_cmp(&b)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ if rank(left) == rank(right) => left.to_string().cmp(&right.to_string()),
        _ => rank(left).cmp(&rank(right)),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
