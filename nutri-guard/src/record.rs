//! Raw product records as handed over by the acquisition step.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{NutriError, Result};

/// Field holding the record identifier.
pub const BARCODE_FIELD: &str = "barcode";
/// Barcode reported when a record carries none.
pub const UNKNOWN_BARCODE: &str = "unknown";
/// Field holding the nested nutrient mapping.
pub const NUTRIENTS_FIELD: &str = "nutrients_100g";

/// One product as a mapping of field name to raw text or nested mapping.
///
/// Records are never mutated in place by the engine; transformations build a
/// new record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(Map<String, Value>);

impl RawRecord {
    /// Creates an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a record from a JSON document, which must be an object.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        match serde_json::from_slice::<Value>(bytes)? {
            Value::Object(map) => Ok(Self(map)),
            other => Err(NutriError::Serialization(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Builds a record from an arbitrary JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(NutriError::Serialization(format!(
                "expected a JSON object, found {}",
                json_kind(&other)
            ))),
        }
    }

    /// Returns the barcode, or `"unknown"` when absent or not text.
    pub fn barcode(&self) -> &str {
        match self.0.get(BARCODE_FIELD) {
            Some(Value::String(s)) if !s.is_empty() => s,
            _ => UNKNOWN_BARCODE,
        }
    }

    /// Returns the raw value stored under `field`.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns true when the record carries `field`, even with a null value.
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Returns the textual form of `field`, see [`value_text`].
    pub fn text(&self, field: &str) -> Option<String> {
        self.0.get(field).and_then(value_text)
    }

    /// Returns the nested nutrient mapping, if present and well-formed.
    pub fn nutrients(&self) -> Option<&Map<String, Value>> {
        self.0.get(NUTRIENTS_FIELD).and_then(Value::as_object)
    }

    /// Sets a field, returning the builder for chaining.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Inserts or replaces a field.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    /// Iterates fields in the record's own order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrows the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the record into a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Renders a raw value as text.
///
/// Strings are returned verbatim, `null` and empty strings count as absent,
/// and any other JSON value is rendered as compact JSON so that it can still be
/// traced in reports.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Returns the folder a record identifier lives in: the name of its closest
/// parent directory (`"openfoodfacts/EAN13/123.json"` → `"EAN13"`).
pub fn folder_of(identifier: &str) -> Option<&str> {
    let mut parts = identifier.rsplit('/');
    parts.next()?;
    parts.next().filter(|folder| !folder.is_empty())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
