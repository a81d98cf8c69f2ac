//! Telemetry records with dynamically-keyed fields
//!
//! Producers are free to invent field names at runtime (a flight computer
//! might send `alt` and `vel`, a battery monitor `voltage` and `current`), so
//! the field bag has no static schema. Values are restricted to scalars,
//! strings, and booleans; anything richer belongs in its own stream.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A single value in a record's field bag
///
/// Serialized untagged, so on the wire these are plain JSON scalars
/// (`{"alt": 120.5, "armed": true, "mode": "ascent"}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Numeric value (all numbers are carried as f64)
    Number(f64),
    /// Text value
    Text(String),
    /// Boolean value
    Flag(bool),
}

impl FieldValue {
    /// Get the numeric value, if this is a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the text value, if this is text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the boolean value, if this is a flag
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Number(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Number(v as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Flag(v)
    }
}

/// A single telemetry data point
///
/// `timestamp` is milliseconds since the Unix epoch. The record is immutable
/// once it enters a store; mutation helpers exist only for construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub timestamp: i64,
    pub fields: HashMap<String, FieldValue>,
}

impl TelemetryRecord {
    /// Create an empty record stamped with the current time
    pub fn new() -> Self {
        Self::with_timestamp(chrono::Utc::now().timestamp_millis())
    }

    /// Create an empty record with an explicit timestamp (ms since epoch)
    pub fn with_timestamp(timestamp: i64) -> Self {
        Self {
            timestamp,
            fields: HashMap::new(),
        }
    }

    /// Set a field, replacing any previous value under the same key
    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Builder-style variant of [`set_field`](Self::set_field)
    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set_field(key, value);
        self
    }

    /// Get a field value by key
    pub fn get_field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Get a field as f64, or 0.0 if missing or not a number
    ///
    /// Chart consumers prefer a flat default over handling per-point errors.
    pub fn field_f64(&self, key: &str) -> f64 {
        self.fields.get(key).and_then(FieldValue::as_f64).unwrap_or(0.0)
    }

    /// Get a field as text, or an empty string if missing or not text
    pub fn field_str(&self, key: &str) -> String {
        self.fields
            .get(key)
            .and_then(FieldValue::as_str)
            .unwrap_or_default()
            .to_string()
    }

    /// Get a field as bool, or false if missing or not a flag
    pub fn field_bool(&self, key: &str) -> bool {
        self.fields.get(key).and_then(FieldValue::as_bool).unwrap_or(false)
    }
}

impl Default for TelemetryRecord {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_accessors() {
        let record = TelemetryRecord::with_timestamp(1000)
            .field("alt", 120.5)
            .field("mode", "ascent")
            .field("armed", true);

        assert_eq!(record.field_f64("alt"), 120.5);
        assert_eq!(record.field_str("mode"), "ascent");
        assert!(record.field_bool("armed"));
    }

    #[test]
    fn test_accessors_default_on_mismatch() {
        let record = TelemetryRecord::with_timestamp(0).field("mode", "ascent");

        // Wrong type and missing key both produce the default, never an error
        assert_eq!(record.field_f64("mode"), 0.0);
        assert_eq!(record.field_f64("missing"), 0.0);
        assert_eq!(record.field_str("missing"), "");
        assert!(!record.field_bool("mode"));
    }

    #[test]
    fn test_set_field_replaces() {
        let mut record = TelemetryRecord::with_timestamp(0);
        record.set_field("alt", 10.0);
        record.set_field("alt", 20.0);

        assert_eq!(record.field_f64("alt"), 20.0);
        assert_eq!(record.fields.len(), 1);
    }

    #[test]
    fn test_untagged_wire_shape() {
        // Field values serialize as bare JSON scalars
        let record = TelemetryRecord::with_timestamp(42)
            .field("alt", 10.0)
            .field("armed", true);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["timestamp"], 42);
        assert_eq!(json["fields"]["alt"], 10.0);
        assert_eq!(json["fields"]["armed"], true);

        let back: TelemetryRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_integer_fields_decode_as_numbers() {
        let record: TelemetryRecord =
            serde_json::from_value(serde_json::json!({"timestamp": 0, "fields": {"sats": 7}}))
                .unwrap();

        assert_eq!(record.field_f64("sats"), 7.0);
    }
}
