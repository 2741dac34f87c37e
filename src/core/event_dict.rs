//! Event dictionaries for structured logging
//!
//! This module provides:
//! - `FieldValue`: a value stored under a field name
//! - `EventDict`: the field-name to value mapping every processor step transforms

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Value type for structured logging fields
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Raw bytes; turned into a string by the unicode decoding step
    Bytes(Vec<u8>),
    List(Vec<FieldValue>),
    Map(BTreeMap<String, FieldValue>),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Bytes(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
            FieldValue::List(items) => {
                write!(f, "[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            FieldValue::Map(map) => {
                write!(f, "{{")?;
                for (idx, (key, value)) in map.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
            FieldValue::Null => write!(f, "null"),
        }
    }
}

impl FieldValue {
    /// Wrap raw bytes
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        FieldValue::Bytes(bytes.into())
    }

    /// Convert to serde_json::Value for JSON serialization
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::Int(i) => serde_json::Value::Number((*i).into()),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Bytes(bytes) => {
                serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned())
            }
            FieldValue::List(items) => {
                serde_json::Value::Array(items.iter().map(FieldValue::to_json_value).collect())
            }
            FieldValue::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json_value()))
                    .collect(),
            ),
            FieldValue::Null => serde_json::Value::Null,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => n.as_f64().map(FieldValue::Float).unwrap_or(FieldValue::Null),
            },
            serde_json::Value::String(s) => FieldValue::String(s),
            serde_json::Value::Array(items) => {
                FieldValue::List(items.into_iter().map(FieldValue::from).collect())
            }
            serde_json::Value::Object(map) => FieldValue::Map(
                map.into_iter()
                    .map(|(k, v)| (k, FieldValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<&String> for FieldValue {
    fn from(s: &String) -> Self {
        FieldValue::String(s.clone())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<u32> for FieldValue {
    fn from(i: u32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<u64> for FieldValue {
    fn from(i: u64) -> Self {
        i64::try_from(i)
            .map(FieldValue::Int)
            .unwrap_or(FieldValue::Float(i as f64))
    }
}

impl From<usize> for FieldValue {
    fn from(i: usize) -> Self {
        FieldValue::from(i as u64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(items: Vec<FieldValue>) -> Self {
        FieldValue::List(items)
    }
}

/// Field-name to value mapping carried through the processor chain
///
/// Keys are kept sorted so rendered output is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EventDict {
    fields: BTreeMap<String, FieldValue>,
}

impl EventDict {
    /// Create a new empty event dictionary
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Add a field (builder version)
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add or replace a field
    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        self.fields.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Get all fields
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.fields.iter()
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut FieldValue> {
        self.fields.values_mut()
    }

    pub fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&String, &mut FieldValue) -> bool,
    {
        self.fields.retain(keep);
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Copy fields from `other` that are not already present.
    ///
    /// Fields already in `self` take priority.
    pub fn merge_missing(&mut self, other: &EventDict) {
        for (key, value) in other.fields.iter() {
            if !self.fields.contains_key(key) {
                self.fields.insert(key.clone(), value.clone());
            }
        }
    }

    /// Format fields as key=value pairs
    pub fn format_fields(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Convert into a JSON object
    pub fn to_json_map(&self) -> serde_json::Map<String, serde_json::Value> {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json_value()))
            .collect()
    }
}

impl fmt::Display for EventDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_fields())
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for EventDict {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_dict_creation() {
        let event = EventDict::new();
        assert!(event.is_empty());
    }

    #[test]
    fn test_event_dict_with_fields() {
        let event = EventDict::new()
            .with_field("user_id", 123)
            .with_field("username", "john_doe")
            .with_field("active", true);

        assert_eq!(event.len(), 3);
        assert_eq!(event.get("user_id"), Some(&FieldValue::Int(123)));
    }

    #[test]
    fn test_format_fields_sorted() {
        let event = EventDict::new()
            .with_field("key2", 42)
            .with_field("key1", "value1");

        assert_eq!(event.format_fields(), "key1=value1 key2=42");
    }

    #[test]
    fn test_merge_missing_priority() {
        let mut event = EventDict::new().with_field("key", "entry_value");
        let bound = EventDict::new()
            .with_field("key", "bound_value")
            .with_field("service", "api");

        event.merge_missing(&bound);

        assert_eq!(event.len(), 2);
        assert_eq!(event.get("key").and_then(FieldValue::as_str), Some("entry_value"));
        assert_eq!(event.get("service").and_then(FieldValue::as_str), Some("api"));
    }

    #[test]
    fn test_from_json_value() {
        let value: FieldValue = serde_json::json!([1, 2, {"a": "b"}]).into();
        assert_eq!(
            value,
            FieldValue::List(vec![
                FieldValue::Int(1),
                FieldValue::Int(2),
                FieldValue::Map(
                    [("a".to_string(), FieldValue::from("b"))].into_iter().collect()
                ),
            ])
        );
        assert_eq!(value.to_string(), "[1, 2, {a: b}]");
    }

    #[test]
    fn test_bytes_render_as_text() {
        let value = FieldValue::bytes(b"caf\xc3\xa9".to_vec());
        assert_eq!(value.to_json_value(), serde_json::json!("café"));
    }

    #[test]
    fn test_large_unsigned_becomes_float() {
        assert_eq!(FieldValue::from(7u64), FieldValue::Int(7));
        assert!(matches!(FieldValue::from(u64::MAX), FieldValue::Float(_)));
    }
}
