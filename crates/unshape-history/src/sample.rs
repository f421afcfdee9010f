//! Keyed data container with embedded transform history.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::array::Array;
use crate::error::{HistoryError, TransformError};
use crate::store::HistoryStore;

/// Suffix of the reserved key that holds a key's history.
pub const KEY_SUFFIX: &str = "_transforms";

/// Returns the reserved key under which the history of `key` is stored.
pub fn history_key(key: &str) -> String {
    format!("{key}{KEY_SUFFIX}")
}

/// A value stored in a [`Sample`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Value {
    /// Numeric payload
    Array(Array),
    /// Text, e.g. a path a loader will read
    Text(String),
    /// Transform history of another key
    History(HistoryStore),
}

impl Value {
    /// Returns a short name for the kind of value.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Array(_) => "array",
            Value::Text(_) => "text",
            Value::History(_) => "history",
        }
    }
}

impl From<Array> for Value {
    fn from(v: Array) -> Self {
        Value::Array(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

/// One data sample: named streams plus the history of each.
///
/// The history of key `K` lives under [`history_key`]`(K)` in the same map, so
/// serializing a sample carries its history with it.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Sample {
    entries: BTreeMap<String, Value>,
}

impl Sample {
    /// Creates an empty sample.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns the value under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Removes and returns the value under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    /// Returns true if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterates all keys, including reserved history keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the array under `key`.
    pub fn array(&self, key: &str) -> Result<&Array, TransformError> {
        match self.entries.get(key) {
            Some(Value::Array(a)) => Ok(a),
            Some(other) => Err(TransformError::TypeMismatch {
                key: key.to_string(),
                expected: "array",
                got: other.kind(),
            }),
            None => Err(TransformError::MissingKey {
                key: key.to_string(),
            }),
        }
    }

    /// Returns the text under `key`.
    pub fn text(&self, key: &str) -> Result<&str, TransformError> {
        match self.entries.get(key) {
            Some(Value::Text(t)) => Ok(t),
            Some(other) => Err(TransformError::TypeMismatch {
                key: key.to_string(),
                expected: "text",
                got: other.kind(),
            }),
            None => Err(TransformError::MissingKey {
                key: key.to_string(),
            }),
        }
    }

    /// Replaces the array under `key`.
    pub fn set_array(&mut self, key: &str, array: Array) {
        self.entries.insert(key.to_string(), Value::Array(array));
    }

    /// Returns the history of `key`, if anything was ever recorded for it.
    pub fn history(&self, key: &str) -> Option<&HistoryStore> {
        match self.entries.get(&history_key(key)) {
            Some(Value::History(h)) => Some(h),
            _ => None,
        }
    }

    /// Returns the number of records in the history of `key`.
    pub fn history_len(&self, key: &str) -> usize {
        self.history(key).map_or(0, HistoryStore::len)
    }

    /// Returns the history of `key`, creating it when absent.
    pub fn history_mut(&mut self, key: &str) -> Result<&mut HistoryStore, HistoryError> {
        let reserved = history_key(key);
        let value = self
            .entries
            .entry(reserved.clone())
            .or_insert_with(|| Value::History(HistoryStore::new()));
        match value {
            Value::History(h) => Ok(h),
            _ => Err(HistoryError::ReservedKey(reserved)),
        }
    }

    /// Returns the history of `key` without creating it.
    pub(crate) fn existing_history_mut(&mut self, key: &str) -> Option<&mut HistoryStore> {
        match self.entries.get_mut(&history_key(key)) {
            Some(Value::History(h)) => Some(h),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{TransformId, TransformRecord};

    #[test]
    fn test_history_key_suffix() {
        assert_eq!(history_key("image"), "image_transforms");
    }

    #[test]
    fn test_history_created_on_demand() {
        let mut sample = Sample::new().with("image", Array::zeros(vec![2, 2]));
        assert!(sample.history("image").is_none());
        assert_eq!(sample.history_len("image"), 0);

        sample
            .history_mut("image")
            .unwrap()
            .push(TransformRecord::new("Flip", TransformId::next(), "image"));

        assert!(sample.contains_key("image_transforms"));
        assert_eq!(sample.history_len("image"), 1);
        assert_eq!(sample.history_len("label"), 0);
    }

    #[test]
    fn test_reserved_key_conflict() {
        let mut sample = Sample::new().with("image_transforms", "not a history");
        assert_eq!(
            sample.history_mut("image").unwrap_err(),
            HistoryError::ReservedKey("image_transforms".into())
        );
    }

    #[test]
    fn test_typed_access() {
        let sample = Sample::new()
            .with("image", Array::zeros(vec![1]))
            .with("path", "a.png");

        assert!(sample.array("image").is_ok());
        assert_eq!(sample.text("path").unwrap(), "a.png");
        assert!(matches!(
            sample.array("path"),
            Err(TransformError::TypeMismatch { expected: "array", got: "text", .. })
        ));
        assert!(matches!(
            sample.array("missing"),
            Err(TransformError::MissingKey { .. })
        ));
    }
}
