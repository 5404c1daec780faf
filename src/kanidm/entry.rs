//! Attribute view over Kanidm entries
//!
//! Kanidm encodes every attribute as a list of strings, but older endpoints
//! and hand-written fixtures sometimes return bare scalars. [`Entry`] hides the
//! difference: readers ask for the shape they want and get it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A single attribute value as returned by the server
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Scalar(String),
    /// JSON array, elements kept as sent
    Sequence(Vec<Value>),
    /// Anything else (numbers, booleans, objects, null)
    Other(Value),
}

impl From<Value> for AttrValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => AttrValue::Scalar(s),
            Value::Array(items) => AttrValue::Sequence(items),
            other => AttrValue::Other(other),
        }
    }
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(default)]
    attrs: Option<Map<String, Value>>,
}

/// Decoded `{"attrs": {...}}` object from a GET response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawEntry")]
pub struct Entry {
    attrs: BTreeMap<String, AttrValue>,
}

impl From<RawEntry> for Entry {
    fn from(raw: RawEntry) -> Self {
        Self {
            attrs: raw
                .attrs
                .unwrap_or_default()
                .into_iter()
                .map(|(k, v)| (k, AttrValue::from(v)))
                .collect(),
        }
    }
}

impl Entry {
    /// Raw attribute value, if present
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    /// Whether the server sent `key` at all, regardless of its value
    pub fn has(&self, key: &str) -> bool {
        self.attrs.contains_key(key)
    }

    /// Single string value of `key`.
    ///
    /// Returns the scalar as-is, or the first element of a sequence when that
    /// element is a string. Absent keys, empty sequences and non-string values
    /// all read as `""`.
    pub fn get_string(&self, key: &str) -> String {
        match self.attrs.get(key) {
            Some(AttrValue::Scalar(s)) => s.clone(),
            Some(AttrValue::Sequence(items)) => items
                .first()
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_default(),
            _ => String::new(),
        }
    }

    /// All string values of `key`.
    ///
    /// A bare scalar becomes a one-element sequence and non-string array
    /// elements are skipped. Absent keys and non-string values read as an
    /// empty sequence, never as "no value", so
    /// callers comparing against an empty configuration do not see drift.
    pub fn get_string_sequence(&self, key: &str) -> Vec<String> {
        match self.attrs.get(key) {
            Some(AttrValue::Scalar(s)) => vec![s.clone()],
            Some(AttrValue::Sequence(items)) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// `{"attrs": {...}}` body for create and update calls.
///
/// Every value is sent as a sequence, which is what the Kanidm API expects
/// even for single-valued attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttrsRequest {
    attrs: BTreeMap<String, Vec<String>>,
}

impl AttrsRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to a one-element sequence
    pub fn single(mut self, key: &str, value: &str) -> Self {
        self.attrs.insert(key.to_string(), vec![value.to_string()]);
        self
    }

    /// Set `key` only when `value` is non-empty
    pub fn single_if_set(self, key: &str, value: &str) -> Self {
        if value.is_empty() {
            self
        } else {
            self.single(key, value)
        }
    }

    /// Set `key` to the full sequence `values`
    pub fn multi(mut self, key: &str, values: &[String]) -> Self {
        self.attrs.insert(key.to_string(), values.to_vec());
        self
    }

    /// Set `key` only when `values` is `Some`; an empty sequence is still sent
    pub fn multi_if_set(self, key: &str, values: Option<&[String]>) -> Self {
        match values {
            Some(values) => self.multi(key, values),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}
