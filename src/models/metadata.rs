//! Represents system and user metadata associated with objects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const CONTENT_TYPE: &str = "contentType";
pub const CONTENT_LENGTH: &str = "contentLength";
pub const USER_METADATA: &str = "userMetadata";

/// Open key/value metadata attached to an object.
///
/// Serialized as a plain JSON object. Well-known keys are `contentType`,
/// `contentLength` and `userMetadata` (a nested string map); anything else the
/// server sends is kept as-is. Keys are ordered so the encoded form is stable.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct ObjectMetadata(BTreeMap<String, Value>);

impl ObjectMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get(CONTENT_TYPE).and_then(Value::as_str)
    }

    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.insert(CONTENT_TYPE, content_type.into());
    }

    /// Declared content length. Accepts numbers and numeric strings.
    pub fn content_length(&self) -> Option<u64> {
        match self.get(CONTENT_LENGTH)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn set_content_length(&mut self, length: u64) {
        self.insert(CONTENT_LENGTH, length);
    }

    /// Look up a single user metadata entry.
    pub fn user_metadata(&self, key: &str) -> Option<&str> {
        self.get(USER_METADATA)?.get(key)?.as_str()
    }

    /// Add a user metadata entry, creating the nested map when needed.
    pub fn add_user_metadata(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let entry = self
            .0
            .entry(USER_METADATA.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(map) = entry {
            map.insert(key.into(), Value::String(value.into()));
        }
    }

    /// Encode as the JSON metadata segment sent on the wire.
    pub fn to_vec(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Decode a metadata segment. An empty slice yields empty metadata.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ObjectMetadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
