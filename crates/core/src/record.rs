//! Remote catalog record types.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Opaque identifier of a remote record (`_id` on the wire).
///
/// Numeric ids are accepted and kept in their decimal string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, schemars::JsonSchema)]
#[serde(transparent)]
pub struct RecordId(String);

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum WireId {
            Text(String),
            Unsigned(u64),
            Signed(i64),
        }

        Ok(match WireId::deserialize(deserializer)? {
            WireId::Text(id) => Self(id),
            WireId::Unsigned(id) => Self(id.to_string()),
            WireId::Signed(id) => Self(id.to_string()),
        })
    }
}

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A single catalog record: its identifier plus every other field as returned by the remote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Record {
    #[serde(rename = "_id", alias = "id")]
    pub id: RecordId,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: RecordId::new(id), fields: Map::new() }
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    /// `images.picture_url`, if the record carries one.
    pub fn picture_url(&self) -> Option<&str> {
        self.fields
            .get("images")
            .and_then(|images| images.get("picture_url"))
            .and_then(Value::as_str)
    }
}
