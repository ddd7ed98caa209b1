//! Fixture records.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One serialized object in a fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Type tag, e.g. `polls.Poll`.
    pub model: String,
    /// Primary key. Not required to be present or unique. Null keys are
    /// left out when written.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub pk: Value,
    /// Field values keyed by field name.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Record {
    /// Create a record with no fields.
    pub fn new(model: impl Into<String>, pk: impl Into<Value>) -> Self {
        Self {
            model: model.into(),
            pk: pk.into(),
            fields: Map::new(),
        }
    }

    /// Add a field value.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Get a field value, treating absence as `None`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Whether the field is absent or null.
    pub fn is_blank(&self, name: &str) -> bool {
        self.fields.get(name).is_none_or(Value::is_null)
    }
}

/// Group records by their type tag.
///
/// Groups are ordered by the first appearance of each type, and records
/// keep their relative order within a group.
pub fn group_by_model(records: impl IntoIterator<Item = Record>) -> IndexMap<String, Vec<Record>> {
    let mut groups: IndexMap<String, Vec<Record>> = IndexMap::new();
    for record in records {
        groups.entry(record.model.clone()).or_default().push(record);
    }
    groups
}
