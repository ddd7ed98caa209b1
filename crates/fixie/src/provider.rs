//! Schema provider trait and an in-memory implementation.
//!
//! A schema provider is the authority on which fields a model recognizes
//! and which of them must be filled. Fixtures are checked against it but
//! never depend on how it is backed.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{FixieError, Result};

/// Requirement metadata for one field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    /// The field may be left empty.
    #[serde(default)]
    pub optional: bool,
    /// The field is the model's primary identifier.
    #[serde(default)]
    pub primary_key: bool,
}

impl FieldSpec {
    /// A field that must be filled.
    pub fn required() -> Self {
        Self::default()
    }

    /// A field that may be empty.
    pub fn optional() -> Self {
        Self {
            optional: true,
            primary_key: false,
        }
    }

    /// The primary identifier field.
    pub fn primary_key() -> Self {
        Self {
            optional: false,
            primary_key: true,
        }
    }

    /// Whether a fixture must carry a value for this field.
    pub fn is_required(&self) -> bool {
        !self.optional && !self.primary_key
    }
}

/// The fields a model recognizes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelSchema {
    /// Concrete fields with their requirement metadata.
    #[serde(default)]
    pub fields: IndexMap<String, FieldSpec>,
    /// Additional recognized names that carry no requirement, such as
    /// reverse relations.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related_names: Vec<String>,
}

impl ModelSchema {
    /// Create an empty model schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field.
    pub fn with_field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), spec);
        self
    }

    /// Add a recognized name without requirement metadata.
    pub fn with_related_name(mut self, name: impl Into<String>) -> Self {
        self.related_names.push(name.into());
        self
    }

    /// Whether `name` is a field or related name of this model.
    pub fn recognizes(&self, name: &str) -> bool {
        self.fields.contains_key(name) || self.related_names.iter().any(|n| n == name)
    }

    /// Fields that must be filled, in declaration order.
    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, spec)| spec.is_required())
            .map(|(name, _)| name.as_str())
    }
}

/// Source of per-model field requirements.
pub trait SchemaProvider {
    /// Describe a model, or return `None` if the model no longer exists.
    fn describe(&self, model: &str) -> Option<ModelSchema>;
}

/// Schema provider backed by a fixed set of model descriptions.
///
/// Its JSON form maps model names to field specs. Field specs sit under a
/// `fields` key, and unknown keys are rejected at any level:
///
/// ```
/// use fixie::StaticSchemaProvider;
///
/// let provider = StaticSchemaProvider::from_json_str(r#"{
///     "polls.Poll": {
///         "fields": {
///             "id": {"primary_key": true},
///             "question": {},
///             "note": {"optional": true}
///         }
///     }
/// }"#).unwrap();
///
/// assert!(provider.contains("polls.Poll"));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticSchemaProvider {
    models: IndexMap<String, ModelSchema>,
}

impl StaticSchemaProvider {
    /// Create a provider that knows no models.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a model description.
    pub fn with_model(mut self, name: impl Into<String>, schema: ModelSchema) -> Self {
        self.insert(name, schema);
        self
    }

    /// Add or replace a model description.
    pub fn insert(&mut self, name: impl Into<String>, schema: ModelSchema) {
        self.models.insert(name.into(), schema);
    }

    /// Forget a model, so it is reported as gone.
    pub fn remove(&mut self, name: &str) -> Option<ModelSchema> {
        self.models.shift_remove(name)
    }

    /// Whether the provider knows `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Parse a provider from its JSON form.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a provider from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| FixieError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let provider = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            FixieError::MalformedSource {
                path: path.to_path_buf(),
                message: e.to_string(),
            }
        })?;

        Ok(provider)
    }
}

impl SchemaProvider for StaticSchemaProvider {
    fn describe(&self, model: &str) -> Option<ModelSchema> {
        self.models.get(model).cloned()
    }
}
