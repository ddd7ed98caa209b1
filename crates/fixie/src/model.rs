//! Record groups: every record of one model plus the schema inferred from them.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::diagnostic::{Diagnostic, Issue};
use crate::merge::merge_all;
use crate::provider::SchemaProvider;
use crate::record::Record;

/// All records sharing one type tag.
///
/// The inferred schema is the field-by-field merge of every record in load
/// order. Every mutating method re-derives it before returning, so it is
/// never stale.
#[derive(Debug, Clone, Serialize)]
pub struct Model {
    name: String,
    records: Vec<Record>,
    schema: Map<String, Value>,
}

impl Model {
    /// Create a group from records that all carry the type tag `name`.
    pub fn new(name: impl Into<String>, records: Vec<Record>) -> Self {
        let mut model = Self {
            name: name.into(),
            records,
            schema: Map::new(),
        };
        debug_assert!(model.records.iter().all(|r| r.model == model.name));
        model.derive_schema();
        model
    }

    /// The model's type tag.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Records in load order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Take the records out of the group.
    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    /// The inferred schema.
    pub fn schema(&self) -> &Map<String, Value> {
        &self.schema
    }

    /// Field names of the inferred schema.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.schema.keys().map(String::as_str)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// An empty group is logically absent from its fixture.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Recompute the inferred schema from the records.
    pub fn derive_schema(&mut self) {
        self.schema = merge_all(self.records.iter().map(|r| &r.fields));
        debug!(
            model = %self.name,
            records = self.records.len(),
            fields = self.schema.len(),
            "derived schema"
        );
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
        self.schema.clear();
    }

    /// Delete a field from every record.
    ///
    /// Returns how many records carried the field. Removing an absent field
    /// is a no-op.
    pub fn remove_field(&mut self, name: &str) -> usize {
        let removed = self.strip_field(name);
        self.derive_schema();
        removed
    }

    /// Fill a field on every record where it is absent or null.
    ///
    /// Returns the number of records filled.
    pub fn set_default(&mut self, name: &str, value: impl Into<Value>) -> usize {
        let value = value.into();
        self.set_default_with(name, |_| value.clone())
    }

    /// Fill a field on every record where it is absent or null, computing the
    /// value from the record.
    ///
    /// # Example
    ///
    /// ```
    /// use fixie::{Model, Record};
    /// use serde_json::json;
    ///
    /// let mut model = Model::new("polls.Poll", vec![
    ///     Record::new("polls.Poll", 1),
    ///     Record::new("polls.Poll", 2).with_field("slug", "second"),
    /// ]);
    ///
    /// model.set_default_with("slug", |record| json!(format!("poll-{}", record.pk)));
    /// assert_eq!(model.records()[0].get("slug"), Some(&json!("poll-1")));
    /// assert_eq!(model.records()[1].get("slug"), Some(&json!("second")));
    /// ```
    pub fn set_default_with<F>(&mut self, name: &str, mut generate: F) -> usize
    where
        F: FnMut(&Record) -> Value,
    {
        let mut filled = 0;
        for record in &mut self.records {
            if record.is_blank(name) {
                let value = generate(record);
                record.fields.insert(name.to_string(), value);
                filled += 1;
            }
        }
        self.derive_schema();
        filled
    }

    /// Overwrite a field on every record.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        self.set_with(name, |_| value.clone());
    }

    /// Overwrite a field on every record, computing the value from the record.
    pub fn set_with<F>(&mut self, name: &str, mut generate: F)
    where
        F: FnMut(&Record) -> Value,
    {
        for record in &mut self.records {
            let value = generate(record);
            record.fields.insert(name.to_string(), value);
        }
        self.derive_schema();
    }

    /// Check the inferred schema against the schema provider.
    ///
    /// Never mutates the group. An empty result means the group is valid.
    pub fn validate(&self, provider: &dyn SchemaProvider) -> Vec<Diagnostic> {
        let Some(model_schema) = provider.describe(&self.name) else {
            return vec![self.diagnostic(Issue::ModelGone)];
        };

        let mut diagnostics: Vec<Diagnostic> = self
            .field_names()
            .filter(|field| !model_schema.recognizes(field))
            .map(|field| self.diagnostic(Issue::FieldNotInModel { field: field.to_string() }))
            .collect();

        for field in model_schema.required_fields() {
            if self.schema.get(field).is_none_or(Value::is_null) {
                diagnostics.push(self.diagnostic(Issue::MissingRequiredField {
                    field: field.to_string(),
                }));
            }
        }

        diagnostics
    }

    /// Remove what the schema provider no longer recognizes.
    ///
    /// If the model itself is gone every record is dropped. Otherwise each
    /// unrecognized field is removed from every record.
    pub fn drop_unused(&mut self, provider: &dyn SchemaProvider) -> Vec<Diagnostic> {
        let Some(model_schema) = provider.describe(&self.name) else {
            warn!(model = %self.name, records = self.records.len(), "dropping unused model");
            self.clear();
            return vec![self.diagnostic(Issue::DroppedModel)];
        };

        let unused: Vec<String> = self
            .field_names()
            .filter(|field| !model_schema.recognizes(field))
            .map(str::to_string)
            .collect();

        if unused.is_empty() {
            return Vec::new();
        }

        let mut diagnostics = Vec::with_capacity(unused.len());
        for field in unused {
            debug!(model = %self.name, field = %field, "dropping unused field");
            self.strip_field(&field);
            diagnostics.push(self.diagnostic(Issue::DroppedField { field }));
        }
        self.derive_schema();

        diagnostics
    }

    /// Remove a field without re-deriving the schema.
    fn strip_field(&mut self, name: &str) -> usize {
        self.records
            .iter_mut()
            .filter_map(|record| record.fields.shift_remove(name))
            .count()
    }

    fn diagnostic(&self, issue: Issue) -> Diagnostic {
        Diagnostic::new(self.name.clone(), issue)
    }
}
