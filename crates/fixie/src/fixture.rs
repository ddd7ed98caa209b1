//! Fixtures: every model group loaded from one source.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info};

use crate::diagnostic::Report;
use crate::error::{FixieError, Result};
use crate::locator::SourceLocator;
use crate::model::Model;
use crate::persistence::{self, SourceMetadata};
use crate::provider::SchemaProvider;
use crate::record::{Record, group_by_model};
use crate::view::{ViewConfig, render_model};

/// Configuration for loading, saving and viewing fixtures.
#[derive(Debug, Clone)]
pub struct FixtureConfig {
    /// Write indented JSON on save.
    pub pretty: bool,
    /// Create missing parent directories on save.
    pub create_dirs: bool,
    /// Layout of rendered schemas.
    pub view: ViewConfig,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            create_dirs: true,
            view: ViewConfig::default(),
        }
    }
}

/// All records of one fixture source, grouped by model.
///
/// Groups are kept in the order their model first appears in the source.
/// A group that has lost all its records is skipped by every accessor and
/// removed for good by [`Fixture::prune`].
///
/// # Example
///
/// ```no_run
/// use fixie::{Fixture, StaticSchemaProvider};
///
/// let provider = StaticSchemaProvider::load("schema.json")?;
/// let mut fixture = Fixture::open("fixtures/initial_data.json")?;
///
/// fixture.drop_unused_all(&provider);
/// fixture.denormalize("polls.Choice", ("poll", "votes"), "polls.Poll", "top_votes")?;
///
/// if fixture.is_valid(&provider) {
///     fixture.save()?;
/// }
/// # Ok::<(), fixie::FixieError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Fixture {
    path: Option<PathBuf>,
    source: Option<SourceMetadata>,
    models: IndexMap<String, Model>,
    config: FixtureConfig,
}

impl Fixture {
    /// Load a fixture file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut fixture = Self::default();
        fixture.load(path)?;
        Ok(fixture)
    }

    /// Resolve a short fixture name through `locator` and load it.
    pub fn locate(name: &str, locator: &dyn SourceLocator) -> Result<Self> {
        let path = locator
            .locate(name)
            .ok_or_else(|| FixieError::FixtureNotFound(name.to_string()))?;
        Self::open(path)
    }

    /// Parse a fixture held in memory. The result has no save destination.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let records = persistence::parse_records(bytes, Path::new("<memory>"))?;
        Ok(Self::from_records(records))
    }

    /// Build a fixture from records. The result has no save destination.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut fixture = Self::default();
        fixture.replace(records);
        fixture
    }

    /// Use a custom configuration.
    pub fn with_config(mut self, config: FixtureConfig) -> Self {
        self.config = config;
        self
    }

    /// The active configuration.
    pub fn config(&self) -> &FixtureConfig {
        &self.config
    }

    /// Load `path`, replacing all in-memory state. Later saves go to `path`.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let (records, metadata) = persistence::read_records(path)?;

        self.replace(records);
        self.path = Some(path.to_path_buf());
        self.source = Some(metadata);
        Ok(())
    }

    fn replace(&mut self, records: impl IntoIterator<Item = Record>) {
        self.models = group_by_model(records)
            .into_iter()
            .map(|(name, records)| {
                let model = Model::new(name.clone(), records);
                (name, model)
            })
            .collect();
        self.source = None;
        debug!(models = self.models.len(), "grouped fixture records");
    }

    /// The file this fixture was loaded from and saves to by default.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Metadata captured when the source file was loaded.
    pub fn source(&self) -> Option<&SourceMetadata> {
        self.source.as_ref()
    }

    /// Names of the non-empty model groups.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.iter().map(Model::name)
    }

    /// Get a non-empty model group by name.
    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.get(name).filter(|m| !m.is_empty())
    }

    /// Get a non-empty model group by name for editing.
    pub fn model_mut(&mut self, name: &str) -> Option<&mut Model> {
        self.models.get_mut(name).filter(|m| !m.is_empty())
    }

    /// Iterate over the non-empty model groups.
    ///
    /// Iteration never changes the fixture; call [`Fixture::prune`] to
    /// discard emptied groups.
    pub fn iter(&self) -> impl Iterator<Item = &Model> {
        self.models.values().filter(|m| !m.is_empty())
    }

    /// Iterate mutably over the non-empty model groups.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Model> {
        self.models.values_mut().filter(|m| !m.is_empty())
    }

    /// Number of non-empty model groups.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether the fixture holds no records.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove emptied model groups, returning their names.
    pub fn prune(&mut self) -> Vec<String> {
        let mut pruned = Vec::new();
        self.models.retain(|name, model| {
            if model.is_empty() {
                pruned.push(name.clone());
                false
            } else {
                true
            }
        });

        if !pruned.is_empty() {
            debug!(?pruned, "pruned empty models");
        }
        pruned
    }

    /// Every record, group by group.
    pub fn all_records(&self) -> Vec<&Record> {
        self.iter().flat_map(|m| m.records().iter()).collect()
    }

    /// Validate every model group against the schema provider.
    pub fn validate_all(&self, provider: &dyn SchemaProvider) -> Report {
        let mut report = Report::new();
        for model in self.iter() {
            report.record(model.name(), model.validate(provider));
        }
        report
    }

    /// Whether every model group passes validation.
    pub fn is_valid(&self, provider: &dyn SchemaProvider) -> bool {
        self.validate_all(provider).is_clean()
    }

    /// Drop unrecognized fields and models from every group.
    ///
    /// Groups are processed in order with no rollback; dropped models are
    /// pruned afterwards.
    pub fn drop_unused_all(&mut self, provider: &dyn SchemaProvider) -> Report {
        let mut report = Report::new();
        for model in self.iter_mut() {
            let diagnostics = model.drop_unused(provider);
            report.record(model.name(), diagnostics);
        }
        self.prune();
        report
    }

    /// Remove a model group and all its records.
    pub fn drop_model(&mut self, name: &str) -> Result<Model> {
        // An emptied group is already logically gone
        let model = match self.models.shift_remove(name) {
            Some(model) if !model.is_empty() => model,
            _ => return Err(FixieError::ModelNotFound(name.to_string())),
        };
        info!(model = name, records = model.len(), "dropped model");
        Ok(model)
    }

    /// Copy a referenced value into the records that point at it.
    ///
    /// Builds a lookup from each `source` record's `keys.0` field to its
    /// `keys.1` field (later duplicates win), then sets `field` on every
    /// `target` record to the value looked up by that record's primary key,
    /// or null when there is no match. Source records without `keys.0` are
    /// skipped.
    ///
    /// Returns the number of target records that found a match.
    pub fn denormalize(
        &mut self,
        source: &str,
        keys: (&str, &str),
        target: &str,
        field: &str,
    ) -> Result<usize> {
        let (left, right) = keys;
        let source_model = self
            .model(source)
            .ok_or_else(|| FixieError::ModelNotFound(source.to_string()))?;

        let mut mapping: HashMap<String, Value> = HashMap::new();
        for record in source_model.records() {
            if let Some(key) = record.get(left) {
                let value = record.get(right).cloned().unwrap_or(Value::Null);
                mapping.insert(lookup_key(key), value);
            }
        }

        let target_model = self
            .model_mut(target)
            .ok_or_else(|| FixieError::ModelNotFound(target.to_string()))?;

        let mut matched = 0;
        target_model.set_with(field, |record| match mapping.get(&lookup_key(&record.pk)) {
            Some(value) => {
                matched += 1;
                value.clone()
            }
            None => Value::Null,
        });

        info!(
            source_model = source,
            target_model = target,
            field,
            matched,
            "denormalized {} into {} -> {}",
            source,
            target,
            field
        );
        Ok(matched)
    }

    /// Render every model group's schema for review.
    pub fn view(&self) -> String {
        self.iter()
            .map(|model| render_model(model, &self.config.view))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Save back to the file this fixture was loaded from.
    pub fn save(&self) -> Result<()> {
        let path = self.destination()?;
        self.save_to(path)
    }

    /// Save to `path`, replacing it atomically.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let records = self.all_records();
        persistence::write_records(path, &records, self.config.pretty, self.config.create_dirs)?;
        info!(path = %path.display(), records = records.len(), "saved fixture");
        Ok(())
    }

    /// Save to `path`, first copying its current contents into a
    /// `<stem>.history` directory next to it.
    ///
    /// File structure after calling:
    /// ```text
    /// fixtures/
    /// ├── initial_data.json                 # Current version
    /// └── initial_data.history/
    ///     └── 2024-12-30T10-00-00.000.json  # Previous version
    /// ```
    pub fn save_with_history(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(saved) = persistence::save_to_history(path)? {
            debug!(history = %saved.display(), "kept previous fixture");
        }
        self.save_to(path)
    }

    /// List the saved history of a fixture file, newest first.
    pub fn list_history(path: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        persistence::list_history(path.as_ref())
    }

    fn destination(&self) -> Result<&Path> {
        self.path().ok_or_else(|| {
            FixieError::Persistence("Fixture was not loaded from a file; use save_to".to_string())
        })
    }
}

/// Key used to match JSON values during denormalization.
///
/// Numbers compare by value, so `1` and `1.0` share a key. Everything else
/// compares by its JSON text.
fn lookup_key(value: &Value) -> String {
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 => {
                (f as i64).to_string()
            }
            _ => n.to_string(),
        },
        _ => value.to_string(),
    }
}
