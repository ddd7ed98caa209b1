//! Diagnostics produced by validation and pruning.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a diagnostic is about.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Issue {
    /// The schema provider no longer knows the model.
    ModelGone,
    /// The fixture carries a field the model does not recognize.
    FieldNotInModel { field: String },
    /// A required field is empty in every record.
    MissingRequiredField { field: String },
    /// All records of the model were dropped.
    DroppedModel,
    /// A field was removed from every record.
    DroppedField { field: String },
}

impl Issue {
    /// The field this issue refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Issue::FieldNotInModel { field }
            | Issue::MissingRequiredField { field }
            | Issue::DroppedField { field } => Some(field),
            Issue::ModelGone | Issue::DroppedModel => None,
        }
    }

    /// Whether this issue records data that was removed.
    pub fn is_removal(&self) -> bool {
        matches!(self, Issue::DroppedModel | Issue::DroppedField { .. })
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::ModelGone => write!(f, "model is gone"),
            Issue::FieldNotInModel { field } => write!(f, "field not in model: {field}"),
            Issue::MissingRequiredField { field } => {
                write!(f, "missing field is required: {field}")
            }
            Issue::DroppedModel => write!(f, "dropping unused model"),
            Issue::DroppedField { field } => write!(f, "dropping unused field: {field}"),
        }
    }
}

/// A single diagnostic for one model group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Model the diagnostic belongs to.
    pub model: String,
    /// The issue found.
    pub issue: Issue,
}

impl Diagnostic {
    pub fn new(model: impl Into<String>, issue: Issue) -> Self {
        Self {
            model: model.into(),
            issue,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.issue.fmt(f)
    }
}

/// Diagnostics of one model group, in the order they were produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupReport {
    pub model: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Diagnostics gathered across a fixture.
///
/// Only groups that produced diagnostics are listed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Number of model groups examined.
    pub models_checked: usize,
    /// Groups with at least one diagnostic.
    pub groups: Vec<GroupReport>,
}

impl Report {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome for one model group.
    pub fn record(&mut self, model: impl Into<String>, diagnostics: Vec<Diagnostic>) {
        self.models_checked += 1;
        if !diagnostics.is_empty() {
            self.groups.push(GroupReport {
                model: model.into(),
                diagnostics,
            });
        }
    }

    /// Whether no group produced a diagnostic.
    pub fn is_clean(&self) -> bool {
        self.groups.is_empty()
    }

    /// All diagnostics, group by group.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.groups.iter().flat_map(|g| g.diagnostics.iter())
    }

    /// Diagnostics for one model.
    pub fn for_model(&self, model: &str) -> &[Diagnostic] {
        self.groups
            .iter()
            .find(|g| g.model == model)
            .map(|g| g.diagnostics.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_messages() {
        assert_eq!(Issue::ModelGone.to_string(), "model is gone");
        assert_eq!(
            Issue::FieldNotInModel { field: "legacy_flag".into() }.to_string(),
            "field not in model: legacy_flag"
        );
        assert_eq!(
            Issue::MissingRequiredField { field: "question".into() }.to_string(),
            "missing field is required: question"
        );
        assert_eq!(Issue::DroppedModel.to_string(), "dropping unused model");
        assert_eq!(
            Issue::DroppedField { field: "old".into() }.to_string(),
            "dropping unused field: old"
        );
    }

    #[test]
    fn test_issue_field() {
        assert_eq!(Issue::DroppedField { field: "x".into() }.field(), Some("x"));
        assert_eq!(Issue::ModelGone.field(), None);
        assert!(Issue::DroppedModel.is_removal());
        assert!(!Issue::ModelGone.is_removal());
    }

    #[test]
    fn test_report_skips_clean_groups() {
        let mut report = Report::new();
        report.record("app.A", Vec::new());
        report.record("app.B", vec![Diagnostic::new("app.B", Issue::ModelGone)]);

        assert_eq!(report.models_checked, 2);
        assert!(!report.is_clean());
        assert_eq!(report.groups.len(), 1);
        assert!(report.for_model("app.A").is_empty());
        assert_eq!(report.for_model("app.B")[0].to_string(), "model is gone");
        assert_eq!(report.diagnostics().count(), 1);
    }

    #[test]
    fn test_diagnostic_serializes_tagged() {
        let diagnostic = Diagnostic::new("app.A", Issue::FieldNotInModel { field: "x".into() });
        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"model": "app.A", "issue": {"type": "field_not_in_model", "field": "x"}})
        );
    }
}
