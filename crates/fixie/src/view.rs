//! Plain-text rendering of inferred schemas and diagnostic reports.

use std::fmt::Write;

use serde_json::{Map, Value};

use crate::diagnostic::Report;
use crate::model::Model;

const BANNER: &str = "--------------------------------------";

/// Layout settings for rendered schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewConfig {
    /// Width field names are right-aligned to.
    pub key_width: usize,
    /// Strings longer than this many characters are shortened.
    pub max_value_len: usize,
    /// Characters kept when a string is shortened.
    pub truncate_to: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            key_width: 16,
            max_value_len: 80,
            truncate_to: 76,
        }
    }
}

/// Render an inferred schema, one `name: value` line per field, sorted by name.
///
/// # Example
///
/// ```
/// use fixie::view::{ViewConfig, render_schema};
/// use serde_json::json;
///
/// let schema = json!({"question": "Why?", "votes": 3});
/// let text = render_schema(schema.as_object().unwrap(), &ViewConfig::default());
/// assert_eq!(text, "        question: \"Why?\"\n           votes: 3\n");
/// ```
pub fn render_schema(schema: &Map<String, Value>, config: &ViewConfig) -> String {
    let mut keys: Vec<&String> = schema.keys().collect();
    keys.sort();

    let mut output = String::new();
    for key in keys {
        let value = shorten(&schema[key.as_str()], config);
        let _ = writeln!(output, "{:>width$}: {}", key, value, width = config.key_width);
    }
    output
}

/// Render a model's banner followed by its schema.
pub fn render_model(model: &Model, config: &ViewConfig) -> String {
    format!(
        "{BANNER}\nModel: {} \n{BANNER}\n{}",
        model.name(),
        render_schema(model.schema(), config)
    )
}

/// Render a report: each group's name, its diagnostics indented, then a blank line.
pub fn render_report(report: &Report) -> String {
    let mut output = String::new();
    for group in &report.groups {
        let _ = writeln!(output, "{}:", group.model);
        for diagnostic in &group.diagnostics {
            let _ = writeln!(output, " {}", diagnostic);
        }
        output.push('\n');
    }
    output
}

fn shorten(value: &Value, config: &ViewConfig) -> Value {
    match value {
        Value::String(s) if s.chars().count() > config.max_value_len => {
            let kept: String = s.chars().take(config.truncate_to).collect();
            Value::String(format!("{} ...", kept.trim_end_matches(' ')))
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{Diagnostic, Issue};
    use crate::record::Record;
    use serde_json::json;

    #[test]
    fn test_schema_sorted_and_aligned() {
        let schema = json!({"b": null, "a": true});
        let text = render_schema(schema.as_object().unwrap(), &ViewConfig::default());
        assert_eq!(text, "               a: true\n               b: null\n");
    }

    #[test]
    fn test_long_strings_truncated() {
        let long = format!("{}   {}", "x".repeat(74), "y".repeat(20));
        let schema = json!({ "body": long });
        let text = render_schema(schema.as_object().unwrap(), &ViewConfig::default());

        let expected = format!("            body: \"{} ...\"\n", "x".repeat(74));
        assert_eq!(text, expected);
    }

    #[test]
    fn test_strings_at_limit_untouched() {
        let exact = "z".repeat(80);
        let value = shorten(&json!(exact), &ViewConfig::default());
        assert_eq!(value, json!(exact));
    }

    #[test]
    fn test_render_model() {
        let model = Model::new(
            "polls.Poll",
            vec![Record::new("polls.Poll", 1).with_field("question", "Why?")],
        );
        let config = ViewConfig {
            key_width: 10,
            ..ViewConfig::default()
        };

        assert_eq!(
            render_model(&model, &config),
            format!("{BANNER}\nModel: polls.Poll \n{BANNER}\n  question: \"Why?\"\n")
        );
    }

    #[test]
    fn test_render_report() {
        let mut report = Report::new();
        report.record("app.A", Vec::new());
        report.record(
            "app.B",
            vec![
                Diagnostic::new("app.B", Issue::FieldNotInModel { field: "x".into() }),
                Diagnostic::new("app.B", Issue::MissingRequiredField { field: "y".into() }),
            ],
        );

        assert_eq!(
            render_report(&report),
            "app.B:\n field not in model: x\n missing field is required: y\n\n"
        );
    }

    #[test]
    fn test_render_empty_report() {
        assert_eq!(render_report(&Report::new()), "");
    }
}
