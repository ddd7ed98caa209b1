//! Fixie: inspect, validate and reshape JSON record fixtures.
//!
//! A fixture is a JSON array of records, each tagged with a model name, a
//! primary key and a map of fields. Fixie groups the records by model,
//! infers a representative schema for each group by merging every record's
//! fields, and checks those schemas against an external [`SchemaProvider`].
//! Fixtures can then be pruned, defaulted and denormalized before being
//! written back.
//!
//! # Example
//!
//! ```
//! use fixie::{FieldSpec, Fixture, ModelSchema, StaticSchemaProvider};
//!
//! let mut fixture = Fixture::from_slice(br#"[
//!     {"model": "polls.Poll", "pk": 1, "fields": {"question": "Why?", "legacy_flag": true}},
//!     {"model": "polls.Poll", "pk": 2, "fields": {"question": "How?"}}
//! ]"#).unwrap();
//!
//! let provider = StaticSchemaProvider::new().with_model(
//!     "polls.Poll",
//!     ModelSchema::new().with_field("question", FieldSpec::required()),
//! );
//!
//! let report = fixture.validate_all(&provider);
//! assert_eq!(report.diagnostics().next().unwrap().to_string(), "field not in model: legacy_flag");
//!
//! fixture.drop_unused_all(&provider);
//! assert!(fixture.is_valid(&provider));
//! ```

pub mod diagnostic;
pub mod error;
pub mod fixture;
pub mod locator;
pub mod merge;
pub mod model;
pub mod provider;
pub mod record;
pub mod view;

mod persistence;

pub use diagnostic::{Diagnostic, GroupReport, Issue, Report};
pub use error::{FixieError, Result};
pub use fixture::{Fixture, FixtureConfig};
pub use locator::SourceLocator;
pub use merge::{merge, merge_all, merge_maps};
pub use model::Model;
pub use persistence::SourceMetadata;
pub use provider::{FieldSpec, ModelSchema, SchemaProvider, StaticSchemaProvider};
pub use record::{Record, group_by_model};
pub use view::{ViewConfig, render_model, render_report, render_schema};
