//! Error types for the Fixie library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Fixie operations.
///
/// Validation and pruning never produce an error; they return
/// [`Diagnostic`](crate::Diagnostic)s instead.
#[derive(Debug, Error)]
pub enum FixieError {
    /// The fixture source could not be located or opened.
    #[error("Cannot find fixture: {0}")]
    FixtureNotFound(String),

    /// No model group with the given name exists in the fixture.
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// The source exists but is not a JSON array of records.
    #[error("Malformed fixture '{path}': {message}")]
    MalformedSource { path: PathBuf, message: String },

    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Saving or history management failed.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FixieError {
    /// Whether this error means something named was absent.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FixieError::FixtureNotFound(_) | FixieError::ModelNotFound(_)
        )
    }
}

/// Result type alias for Fixie operations.
pub type Result<T> = std::result::Result<T, FixieError>;
