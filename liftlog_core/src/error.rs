//! Error types for the liftlog_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for liftlog_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Built-in catalogue failed its consistency checks
    #[error("Catalog validation error: {0}")]
    CatalogValidation(String),

    /// Malformed or incomplete input (empty workout, out-of-range profile field, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Mutation or deletion of an id that does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Attempt to alter a built-in catalogue entry
    #[error("Permission denied: {0}")]
    Permission(String),

    /// Import document does not have the export shape
    #[error("Format error: {0}")]
    Format(String),

    /// Import failed after some records were already written
    #[error("Import failed after {applied} records were applied: {source}")]
    PartialImport {
        applied: usize,
        #[source]
        source: Box<Error>,
    },

    /// Durable storage rejected a read or write
    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Error::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// True for failures of the underlying durable storage.
    pub fn is_storage(&self) -> bool {
        matches!(self, Error::Storage(_) | Error::Io(_) | Error::Json(_))
    }
}
