//! Error types for datalens.
//!
//! Every fallible operation in the crate returns [`LensError`]. Fetch failures
//! have their own [`FetchError`] type because the session boundary recovers
//! from them instead of propagating them.

use thiserror::Error;

pub use crate::sources::FetchError;

/// The main error type for datalens.
#[derive(Error, Debug)]
pub enum LensError {
    /// Fetching a dataset from upstream failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A comparison column is absent from one of the two datasets.
    #[error("Column '{column}' is missing from the {dataset} dataset")]
    SchemaMismatch {
        /// The requested category or metric column
        column: String,
        /// Which side of the comparison lacks it ("first" or "second")
        dataset: String,
    },

    /// Error when a required column is not found in a table.
    #[error("Column '{column}' not found in table")]
    ColumnNotFound { column: String },

    /// A dataset name that the catalog does not know.
    #[error("Unknown dataset '{name}'")]
    UnknownDataset { name: String },

    /// Error from DataFusion operations.
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from JSON (de)serialization.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Error related to configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A table whose rows do not line up with its columns.
    #[error("Invalid table: {0}")]
    InvalidTable(String),

    /// Security-related error.
    #[error("Security error: {0}")]
    SecurityError(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, LensError>`.
pub type Result<T> = std::result::Result<T, LensError>;

impl LensError {
    /// Creates a schema mismatch error for the given column and dataset side.
    pub fn schema_mismatch(column: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            column: column.into(),
            dataset: dataset.into(),
        }
    }

    /// Creates a column-not-found error.
    pub fn column_not_found(column: impl Into<String>) -> Self {
        Self::ColumnNotFound {
            column: column.into(),
        }
    }

    /// Returns true for errors the caller must show to the user as an error
    /// rather than a warning.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            LensError::SchemaMismatch { .. }
                | LensError::ColumnNotFound { .. }
                | LensError::UnknownDataset { .. }
                | LensError::Configuration(_)
        )
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<LensError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.map_err(|e| match e.into() {
            LensError::Internal(inner) => LensError::Internal(format!("{msg}: {inner}")),
            other => LensError::Internal(format!("{msg}: {other}")),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let msg = f();
            match e.into() {
                LensError::Internal(inner) => LensError::Internal(format!("{msg}: {inner}")),
                other => LensError::Internal(format!("{msg}: {other}")),
            }
        })
    }
}
