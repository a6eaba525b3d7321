//! Error types for datasets and type mapping.

use thiserror::Error;

/// Errors raised while building a [`Dataset`](crate::Dataset).
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Two columns share a name.
    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),

    /// A column's length differs from the first column's.
    #[error("column '{column}' has {found} values, expected {expected}")]
    LengthMismatch {
        /// The offending column.
        column: String,
        /// Row count of the first column.
        expected: usize,
        /// Row count of the offending column.
        found: usize,
    },

    /// The input is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The input is valid JSON but not an array of records.
    #[error("not a list of records: {0}")]
    NotRecords(String),
}

/// An unrecognised text length policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid text length '{0}', expected 'bounded' (255) or 'max'")]
pub struct ParseTextLengthError(pub String);
