//! Error types for the upsert routine.

use tabsync_core::ParseTextLengthError;

/// Errors raised by a database handle.
#[derive(Debug, thiserror::Error)]
pub enum HandleError {
    /// Error reported by the database driver.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The handle refused the request before it reached the database.
    #[error("{0}")]
    Rejected(String),
}

/// Invalid configuration or call arguments.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Credentials authentication without a username or password.
    #[error("username and password must be provided when trusted authentication is off")]
    MissingCredentials,

    /// The target table name is empty.
    #[error("table name must not be empty")]
    EmptyTableName,

    /// The identifier column name is empty.
    #[error("identifier column name must not be empty")]
    EmptyIdentifierColumn,

    /// The identifier value is NULL, which no equality predicate matches.
    #[error("identifier value must not be NULL")]
    NullIdentifierValue,

    /// The dataset has no columns.
    #[error("dataset has no columns")]
    EmptyDataset,

    /// Unrecognised text length policy.
    #[error(transparent)]
    TextLength(#[from] ParseTextLengthError),
}

/// Errors that abort an upsert. Every one of them rolls the transaction back.
#[derive(Debug, thiserror::Error)]
pub enum UpsertError {
    /// Invalid configuration or arguments.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Creating the missing table failed.
    #[error("failed to create table '{table}': {source}")]
    TableCreation {
        /// Target table.
        table: String,
        /// Underlying cause.
        #[source]
        source: HandleError,
    },

    /// Adding a column failed.
    #[error("failed to add column '{column}' to '{table}': {source}")]
    Ddl {
        /// Target table.
        table: String,
        /// Column being added.
        column: String,
        /// Underlying cause.
        #[source]
        source: HandleError,
    },

    /// A new column has neither an explicit nor an inferred type.
    #[error("cannot resolve a type for new column '{column}' of '{table}'")]
    UnresolvedColumnType {
        /// Target table.
        table: String,
        /// Column without a type.
        column: String,
    },

    /// The dataset has columns the table lacks and mismatches are not allowed.
    #[error("table '{table}' has no column(s) {}", .columns.join(", "))]
    SchemaMismatch {
        /// Target table.
        table: String,
        /// Dataset columns missing from the table.
        columns: Vec<String>,
    },

    /// Deleting or inserting rows failed.
    #[error("failed to {operation} rows of '{table}': {source}")]
    Dml {
        /// Target table.
        table: String,
        /// `delete` or `insert`.
        operation: &'static str,
        /// Underlying cause.
        #[source]
        source: HandleError,
    },

    /// Inspecting the table failed.
    #[error("failed to inspect table '{table}': {source}")]
    Inspection {
        /// Target table.
        table: String,
        /// Underlying cause.
        #[source]
        source: HandleError,
    },

    /// Beginning or committing the transaction failed.
    #[error("transaction error: {0}")]
    Transaction(#[source] HandleError),
}

/// Result type for upsert operations.
pub type Result<T> = std::result::Result<T, UpsertError>;
