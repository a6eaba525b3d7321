//! Replace-by-identifier upserts.
//!
//! One call brings a table in line with a dataset for one identifier value:
//!
//! - table absent: create it from the dataset, then insert every row
//! - table present: add any missing columns (when allowed), delete the rows
//!   matching the identifier, then insert every row
//!
//! Everything happens inside a single transaction. Any failure rolls back the
//! whole call, so no partial schema change or row replacement is ever visible.

use tabsync_core::{
    get_dtype_mapping, parse_create_table, ColumnDefinitions, ColumnTypeMapping, Dataset, Dialect,
    SqlValue, TextLength, ToSqlValue,
};
use tracing::{debug, error, info, warn};

use crate::error::{ConfigError, Result, UpsertError};
use crate::handle::{Database, Transaction};

/// Column and value that identify the rows a batch supersedes.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentifierPredicate {
    /// Identifier column.
    pub column: String,
    /// Identifier value.
    pub value: SqlValue,
}

impl IdentifierPredicate {
    /// Creates a predicate.
    #[must_use]
    pub fn new(column: impl Into<String>, value: impl ToSqlValue) -> Self {
        Self {
            column: column.into(),
            value: value.to_sql_value(),
        }
    }
}

/// Options for one upsert call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpsertOptions {
    /// Add dataset columns the table lacks instead of rejecting the call.
    pub allow_column_mismatch: bool,
    /// Length policy for text columns.
    pub text_length: TextLength,
}

impl UpsertOptions {
    /// Default options: no column mismatch, bounded text.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            allow_column_mismatch: false,
            text_length: TextLength::Bounded,
        }
    }

    /// Allows or forbids adding missing columns.
    #[must_use]
    pub const fn allow_column_mismatch(mut self, allow: bool) -> Self {
        self.allow_column_mismatch = allow;
        self
    }

    /// Sets the text length policy.
    #[must_use]
    pub const fn text_length(mut self, text_length: TextLength) -> Self {
        self.text_length = text_length;
        self
    }
}

/// What a successful upsert did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertReport {
    /// The table did not exist and was created.
    pub created: bool,
    /// Columns added to an existing table, in dataset order.
    pub added_columns: Vec<String>,
    /// Rows removed for the identifier.
    pub deleted: u64,
    /// Rows inserted.
    pub inserted: u64,
}

/// Runs upserts against a database.
pub struct TableUpserter<D: Database> {
    database: D,
}

impl<D: Database> TableUpserter<D> {
    /// Creates an upserter over a database.
    #[must_use]
    pub const fn new(database: D) -> Self {
        Self { database }
    }

    /// Returns the database.
    #[must_use]
    pub const fn database(&self) -> &D {
        &self.database
    }

    /// Replaces the rows of `table` matching `identifier` with the dataset.
    ///
    /// Creates the table if needed and, with
    /// [`UpsertOptions::allow_column_mismatch`], adds dataset columns the
    /// table lacks. Without it, such columns fail the call with
    /// [`UpsertError::SchemaMismatch`]. The whole call is one transaction.
    ///
    /// # Errors
    ///
    /// Invalid arguments fail with [`UpsertError::Configuration`] before a
    /// transaction is opened. Every later failure rolls the transaction back
    /// and is returned as the [`UpsertError`] variant of the failing step.
    pub async fn upsert(
        &self,
        dataset: &Dataset,
        table: &str,
        identifier: &IdentifierPredicate,
        options: &UpsertOptions,
    ) -> Result<UpsertReport> {
        validate(dataset, table, identifier)?;

        info!(
            table = %table,
            identifier = %identifier.column,
            value = %identifier.value,
            rows = dataset.row_count(),
            "Upserting dataset"
        );

        let mut tx = self.database.begin().await.map_err(UpsertError::Transaction)?;

        match apply(&mut tx, dataset, table, identifier, *options).await {
            Ok(report) => {
                tx.commit().await.map_err(UpsertError::Transaction)?;
                info!(
                    table = %table,
                    created = report.created,
                    added_columns = report.added_columns.len(),
                    deleted = report.deleted,
                    inserted = report.inserted,
                    "Upsert committed"
                );
                Ok(report)
            }
            Err(err) => {
                warn!(table = %table, error = %err, "Upsert failed, rolling back");
                if let Err(rollback_err) = tx.rollback().await {
                    error!(table = %table, error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }
}

fn validate(dataset: &Dataset, table: &str, identifier: &IdentifierPredicate) -> Result<()> {
    if table.trim().is_empty() {
        return Err(ConfigError::EmptyTableName.into());
    }
    if identifier.column.trim().is_empty() {
        return Err(ConfigError::EmptyIdentifierColumn.into());
    }
    if identifier.value.is_null() {
        return Err(ConfigError::NullIdentifierValue.into());
    }
    if dataset.is_empty() {
        return Err(ConfigError::EmptyDataset.into());
    }
    Ok(())
}

/// All steps of one upsert, run on an open transaction.
async fn apply<T: Transaction>(
    tx: &mut T,
    dataset: &Dataset,
    table: &str,
    identifier: &IdentifierPredicate,
    options: UpsertOptions,
) -> Result<UpsertReport> {
    let exists = tx
        .table_exists(table)
        .await
        .map_err(|source| UpsertError::Inspection {
            table: table.to_string(),
            source,
        })?;

    let mapping = get_dtype_mapping(dataset, options.text_length);
    let fallback = parse_create_table(&tx.dialect().create_table_sql(
        table,
        dataset,
        &ColumnTypeMapping::new(),
    ));

    let mut report = UpsertReport::default();

    if exists {
        let live: Vec<String> = tx
            .list_columns(table)
            .await
            .map_err(|source| UpsertError::Inspection {
                table: table.to_string(),
                source,
            })?
            .into_iter()
            .map(|column| column.name)
            .collect();

        report.added_columns = reconcile_columns(
            tx,
            dataset,
            table,
            &live,
            &mapping,
            &fallback,
            options.allow_column_mismatch,
        )
        .await?;

        ensure_identifier_column(table, identifier, &live, &report.added_columns)?;

        report.deleted = delete_matching(tx, table, identifier).await?;
    } else {
        info!(table = %table, "Table does not exist, creating it");
        tx.create_table_from_dataset(table, dataset, &mapping)
            .await
            .map_err(|source| UpsertError::TableCreation {
                table: table.to_string(),
                source,
            })?;
        report.created = true;
    }

    report.inserted = tx
        .append_rows(table, dataset, &mapping)
        .await
        .map_err(|source| UpsertError::Dml {
            table: table.to_string(),
            operation: "insert",
            source,
        })?;

    Ok(report)
}

/// Adds the dataset columns the table lacks, or rejects them.
async fn reconcile_columns<T: Transaction>(
    tx: &mut T,
    dataset: &Dataset,
    table: &str,
    live: &[String],
    mapping: &ColumnTypeMapping,
    fallback: &ColumnDefinitions,
    allow_column_mismatch: bool,
) -> Result<Vec<String>> {
    let new_columns: Vec<&str> = dataset
        .column_names()
        .filter(|name| !live.iter().any(|c| c.eq_ignore_ascii_case(name)))
        .collect();

    if new_columns.is_empty() {
        return Ok(Vec::new());
    }

    if !allow_column_mismatch {
        return Err(UpsertError::SchemaMismatch {
            table: table.to_string(),
            columns: new_columns.iter().copied().map(String::from).collect(),
        });
    }

    let resolved = new_columns
        .iter()
        .map(|name| {
            resolve_column_type(tx.dialect(), name, mapping, fallback)
                .map(|type_declaration| (*name, type_declaration))
                .ok_or_else(|| UpsertError::UnresolvedColumnType {
                    table: table.to_string(),
                    column: (*name).to_string(),
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut added = Vec::with_capacity(resolved.len());
    for (name, type_declaration) in resolved {
        info!(table = %table, column = %name, sql_type = %type_declaration, "Adding column");
        let statement = tx.dialect().add_column_sql(table, name, &type_declaration);
        tx.execute_ddl(&statement)
            .await
            .map_err(|source| UpsertError::Ddl {
                table: table.to_string(),
                column: name.to_string(),
                source,
            })?;
        added.push(name.to_string());
    }

    Ok(added)
}

/// The identifier column must exist before the previous batch is deleted.
fn ensure_identifier_column(
    table: &str,
    identifier: &IdentifierPredicate,
    live: &[String],
    added: &[String],
) -> Result<()> {
    if live
        .iter()
        .chain(added)
        .any(|name| name.eq_ignore_ascii_case(&identifier.column))
    {
        return Ok(());
    }
    Err(UpsertError::SchemaMismatch {
        table: table.to_string(),
        columns: vec![identifier.column.clone()],
    })
}

/// Explicit mapping first, then the type from the would-create DDL.
fn resolve_column_type(
    dialect: &impl Dialect,
    name: &str,
    mapping: &ColumnTypeMapping,
    fallback: &ColumnDefinitions,
) -> Option<String> {
    mapping
        .get(name)
        .map(|sql_type| dialect.type_name(sql_type))
        .or_else(|| fallback.get(name).cloned())
}

/// Deletes the previous batch for the identifier.
async fn delete_matching<T: Transaction>(
    tx: &mut T,
    table: &str,
    identifier: &IdentifierPredicate,
) -> Result<u64> {
    let statement = tx.dialect().delete_where_sql(table, &identifier.column);
    debug!(sql = %statement, value = %identifier.value, "Deleting previous batch");

    let deleted = tx
        .execute_dml(&statement, std::slice::from_ref(&identifier.value))
        .await
        .map_err(|source| UpsertError::Dml {
            table: table.to_string(),
            operation: "delete",
            source,
        })?;

    debug!(table = %table, deleted, "Deleted previous batch");
    Ok(deleted)
}
