//! Database handle traits.
//!
//! The upsert routine never talks to a driver directly. It opens one
//! [`Transaction`] through a [`Database`] and runs every inspection, DDL and
//! DML statement on it. Driver crates implement the primitives; table
//! creation and row appends are provided on top of them.

use std::future::Future;

use serde::Serialize;
use tabsync_core::{ColumnTypeMapping, Dataset, Dialect, SqlType, SqlValue};
use tracing::debug;

use crate::error::HandleError;

/// A live column, as reported by schema inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    /// Zero-based ordinal position.
    pub position: usize,
    /// Column name.
    pub name: String,
    /// Declared type, verbatim.
    pub declared_type: String,
    /// Whether the column accepts NULL.
    pub nullable: bool,
}

/// Source of transactions.
///
/// Implementations may write the methods as `async fn`; the returned futures
/// must be `Send`.
pub trait Database: Send + Sync {
    /// The transaction type this database hands out.
    type Transaction: Transaction;

    /// Opens a transaction. Dropping it without [`Transaction::commit`] rolls
    /// it back.
    ///
    /// # Errors
    ///
    /// Returns a [`HandleError`] if no connection can be acquired or the
    /// transaction cannot be started.
    fn begin(&self) -> impl Future<Output = Result<Self::Transaction, HandleError>> + Send;
}

/// A unit of work on one connection.
///
/// Every method fails with a [`HandleError`] when the database or the handle
/// rejects the request.
pub trait Transaction: Sized + Send {
    /// The SQL dialect of the underlying database.
    type Dialect: Dialect;

    /// Returns the dialect.
    fn dialect(&self) -> &Self::Dialect;

    /// Checks whether a table exists.
    fn table_exists(&mut self, table: &str) -> impl Future<Output = Result<bool, HandleError>> + Send;

    /// Lists a table's columns in ordinal order.
    fn list_columns(
        &mut self,
        table: &str,
    ) -> impl Future<Output = Result<Vec<ColumnInfo>, HandleError>> + Send;

    /// Executes a DDL statement.
    fn execute_ddl(&mut self, statement: &str) -> impl Future<Output = Result<(), HandleError>> + Send;

    /// Executes a DML statement with bound parameters, returning the number of
    /// affected rows.
    fn execute_dml(
        &mut self,
        statement: &str,
        params: &[SqlValue],
    ) -> impl Future<Output = Result<u64, HandleError>> + Send;

    /// Commits the transaction.
    fn commit(self) -> impl Future<Output = Result<(), HandleError>> + Send;

    /// Rolls the transaction back.
    fn rollback(self) -> impl Future<Output = Result<(), HandleError>> + Send;

    /// Creates `table` with one column per dataset column.
    ///
    /// Columns in `overrides` get that type; the rest get the dialect's
    /// inference for their native type.
    fn create_table_from_dataset(
        &mut self,
        table: &str,
        dataset: &Dataset,
        overrides: &ColumnTypeMapping,
    ) -> impl Future<Output = Result<(), HandleError>> + Send {
        async move {
            let statement = self.dialect().create_table_sql(table, dataset, overrides);
            self.execute_ddl(&statement).await
        }
    }

    /// Inserts every dataset row into `table`, returning the number inserted.
    ///
    /// Values of columns in `overrides` with a text type are stored as text;
    /// values longer than a bounded text type are rejected.
    fn append_rows(
        &mut self,
        table: &str,
        dataset: &Dataset,
        overrides: &ColumnTypeMapping,
    ) -> impl Future<Output = Result<u64, HandleError>> + Send {
        async move {
            let names: Vec<&str> = dataset.column_names().collect();
            let statement = self.dialect().insert_sql(table, &names);
            let text_types: Vec<Option<&SqlType>> = names
                .iter()
                .map(|name| overrides.get(*name).filter(|t| t.is_text()))
                .collect();

            debug!(sql = %statement, rows = dataset.row_count(), "Appending rows");

            let mut inserted = 0;
            for row in dataset.rows() {
                let params = row
                    .into_iter()
                    .zip(&names)
                    .zip(&text_types)
                    .map(|((value, name), text_type)| match text_type {
                        Some(sql_type) => coerce_text(name, value, sql_type),
                        None => Ok(value.clone()),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                inserted += self.execute_dml(&statement, &params).await?;
            }
            Ok(inserted)
        }
    }
}

/// Coerces a value bound for a text column.
fn coerce_text(column: &str, value: &SqlValue, sql_type: &SqlType) -> Result<SqlValue, HandleError> {
    if value.is_null() {
        return Ok(SqlValue::Null);
    }
    let text = value.to_text().ok_or_else(|| {
        HandleError::Rejected(format!(
            "column '{column}' stores text but got a {} value",
            value.kind()
        ))
    })?;
    if let Some(max) = sql_type.max_length() {
        let length = text.chars().count();
        if length > max {
            return Err(HandleError::Rejected(format!(
                "value of {length} characters exceeds NVARCHAR({max}) in column '{column}'"
            )));
        }
    }
    Ok(SqlValue::Text(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_text_renders_numbers() {
        let coerced = coerce_text("c", &SqlValue::Int(7), &SqlType::NVarchar(Some(255))).unwrap();
        assert_eq!(coerced, SqlValue::Text(String::from("7")));
    }

    #[test]
    fn test_coerce_text_keeps_null() {
        let coerced = coerce_text("c", &SqlValue::Null, &SqlType::NVarchar(Some(1))).unwrap();
        assert_eq!(coerced, SqlValue::Null);
    }

    #[test]
    fn test_coerce_text_rejects_overlong_values() {
        let value = SqlValue::Text("x".repeat(256));
        let err = coerce_text("note", &value, &SqlType::NVarchar(Some(255))).unwrap_err();
        assert!(err.to_string().contains("NVARCHAR(255)"));

        let unbounded = coerce_text("note", &value, &SqlType::NVarchar(None)).unwrap();
        assert_eq!(unbounded, value);
    }

    #[test]
    fn test_coerce_text_rejects_blobs() {
        let err = coerce_text("c", &SqlValue::Blob(vec![1]), &SqlType::Text).unwrap_err();
        assert!(matches!(err, HandleError::Rejected(_)));
    }
}
