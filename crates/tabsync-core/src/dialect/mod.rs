//! SQL dialects.
//!
//! Each dialect knows how to name storage types, how to infer a storage type
//! from a column's [`NativeType`], and how to quote identifiers. The statement
//! builders are shared and only lean on those primitives.

mod mssql;
mod sqlite;

pub use mssql::MssqlDialect;
pub use sqlite::SqliteDialect;

use crate::dataset::{Dataset, NativeType};
use crate::schema::{ColumnTypeMapping, SqlType};

/// Trait for database-specific SQL generation.
pub trait Dialect: Send + Sync {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Returns the SQL type name for the given type.
    fn type_name(&self, sql_type: &SqlType) -> String;

    /// Storage type the database would pick for a column of this native type.
    ///
    /// `None` when nothing can be inferred (no non-null values).
    fn native_type(&self, native: NativeType) -> Option<SqlType>;

    /// Quote an identifier (table name, column name, etc.).
    #[must_use]
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    /// Bind parameter placeholder for the 1-based parameter `index`.
    #[must_use]
    fn placeholder(&self, _index: usize) -> String {
        String::from("?")
    }

    /// Type declaration for one dataset column: the explicit mapping if it has
    /// an entry, otherwise the dialect's inference.
    #[must_use]
    fn column_type(&self, name: &str, native: NativeType, overrides: &ColumnTypeMapping) -> Option<String> {
        overrides
            .get(name)
            .cloned()
            .or_else(|| self.native_type(native))
            .map(|sql_type| self.type_name(&sql_type))
    }

    /// Generates `CREATE TABLE` for a dataset, one column definition per line.
    ///
    /// A column without a resolvable type is emitted as a bare identifier.
    #[must_use]
    fn create_table_sql(&self, table: &str, dataset: &Dataset, overrides: &ColumnTypeMapping) -> String {
        let definitions: Vec<String> = dataset
            .columns()
            .iter()
            .map(|column| {
                let name = self.quote_identifier(column.name());
                match self.column_type(column.name(), column.native_type(), overrides) {
                    Some(type_name) => format!("{name} {type_name}"),
                    None => name,
                }
            })
            .collect();

        format!(
            "CREATE TABLE {} (\n  {}\n)",
            self.quote_identifier(table),
            definitions.join(",\n  ")
        )
    }

    /// Generates `ALTER TABLE ... ADD COLUMN`.
    #[must_use]
    fn add_column_sql(&self, table: &str, column: &str, type_declaration: &str) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            self.quote_identifier(table),
            self.quote_identifier(column),
            type_declaration
        )
    }

    /// Generates a `DELETE` scoped by one bound equality predicate.
    #[must_use]
    fn delete_where_sql(&self, table: &str, column: &str) -> String {
        format!(
            "DELETE FROM {} WHERE {} = {}",
            self.quote_identifier(table),
            self.quote_identifier(column),
            self.placeholder(1)
        )
    }

    /// Generates a single-row `INSERT` with one placeholder per column.
    #[must_use]
    fn insert_sql(&self, table: &str, columns: &[&str]) -> String {
        let names: Vec<String> = columns.iter().map(|c| self.quote_identifier(c)).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|i| self.placeholder(i)).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.quote_identifier(table),
            names.join(", "),
            placeholders.join(", ")
        )
    }
}
