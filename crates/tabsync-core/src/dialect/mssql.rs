//! SQL Server dialect.

use crate::dataset::NativeType;
use crate::schema::SqlType;

use super::Dialect;

/// SQL Server dialect (ODBC placeholders, bracket quoting).
#[derive(Debug, Clone, Copy, Default)]
pub struct MssqlDialect;

impl MssqlDialect {
    /// Creates a new SQL Server dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for MssqlDialect {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn type_name(&self, sql_type: &SqlType) -> String {
        match sql_type {
            SqlType::Integer => "INT".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::Float => "FLOAT".to_string(),
            SqlType::Boolean => "BIT".to_string(),
            SqlType::Timestamp => "DATETIME".to_string(),
            SqlType::Text | SqlType::NVarchar(None) => "NVARCHAR(MAX)".to_string(),
            SqlType::NVarchar(Some(len)) => format!("NVARCHAR({len})"),
            SqlType::Blob => "VARBINARY(MAX)".to_string(),
        }
    }

    fn native_type(&self, native: NativeType) -> Option<SqlType> {
        match native {
            NativeType::Integer => Some(SqlType::BigInt),
            NativeType::Float => Some(SqlType::Float),
            NativeType::Boolean => Some(SqlType::Boolean),
            NativeType::Timestamp => Some(SqlType::Timestamp),
            NativeType::Text | NativeType::Object => Some(SqlType::Text),
            NativeType::Binary => Some(SqlType::Blob),
            NativeType::Unknown => None,
        }
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("[{}]", name.replace(']', "]]"))
    }

    // T-SQL has no COLUMN keyword in ADD.
    fn add_column_sql(&self, table: &str, column: &str, type_declaration: &str) -> String {
        format!(
            "ALTER TABLE {} ADD {} {}",
            self.quote_identifier(table),
            self.quote_identifier(column),
            type_declaration
        )
    }
}
