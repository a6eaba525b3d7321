//! SQLite dialect.
//!
//! SQLite keeps declared column types verbatim and derives a type affinity
//! from them, so `NVARCHAR(255)` is stored as written and behaves as text.
//! The length is not enforced; bounded text is checked before binding.

use crate::dataset::NativeType;
use crate::schema::SqlType;

use super::Dialect;

/// SQLite dialect.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn type_name(&self, sql_type: &SqlType) -> String {
        match sql_type {
            SqlType::Integer | SqlType::BigInt => "INTEGER".to_string(),
            SqlType::Float => "REAL".to_string(),
            SqlType::Boolean => "BOOLEAN".to_string(),
            SqlType::Timestamp => "TIMESTAMP".to_string(),
            SqlType::Text => "TEXT".to_string(),
            SqlType::NVarchar(Some(len)) => format!("NVARCHAR({len})"),
            // A length in parentheses must be numeric.
            SqlType::NVarchar(None) => "NVARCHAR".to_string(),
            SqlType::Blob => "BLOB".to_string(),
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
}
