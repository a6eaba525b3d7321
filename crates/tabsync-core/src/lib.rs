//! # tabsync-core
//!
//! Driver-agnostic building blocks for replacing a batch of rows in a SQL
//! table while keeping the table's schema in step with the incoming data.
//!
//! This crate provides:
//! - [`Dataset`]: typed, column-oriented tabular data with a per-column
//!   [`NativeType`] resolved once at construction
//! - [`get_dtype_mapping`]: explicit `NVARCHAR` types for text-like columns
//! - [`Dialect`]: DDL/DML text for SQLite and SQL Server
//! - [`parse_create_table`]: column types recovered from `CREATE TABLE` text,
//!   used as the fallback when a new column has no explicit type
//!
//! It performs no I/O. The `tabsync` crate runs the statements.
//!
//! ```rust
//! use tabsync_core::{get_dtype_mapping, parse_create_table, Column, Dataset, Dialect};
//! use tabsync_core::{SqliteDialect, SqlType, TextLength, ColumnTypeMapping};
//!
//! let dataset = Dataset::new(vec![
//!     Column::new("id", [1_i64, 2]),
//!     Column::new("name", ["alice", "bob"]),
//! ])
//! .unwrap();
//!
//! let mapping = get_dtype_mapping(&dataset, TextLength::Bounded);
//! assert_eq!(mapping["name"], SqlType::NVarchar(Some(255)));
//!
//! let dialect = SqliteDialect::new();
//! let would_create = dialect.create_table_sql("people", &dataset, &ColumnTypeMapping::new());
//! assert_eq!(parse_create_table(&would_create)["id"], "INTEGER");
//! ```

pub mod dataset;
pub mod ddl;
pub mod dialect;
pub mod error;
pub mod schema;
pub mod value;

pub use dataset::{Column, Dataset, NativeType};
pub use ddl::{parse_create_table, ColumnDefinitions};
pub use dialect::{Dialect, MssqlDialect, SqliteDialect};
pub use error::{DatasetError, ParseTextLengthError};
pub use schema::{get_dtype_mapping, ColumnTypeMapping, SqlType, TextLength, BOUNDED_TEXT_LENGTH};
pub use value::{SqlValue, ToSqlValue};
