//! Replace-by-identifier table upserts with schema drift reconciliation.
//!
//! `tabsync` takes a [`Dataset`](tabsync_core::Dataset) and a target table and,
//! inside one transaction:
//!
//! - creates the table if it does not exist, typing text columns explicitly
//! - adds dataset columns the table lacks (opt-in)
//! - deletes the rows matching an identifier value
//! - appends the dataset's rows
//!
//! # Architecture
//!
//! - **Handle** - [`Database`] / [`Transaction`] traits the routine runs on
//! - **SQLite** - [`SqliteDatabase`], the `sqlx` backed handle
//! - **Upsert** - [`TableUpserter`], the state machine itself
//! - **Config** - [`DatabaseOptions`] and the SQL Server [`ConnectionConfig`]
//!
//! # Example
//!
//! ```rust,no_run
//! use tabsync::prelude::*;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let db = SqliteDatabase::connect(&DatabaseOptions::new("sqlite:quotes.sqlite3")).await?;
//! let dataset = Dataset::from_json_records(r#"[{"batch": 7, "ticker": "AAPL"}]"#)?;
//!
//! let report = TableUpserter::new(db)
//!     .upsert(
//!         &dataset,
//!         "quotes",
//!         &IdentifierPredicate::new("batch", 7_i64),
//!         &UpsertOptions::new().allow_column_mismatch(true),
//!     )
//!     .await?;
//! println!("inserted {} rows", report.inserted);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod handle;
pub mod sqlite;
pub mod upsert;

pub use config::{Authentication, ConnectionConfig, DatabaseOptions, DEFAULT_ODBC_DRIVER};
pub use error::{ConfigError, HandleError, Result, UpsertError};
pub use handle::{ColumnInfo, Database, Transaction};
pub use sqlite::{SqliteDatabase, SqliteTransaction};
pub use upsert::{IdentifierPredicate, TableUpserter, UpsertOptions, UpsertReport};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::config::{ConnectionConfig, DatabaseOptions};
    pub use crate::error::{ConfigError, HandleError, Result, UpsertError};
    pub use crate::handle::{ColumnInfo, Database, Transaction};
    pub use crate::sqlite::SqliteDatabase;
    pub use crate::upsert::{IdentifierPredicate, TableUpserter, UpsertOptions, UpsertReport};
    pub use tabsync_core::{
        Column, ColumnTypeMapping, Dataset, Dialect, NativeType, SqlType, SqlValue, TextLength,
    };
}
