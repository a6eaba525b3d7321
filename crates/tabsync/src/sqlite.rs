//! SQLite database handle.

use std::str::FromStr;

use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tabsync_core::{SqlValue, SqliteDialect};
use tracing::{debug, info};

use crate::config::DatabaseOptions;
use crate::error::HandleError;
use crate::handle::{ColumnInfo, Database, Transaction};

/// A SQLite database reached through a connection pool.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Wraps an existing pool.
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connects with the given options.
    ///
    /// With `create_if_missing`, a database file that does not exist yet is
    /// created, so the target database always exists afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`HandleError::Database`] if the URL is invalid or the pool
    /// cannot connect.
    pub async fn connect(options: &DatabaseOptions) -> Result<Self, HandleError> {
        let connect_options = SqliteConnectOptions::from_str(&options.url)?
            .create_if_missing(options.create_if_missing)
            .busy_timeout(options.busy_timeout);

        let existed = database_file_exists(&options.url, &connect_options);

        let pool = SqlitePoolOptions::new()
            .max_connections(options.max_connections)
            .acquire_timeout(options.acquire_timeout)
            .connect_with(connect_options)
            .await?;

        match existed {
            Some(true) => info!(url = %options.url, "Database already exists"),
            Some(false) => info!(url = %options.url, "Database created"),
            None => debug!(url = %options.url, "Connected to in-memory database"),
        }

        Ok(Self { pool })
    }

    /// Returns the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Whether the database file exists; `None` for in-memory databases.
fn database_file_exists(url: &str, options: &SqliteConnectOptions) -> Option<bool> {
    if url.contains(":memory:") || url.contains("mode=memory") {
        return None;
    }
    Some(options.get_filename().exists())
}

impl Database for SqliteDatabase {
    type Transaction = SqliteTransaction;

    async fn begin(&self) -> Result<SqliteTransaction, HandleError> {
        let tx = self.pool.begin().await?;
        Ok(SqliteTransaction {
            tx,
            dialect: SqliteDialect::new(),
        })
    }
}

/// An open SQLite transaction.
pub struct SqliteTransaction {
    tx: sqlx::Transaction<'static, Sqlite>,
    dialect: SqliteDialect,
}

impl Transaction for SqliteTransaction {
    type Dialect = SqliteDialect;

    fn dialect(&self) -> &SqliteDialect {
        &self.dialect
    }

    async fn table_exists(&mut self, table: &str) -> Result<bool, HandleError> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ? COLLATE NOCASE",
        )
        .bind(table)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.is_some())
    }

    async fn list_columns(&mut self, table: &str) -> Result<Vec<ColumnInfo>, HandleError> {
        let rows: Vec<(i64, String, String, i64)> = sqlx::query_as(
            "SELECT cid, name, type, \"notnull\" FROM pragma_table_info(?) ORDER BY cid",
        )
        .bind(table)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(cid, name, declared_type, not_null)| ColumnInfo {
                position: usize::try_from(cid).unwrap_or_default(),
                name,
                declared_type,
                nullable: not_null == 0,
            })
            .collect())
    }

    async fn execute_ddl(&mut self, statement: &str) -> Result<(), HandleError> {
        debug!(sql = %statement, "Executing DDL");
        sqlx::query(statement).execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn execute_dml(&mut self, statement: &str, params: &[SqlValue]) -> Result<u64, HandleError> {
        let mut query = sqlx::query(statement);
        for param in params {
            query = bind_param(query, param);
        }
        let result = query.execute(&mut *self.tx).await?;
        Ok(result.rows_affected())
    }

    async fn commit(self) -> Result<(), HandleError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), HandleError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

fn bind_param<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: &SqlValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        SqlValue::Null => query.bind(Option::<i64>::None),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Int(i) => query.bind(*i),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::Timestamp(ts) => query.bind(*ts),
        SqlValue::Blob(b) => query.bind(b.clone()),
    }
}
