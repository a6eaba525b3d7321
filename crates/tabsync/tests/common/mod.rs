#![allow(dead_code)]

use sqlx::sqlite::SqlitePoolOptions;
use tabsync::{ColumnInfo, Database, HandleError, SqliteDatabase, SqliteTransaction, Transaction};
use tabsync_core::{Dataset, SqlValue, SqliteDialect};

pub async fn memory_database() -> SqliteDatabase {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory SQLite pool");
    SqliteDatabase::new(pool)
}

pub fn records(json: &str) -> Dataset {
    Dataset::from_json_records(json).unwrap_or_else(|e| panic!("Invalid records: {json}\nError: {e}"))
}

pub async fn columns(db: &SqliteDatabase, table: &str) -> Vec<ColumnInfo> {
    let mut tx = db.begin().await.unwrap();
    let columns = tx.list_columns(table).await.unwrap();
    tx.rollback().await.unwrap();
    columns
}

pub async fn column_names(db: &SqliteDatabase, table: &str) -> Vec<String> {
    columns(db, table).await.into_iter().map(|c| c.name).collect()
}

pub async fn table_exists(db: &SqliteDatabase, table: &str) -> bool {
    let mut tx = db.begin().await.unwrap();
    let exists = tx.table_exists(table).await.unwrap();
    tx.rollback().await.unwrap();
    exists
}

pub async fn count_rows(db: &SqliteDatabase, sql: &str) -> i64 {
    sqlx::query_scalar(sql)
        .fetch_one(db.pool())
        .await
        .unwrap_or_else(|e| panic!("Failed to run: {sql}\nError: {e}"))
}

pub async fn tickers(db: &SqliteDatabase, batch: i64) -> Vec<String> {
    sqlx::query_scalar("SELECT ticker FROM quotes WHERE batch = ? ORDER BY ticker")
        .bind(batch)
        .fetch_all(db.pool())
        .await
        .unwrap()
}

/// Statement kind a [`FaultyDatabase`] refuses to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Alter,
    Delete,
    Insert,
}

impl Fault {
    fn matches(self, statement: &str) -> bool {
        let keyword = match self {
            Self::Alter => "ALTER",
            Self::Delete => "DELETE",
            Self::Insert => "INSERT",
        };
        statement.trim_start().starts_with(keyword)
    }
}

/// Wraps a SQLite database and fails every statement of one kind.
#[derive(Clone)]
pub struct FaultyDatabase {
    inner: SqliteDatabase,
    fault: Fault,
}

impl FaultyDatabase {
    pub fn new(inner: SqliteDatabase, fault: Fault) -> Self {
        Self { inner, fault }
    }
}

pub struct FaultyTransaction {
    inner: SqliteTransaction,
    fault: Fault,
}

impl FaultyTransaction {
    fn check(&self, statement: &str) -> Result<(), HandleError> {
        if self.fault.matches(statement) {
            return Err(HandleError::Rejected(format!("{:?} failed", self.fault)));
        }
        Ok(())
    }
}

impl Database for FaultyDatabase {
    type Transaction = FaultyTransaction;

    async fn begin(&self) -> Result<FaultyTransaction, HandleError> {
        Ok(FaultyTransaction {
            inner: self.inner.begin().await?,
            fault: self.fault,
        })
    }
}

impl Transaction for FaultyTransaction {
    type Dialect = SqliteDialect;

    fn dialect(&self) -> &SqliteDialect {
        self.inner.dialect()
    }

    async fn table_exists(&mut self, table: &str) -> Result<bool, HandleError> {
        self.inner.table_exists(table).await
    }

    async fn list_columns(&mut self, table: &str) -> Result<Vec<ColumnInfo>, HandleError> {
        self.inner.list_columns(table).await
    }

    async fn execute_ddl(&mut self, statement: &str) -> Result<(), HandleError> {
        self.check(statement)?;
        self.inner.execute_ddl(statement).await
    }

    async fn execute_dml(&mut self, statement: &str, params: &[SqlValue]) -> Result<u64, HandleError> {
        self.check(statement)?;
        self.inner.execute_dml(statement, params).await
    }

    async fn commit(self) -> Result<(), HandleError> {
        self.inner.commit().await
    }

    async fn rollback(self) -> Result<(), HandleError> {
        self.inner.rollback().await
    }
}
