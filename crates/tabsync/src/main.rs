//! tabsync CLI
//!
//! Command-line tool for replacing batches of rows in a table.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use tabsync::config::parse_text_length;
use tabsync::prelude::*;
use tabsync_core::{get_dtype_mapping, MssqlDialect, SqliteDialect};

/// Replace-by-identifier table upserts.
#[derive(Parser)]
#[command(name = "tabsync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database URL.
    #[arg(short, long, env = "DATABASE_URL", default_value = "sqlite:tabsync.sqlite3")]
    database: String,

    /// Seconds a statement waits on a locked database.
    #[arg(long, default_value_t = 5)]
    busy_timeout_secs: u64,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the rows matching an identifier with the rows of a JSON file.
    Upsert {
        /// Target table.
        #[arg(short, long)]
        table: String,

        /// JSON array of records.
        #[arg(short, long)]
        input: PathBuf,

        /// Identifier column.
        #[arg(long)]
        id_column: String,

        /// Identifier value, read as a JSON literal or else as text.
        #[arg(long)]
        id_value: String,

        /// Add columns the table lacks.
        #[arg(long)]
        allow_column_mismatch: bool,

        /// Text column length: bounded or max.
        #[arg(long, default_value = "bounded", value_parser = parse_text_length)]
        text_length: TextLength,
    },

    /// Print the CREATE TABLE statement for a JSON file.
    Schema {
        /// Target table.
        #[arg(short, long)]
        table: String,

        /// JSON array of records.
        #[arg(short, long)]
        input: PathBuf,

        /// SQL dialect.
        #[arg(long, value_enum, default_value_t = DialectArg::Sqlite)]
        dialect: DialectArg,

        /// Text column length: bounded or max.
        #[arg(long, default_value = "bounded", value_parser = parse_text_length)]
        text_length: TextLength,
    },

    /// Print the columns of a table as JSON.
    Columns {
        /// Table to inspect.
        #[arg(short, long)]
        table: String,
    },

    /// Print a form-URL-encoded SQL Server ODBC connection string.
    OdbcString(OdbcArgs),
}

#[derive(Args)]
struct OdbcArgs {
    /// Host name or IP address.
    #[arg(long)]
    server: String,

    /// Database name.
    #[arg(long)]
    database: String,

    /// Named instance.
    #[arg(long)]
    instance: Option<String>,

    /// Port.
    #[arg(long)]
    port: Option<u16>,

    /// Login name; omit for a trusted connection.
    #[arg(long, requires = "password")]
    username: Option<String>,

    /// Password.
    #[arg(long, env = "TABSYNC_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Encrypt value (yes or no).
    #[arg(long)]
    encrypt: Option<String>,

    /// Trust the server certificate.
    #[arg(long)]
    trust_server_cert: bool,

    /// ODBC driver name.
    #[arg(long, default_value = tabsync::DEFAULT_ODBC_DRIVER)]
    driver: String,

    /// Print the raw string instead of the encoded one.
    #[arg(long)]
    raw: bool,
}

impl OdbcArgs {
    fn render(self) -> std::result::Result<String, ConfigError> {
        let mut config = ConnectionConfig::new(self.server, self.database);
        config.driver = self.driver;
        if let Some(instance) = self.instance {
            config = config.instance(instance);
        }
        if let Some(port) = self.port {
            config = config.port(port);
        }
        if let Some(username) = self.username {
            config = config.credentials(username, self.password.unwrap_or_default());
        }
        if let Some(encrypt) = self.encrypt {
            config = config.encrypt(encrypt);
        }
        if self.trust_server_cert {
            config = config.trust_server_certificate(true);
        }

        if self.raw {
            config.odbc_connect_string()
        } else {
            config.encoded()
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DialectArg {
    Sqlite,
    Mssql,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Upsert {
            table,
            input,
            id_column,
            id_value,
            allow_column_mismatch,
            text_length,
        } => {
            let dataset = load_dataset(&input)?;
            let db = connect(&cli.database, cli.busy_timeout_secs).await?;
            let identifier = IdentifierPredicate::new(id_column, parse_id_value(&id_value));
            let options = UpsertOptions::new()
                .allow_column_mismatch(allow_column_mismatch)
                .text_length(text_length);

            let report = TableUpserter::new(db)
                .upsert(&dataset, &table, &identifier, &options)
                .await?;

            if report.created {
                info!("Created table {table}");
            }
            for column in &report.added_columns {
                info!("Added column {column}");
            }
            info!(
                "Replaced {} row(s) with {} row(s) in {table}",
                report.deleted, report.inserted
            );
        }

        Commands::Schema {
            table,
            input,
            dialect,
            text_length,
        } => {
            let dataset = load_dataset(&input)?;
            let mapping = get_dtype_mapping(&dataset, text_length);
            let sql = match dialect {
                DialectArg::Sqlite => SqliteDialect::new().create_table_sql(&table, &dataset, &mapping),
                DialectArg::Mssql => MssqlDialect::new().create_table_sql(&table, &dataset, &mapping),
            };
            println!("{sql}");
        }

        Commands::Columns { table } => {
            let db = connect(&cli.database, cli.busy_timeout_secs).await?;
            let mut tx = db.begin().await?;
            let columns = tx.list_columns(&table).await?;
            tx.rollback().await?;

            if columns.is_empty() {
                info!("Table {table} has no columns or does not exist.");
            }
            println!("{}", serde_json::to_string_pretty(&columns)?);
        }

        Commands::OdbcString(args) => println!("{}", args.render()?),
    }

    Ok(())
}

fn load_dataset(path: &Path) -> anyhow::Result<Dataset> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let dataset = Dataset::from_json_records(&json)
        .with_context(|| format!("failed to load records from {}", path.display()))?;
    Ok(dataset)
}

async fn connect(url: &str, busy_timeout_secs: u64) -> anyhow::Result<SqliteDatabase> {
    let options = DatabaseOptions::new(url).busy_timeout(Duration::from_secs(busy_timeout_secs));
    Ok(SqliteDatabase::connect(&options).await?)
}

fn parse_id_value(raw: &str) -> SqlValue {
    serde_json::from_str::<serde_json::Value>(raw)
        .map_or_else(|_| SqlValue::Text(raw.to_string()), SqlValue::from)
}
