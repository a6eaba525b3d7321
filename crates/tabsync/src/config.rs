//! Connection configuration.
//!
//! All settings are explicit values handed to whoever needs them. Nothing here
//! reads or writes process-wide state.

use std::time::Duration;

use tabsync_core::TextLength;
use url::form_urlencoded;

use crate::error::ConfigError;

/// Default ODBC driver for SQL Server.
pub const DEFAULT_ODBC_DRIVER: &str = "ODBC Driver 17 for SQL Server";

/// Options for opening a [`SqliteDatabase`](crate::SqliteDatabase).
///
/// Timeouts are passed through to the pool untouched; the upsert routine has
/// none of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseOptions {
    /// Connection URL, e.g. `sqlite:data.sqlite3`.
    pub url: String,
    /// Pool size.
    pub max_connections: u32,
    /// How long a statement waits on a locked database.
    pub busy_timeout: Duration,
    /// How long to wait for a pooled connection.
    pub acquire_timeout: Duration,
    /// Create the database file if it does not exist.
    pub create_if_missing: bool,
}

impl DatabaseOptions {
    /// Options with defaults for everything but the URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
            acquire_timeout: Duration::from_secs(30),
            create_if_missing: true,
        }
    }

    /// Sets the busy timeout.
    #[must_use]
    pub const fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Sets the pool size.
    #[must_use]
    pub const fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}

/// How to authenticate against SQL Server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// Windows integrated authentication.
    Trusted,
    /// SQL Server authentication.
    Credentials {
        /// Login name.
        username: String,
        /// Password.
        password: String,
    },
}

/// SQL Server connection settings rendered as an ODBC connection string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Host name or IP address.
    pub server: String,
    /// Named instance, rendered as `host\instance`.
    pub instance: Option<String>,
    /// Port, rendered as `host,port`.
    pub port: Option<u16>,
    /// Target database.
    pub database: String,
    /// Authentication mode.
    pub authentication: Authentication,
    /// ODBC driver name.
    pub driver: String,
    /// `Encrypt=` value, typically `yes` or `no`.
    pub encrypt: Option<String>,
    /// `TrustServerCertificate=` flag.
    pub trust_server_certificate: Option<bool>,
}

impl ConnectionConfig {
    /// Trusted connection to `database` on `server` with the default driver.
    #[must_use]
    pub fn new(server: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            instance: None,
            port: None,
            database: database.into(),
            authentication: Authentication::Trusted,
            driver: DEFAULT_ODBC_DRIVER.to_string(),
            encrypt: None,
            trust_server_certificate: None,
        }
    }

    /// Sets the named instance.
    #[must_use]
    pub fn instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Uses SQL Server authentication.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.authentication = Authentication::Credentials {
            username: username.into(),
            password: password.into(),
        };
        self
    }

    /// Sets the `Encrypt=` value.
    #[must_use]
    pub fn encrypt(mut self, encrypt: impl Into<String>) -> Self {
        self.encrypt = Some(encrypt.into());
        self
    }

    /// Sets `TrustServerCertificate=`.
    #[must_use]
    pub const fn trust_server_certificate(mut self, trust: bool) -> Self {
        self.trust_server_certificate = Some(trust);
        self
    }

    /// Same settings pointed at another database, e.g. `master`.
    #[must_use]
    pub fn for_database(&self, database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..self.clone()
        }
    }

    /// The `SERVER=` value.
    #[must_use]
    pub fn server_address(&self) -> String {
        let mut address = self.server.clone();
        if let Some(instance) = &self.instance {
            address.push('\\');
            address.push_str(instance);
        }
        if let Some(port) = self.port {
            address.push_str(&format!(",{port}"));
        }
        address
    }

    /// Renders the raw ODBC connection string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredentials`] if a username or password
    /// is empty.
    pub fn odbc_connect_string(&self) -> Result<String, ConfigError> {
        let mut parts = vec![
            format!("DRIVER={{{}}}", self.driver),
            format!("SERVER={}", self.server_address()),
            format!("DATABASE={}", self.database),
        ];

        match &self.authentication {
            Authentication::Trusted => parts.push("Trusted_Connection=yes".to_string()),
            Authentication::Credentials { username, password } => {
                if username.is_empty() || password.is_empty() {
                    return Err(ConfigError::MissingCredentials);
                }
                parts.push(format!("UID={username}"));
                parts.push(format!("PWD={password}"));
            }
        }

        if let Some(encrypt) = &self.encrypt {
            parts.push(format!("Encrypt={encrypt}"));
        }
        if let Some(trust) = self.trust_server_certificate {
            parts.push(format!(
                "TrustServerCertificate={}",
                if trust { "yes" } else { "no" }
            ));
        }

        Ok(parts.join(";"))
    }

    /// The connection string, form-URL-encoded for embedding in a URL query.
    ///
    /// # Errors
    ///
    /// Fails like [`ConnectionConfig::odbc_connect_string`].
    pub fn encoded(&self) -> Result<String, ConfigError> {
        let raw = self.odbc_connect_string()?;
        Ok(form_urlencoded::byte_serialize(raw.as_bytes()).collect())
    }
}

/// Parses a text length policy, reporting failures as configuration errors.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the value is neither `bounded` nor `max`.
pub fn parse_text_length(value: &str) -> Result<TextLength, ConfigError> {
    Ok(value.parse::<TextLength>()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trusted_connection_string() {
        let config = ConnectionConfig::new("192.168.10.55", "quotes").instance("sql10");
        assert_eq!(
            config.odbc_connect_string().unwrap(),
            "DRIVER={ODBC Driver 17 for SQL Server};SERVER=192.168.10.55\\sql10;DATABASE=quotes;Trusted_Connection=yes"
        );
    }

    #[test]
    fn test_credentials_and_flags() {
        let config = ConnectionConfig::new("db.local", "quotes")
            .port(1435)
            .credentials("loader", "s3cret")
            .encrypt("yes")
            .trust_server_certificate(true);
        assert_eq!(
            config.odbc_connect_string().unwrap(),
            "DRIVER={ODBC Driver 17 for SQL Server};SERVER=db.local,1435;DATABASE=quotes;\
             UID=loader;PWD=s3cret;Encrypt=yes;TrustServerCertificate=yes"
        );
    }

    #[test]
    fn test_missing_credentials() {
        let config = ConnectionConfig::new("db.local", "quotes").credentials("loader", "");
        assert!(matches!(
            config.odbc_connect_string(),
            Err(ConfigError::MissingCredentials)
        ));
    }

    #[test]
    fn test_encoded_uses_plus_for_spaces() {
        let encoded = ConnectionConfig::new("db", "quotes").encoded().unwrap();
        assert!(encoded.starts_with("DRIVER%3D%7BODBC+Driver+17+for+SQL+Server%7D%3B"));
        assert!(encoded.ends_with("Trusted_Connection%3Dyes"));
    }

    #[test]
    fn test_for_database_keeps_other_settings() {
        let config = ConnectionConfig::new("db", "quotes").credentials("u", "p");
        let master = config.for_database("master");
        assert_eq!(master.database, "master");
        assert_eq!(master.authentication, config.authentication);
    }

    #[test]
    fn test_parse_text_length() {
        assert_eq!(parse_text_length("max").unwrap(), TextLength::Max);
        assert!(matches!(
            parse_text_length("wide"),
            Err(ConfigError::TextLength(_))
        ));
    }
}
