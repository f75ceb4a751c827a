use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sqlx::mysql::{MySqlConnectOptions, MySqlSslMode};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};

use crate::shared::ValidationError;

/// Connection settings for the operational MySQL database the data is read from.
///
/// The source is only ever read. The password is redacted in debug output.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SourceConnectionConfig {
    /// Hostname or IP address of the MySQL server.
    pub host: String,
    /// Port the MySQL server listens on.
    pub port: u16,
    /// Name of the source database (schema).
    pub name: String,
    /// Username used to authenticate.
    pub username: String,
    /// Password for [`SourceConnectionConfig::username`].
    pub password: Option<SecretString>,
    /// TLS settings.
    #[serde(default)]
    pub tls: TlsConfig,
}

impl SourceConnectionConfig {
    /// Validates the source connection settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.tls.validate()
    }
}

/// TLS settings for the source connection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TlsConfig {
    /// PEM-encoded trusted root certificates.
    #[serde(default)]
    pub trusted_root_certs: String,
    /// Whether TLS is required for the connection.
    #[serde(default)]
    pub enabled: bool,
}

impl TlsConfig {
    /// Checks that certificates are supplied whenever TLS is enabled.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.enabled && self.trusted_root_certs.is_empty() {
            return Err(ValidationError::MissingTrustedRootCerts);
        }

        Ok(())
    }
}

/// Connection settings for the SQLite analytical store the star schema is written to.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TargetConnectionConfig {
    /// Path of the SQLite database file. Created when missing.
    pub path: PathBuf,
}

/// Converts a configuration into the connect options of a specific sqlx driver.
///
/// Keeps driver-specific option building next to the configuration it reads from, so the
/// engine never deals with raw connection strings.
pub trait IntoConnectOptions<Output> {
    /// Builds connect options targeting the configured database.
    fn with_db(&self) -> Output;
}

impl IntoConnectOptions<MySqlConnectOptions> for SourceConnectionConfig {
    fn with_db(&self) -> MySqlConnectOptions {
        let mut options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .database(&self.name)
            .charset("utf8mb4");

        if let Some(password) = &self.password {
            options = options.password(password.expose_secret());
        }

        if self.tls.enabled {
            options = options
                .ssl_mode(MySqlSslMode::VerifyIdentity)
                .ssl_ca_from_pem(self.tls.trusted_root_certs.clone().into_bytes());
        } else {
            options = options.ssl_mode(MySqlSslMode::Preferred);
        }

        options
    }
}

impl IntoConnectOptions<SqliteConnectOptions> for TargetConnectionConfig {
    fn with_db(&self) -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
    }
}
