//! Connection descriptor.
//!
//! # Responsibilities
//! - Carry everything needed to open a connection as structured fields
//! - Redact the password in every textual rendering

use std::fmt;

use secrecy::{ExposeSecret, SecretString};
use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::config::{DatabaseSettings, SslMode};

/// Structured connection parameters.
pub struct ConnectionDescriptor {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    password: SecretString,
    pub ssl_mode: SslMode,
}

impl ConnectionDescriptor {
    pub fn from_settings(settings: &DatabaseSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            database: settings.name.clone(),
            username: settings.username.clone(),
            password: SecretString::from(settings.password.expose_secret().to_owned()),
            ssl_mode: settings.ssl_mode,
        }
    }

    /// Driver options built field by field; the password is passed directly.
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(self.password.expose_secret())
            .database(&self.database)
            .ssl_mode(pg_ssl_mode(self.ssl_mode))
    }
}

fn pg_ssl_mode(mode: SslMode) -> PgSslMode {
    match mode {
        SslMode::Disable => PgSslMode::Disable,
        SslMode::Allow => PgSslMode::Allow,
        SslMode::Prefer => PgSslMode::Prefer,
        SslMode::Require => PgSslMode::Require,
        SslMode::VerifyCa => PgSslMode::VerifyCa,
        SslMode::VerifyFull => PgSslMode::VerifyFull,
    }
}

impl fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "host={} port={} user={} password=[REDACTED] dbname={} sslmode={}",
            self.host, self.port, self.username, self.database, self.ssl_mode
        )
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("ssl_mode", &self.ssl_mode)
            .finish()
    }
}
