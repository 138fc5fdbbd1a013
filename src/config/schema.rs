//! Configuration schema definitions.
//!
//! This module defines the validated configuration record and the keys it is
//! read from. Values of these types only exist after validation succeeded.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;

use secrecy::SecretString;

/// Environment keys, in declaration order.
pub mod keys {
    pub const DB_HOST: &str = "DB_HOST";
    pub const DB_PORT: &str = "DB_PORT";
    pub const DB_DATABASE: &str = "DB_DATABASE";
    pub const DB_USERNAME: &str = "DB_USERNAME";
    pub const DB_PASSWORD: &str = "DB_PASSWORD";
    pub const SERVER_PORT: &str = "SERVER_PORT";
    pub const SSL_MODE: &str = "SSL_MODE";

    pub const ALL: [&str; 7] = [
        DB_HOST,
        DB_PORT,
        DB_DATABASE,
        DB_USERNAME,
        DB_PASSWORD,
        SERVER_PORT,
        SSL_MODE,
    ];
}

/// Root configuration for the service.
#[derive(Debug)]
pub struct AppConfig {
    /// Database connection parameters.
    pub database: DatabaseSettings,

    /// HTTP server parameters.
    pub server: ServerSettings,
}

/// Database connection parameters.
#[derive(Debug)]
pub struct DatabaseSettings {
    /// Database host name or address (`DB_HOST`).
    pub host: String,

    /// Database port (`DB_PORT`).
    pub port: u16,

    /// Database name (`DB_DATABASE`).
    pub name: String,

    /// Login role (`DB_USERNAME`).
    pub username: String,

    /// Login password (`DB_PASSWORD`). Debug output is redacted.
    pub password: SecretString,

    /// TLS negotiation mode (`SSL_MODE`).
    pub ssl_mode: SslMode,
}

/// HTTP server parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerSettings {
    /// Listen port (`SERVER_PORT`).
    pub port: u16,
}

impl ServerSettings {
    /// All interfaces on the configured port.
    pub fn bind_address(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, self.port))
    }
}

/// PostgreSQL `sslmode` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslMode {
    Disable,
    Allow,
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

impl SslMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Allow => "allow",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
            SslMode::VerifyCa => "verify-ca",
            SslMode::VerifyFull => "verify-full",
        }
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned for an `SSL_MODE` outside the PostgreSQL set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected one of disable, allow, prefer, require, verify-ca, verify-full")]
pub struct ParseSslModeError;

impl FromStr for SslMode {
    type Err = ParseSslModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disable" => Ok(SslMode::Disable),
            "allow" => Ok(SslMode::Allow),
            "prefer" => Ok(SslMode::Prefer),
            "require" => Ok(SslMode::Require),
            "verify-ca" => Ok(SslMode::VerifyCa),
            "verify-full" => Ok(SslMode::VerifyFull),
            _ => Err(ParseSslModeError),
        }
    }
}
