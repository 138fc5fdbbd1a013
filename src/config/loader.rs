//! Configuration loading from an environment source.

use std::collections::HashMap;

use secrecy::SecretString;
use serde::de::value::{Error as ValueError, MapDeserializer};
use serde::Deserialize;

use crate::config::schema::{keys, AppConfig, SslMode};
use crate::config::source::EnvSource;
use crate::config::validation::validate;
use crate::singleton::ConstructionPanic;

/// Error type for configuration loading.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// The source could not be found, opened or parsed.
    #[error("environment source `{origin}` is unavailable: {reason}")]
    SourceUnavailable { origin: String, reason: String },

    /// A value is present but has the wrong type.
    #[error("failed to decode `{key}`: {details}")]
    Decode { key: &'static str, details: String },

    /// Required values are absent or empty.
    #[error("missing required configuration: {}", .missing.join(", "))]
    Validation { missing: Vec<&'static str> },

    #[error(transparent)]
    Construction(#[from] ConstructionPanic),
}

impl ConfigError {
    /// Required keys reported missing, empty for other variants.
    pub fn missing_fields(&self) -> &[&'static str] {
        match self {
            ConfigError::Validation { missing } => missing,
            _ => &[],
        }
    }
}

/// Raw string view of the environment. Absent keys decode as empty strings.
#[derive(Deserialize, Default)]
#[serde(default)]
struct RawEnvironment {
    #[serde(rename = "DB_HOST")]
    db_host: String,
    #[serde(rename = "DB_PORT")]
    db_port: String,
    #[serde(rename = "DB_DATABASE")]
    db_database: String,
    #[serde(rename = "DB_USERNAME")]
    db_username: String,
    #[serde(rename = "DB_PASSWORD")]
    db_password: String,
    #[serde(rename = "SERVER_PORT")]
    server_port: String,
    #[serde(rename = "SSL_MODE")]
    ssl_mode: String,
}

/// Typed environment values, before presence checks.
///
/// Absent numbers are zero and an absent TLS mode is `None`, mirroring the
/// zero values validation rejects.
pub struct DecodedEnvironment {
    pub db_host: String,
    pub db_port: u16,
    pub db_database: String,
    pub db_username: String,
    pub db_password: SecretString,
    pub server_port: u16,
    pub ssl_mode: Option<SslMode>,
}

/// Decode raw key/value pairs into typed values.
pub fn decode(values: HashMap<String, String>) -> Result<DecodedEnvironment, ConfigError> {
    let raw = RawEnvironment::deserialize(MapDeserializer::<_, ValueError>::new(values.into_iter()))
        .map_err(|e| ConfigError::Decode {
            key: "environment",
            details: e.to_string(),
        })?;

    Ok(DecodedEnvironment {
        db_port: decode_port(keys::DB_PORT, &raw.db_port)?,
        server_port: decode_port(keys::SERVER_PORT, &raw.server_port)?,
        ssl_mode: decode_ssl_mode(&raw.ssl_mode)?,
        db_host: raw.db_host,
        db_database: raw.db_database,
        db_username: raw.db_username,
        db_password: SecretString::from(raw.db_password),
    })
}

fn decode_port(key: &'static str, raw: &str) -> Result<u16, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse().map_err(|e: std::num::ParseIntError| ConfigError::Decode {
        key,
        details: e.to_string(),
    })
}

fn decode_ssl_mode(raw: &str) -> Result<Option<SslMode>, ConfigError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(|e: crate::config::schema::ParseSslModeError| {
        ConfigError::Decode {
            key: keys::SSL_MODE,
            details: e.to_string(),
        }
    })
}

/// Read, decode and validate configuration from `source`.
pub fn load_config(source: &dyn EnvSource) -> Result<AppConfig, ConfigError> {
    let origin = source.describe();
    tracing::debug!(source = %origin, "Loading configuration");

    let values = source.read()?;
    let decoded = decode(values)?;
    let config = validate(decoded)?;

    tracing::info!(
        source = %origin,
        db_host = %config.database.host,
        db_port = config.database.port,
        db_name = %config.database.name,
        ssl_mode = %config.database.ssl_mode,
        server_port = config.server.port,
        "Configuration loaded"
    );
    Ok(config)
}
