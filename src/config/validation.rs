//! Configuration validation.
//!
//! # Responsibilities
//! - Check that every required value is present and non-default
//! - Build the immutable `AppConfig` only when all checks pass
//!
//! # Design Decisions
//! - Returns all missing fields, not just the first, in declaration order
//! - Whitespace-only strings count as missing
//! - Surrounding whitespace is trimmed from non-secret text; the password is kept verbatim
//! - Pure function: DecodedEnvironment → Result<AppConfig, ConfigError>

use secrecy::ExposeSecret;

use crate::config::loader::{ConfigError, DecodedEnvironment};
use crate::config::schema::{keys, AppConfig, DatabaseSettings, ServerSettings};

/// Turn decoded values into a validated configuration record.
pub fn validate(env: DecodedEnvironment) -> Result<AppConfig, ConfigError> {
    let mut missing = Vec::new();

    require_text(keys::DB_HOST, &env.db_host, &mut missing);
    require_port(keys::DB_PORT, env.db_port, &mut missing);
    require_text(keys::DB_DATABASE, &env.db_database, &mut missing);
    require_text(keys::DB_USERNAME, &env.db_username, &mut missing);
    require_text(keys::DB_PASSWORD, env.db_password.expose_secret(), &mut missing);
    require_port(keys::SERVER_PORT, env.server_port, &mut missing);
    if env.ssl_mode.is_none() {
        missing.push(keys::SSL_MODE);
    }

    match env.ssl_mode {
        Some(ssl_mode) if missing.is_empty() => Ok(AppConfig {
            database: DatabaseSettings {
                host: trimmed(env.db_host),
                port: env.db_port,
                name: trimmed(env.db_database),
                username: trimmed(env.db_username),
                password: env.db_password,
                ssl_mode,
            },
            server: ServerSettings {
                port: env.server_port,
            },
        }),
        _ => {
            tracing::warn!(missing = ?missing, "Configuration rejected");
            Err(ConfigError::Validation { missing })
        }
    }
}

fn require_text(key: &'static str, value: &str, missing: &mut Vec<&'static str>) {
    if value.trim().is_empty() {
        missing.push(key);
    }
}

fn trimmed(value: String) -> String {
    value.trim().to_owned()
}

fn require_port(key: &'static str, value: u16, missing: &mut Vec<&'static str>) {
    if value == 0 {
        missing.push(key);
    }
}
