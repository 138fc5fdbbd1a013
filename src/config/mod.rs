//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! environment source (.env file / process env / static map)
//!     → source.rs (read key/value pairs)
//!     → loader.rs (decode into typed values)
//!     → validation.rs (required field checks)
//!     → AppConfig (validated, immutable)
//!     → provider.rs (constructed once, shared via Arc)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - Decoding (types) is separate from validation (presence)
//! - Validation reports every missing field, not just the first
//! - Credentials are held as secrets and never appear in Debug output

pub mod loader;
pub mod provider;
pub mod schema;
pub mod source;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use provider::ConfigProvider;
pub use schema::{keys, AppConfig, DatabaseSettings, ServerSettings, SslMode};
pub use source::{DotenvFile, EnvSource, LayeredSource, ProcessEnv, StaticSource};
