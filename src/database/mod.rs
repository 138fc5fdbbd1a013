//! Database connection subsystem.
//!
//! # Data Flow
//! ```text
//! AppConfig.database
//!     → descriptor.rs (structured, credential-redacting descriptor)
//!     → connector.rs (driver open + reachability probe)
//!     → provider.rs (constructed once, shared handle)
//!     → injected into the HTTP server
//! ```
//!
//! # Design Decisions
//! - The descriptor is never rendered as a DSN string
//! - Open failure is fatal; there is no retry or backoff
//! - Pool sizing is left to driver defaults

pub mod connector;
pub mod descriptor;
pub mod health;
pub mod provider;

pub use connector::{Connector, PostgresConnector};
pub use descriptor::ConnectionDescriptor;
pub use health::{check_health, Ping};
pub use provider::{ConnectError, ConnectionProvider};

// Re-export the driver handle for convenience
pub use sqlx::PgPool;
