//! Startup bootstrap for a small database-backed HTTP service.
//!
//! Configuration and the database connection are each constructed lazily,
//! exactly once, and shared; the server starts only when both exist.

pub mod cli;
pub mod config;
pub mod database;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod singleton;

pub use config::{AppConfig, ConfigProvider};
pub use database::{ConnectionProvider, PostgresConnector};
pub use http::HttpServer;
pub use lifecycle::{Bootstrap, Shutdown};
pub use singleton::LazySingleton;
