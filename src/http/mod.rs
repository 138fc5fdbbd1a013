//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → request id assigned (or kept) and span opened (request.rs)
//!     → server.rs routes:
//!         GET /healthCheck → "server is up"
//!         GET /status      → startup status snapshot
//!         GET /ready       → database round trip
//!     → request id echoed on the response
//! ```

pub mod request;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{build_router, AppState, HttpServer};
