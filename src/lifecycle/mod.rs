//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Idle → ConfigLoading → ConnectionOpening → Ready
//!                  │                 │
//!                  └──────┬──────────┘
//!                         ▼
//!                       Failed (stage recorded, nothing started)
//!
//! Shutdown (shutdown.rs):
//!     trigger → every listener resolves → server drains → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then the connection, then the server
//! - Fail fast: any startup error is fatal, the server is never started
//! - The startup status is published lock-free for the HTTP server

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownListener};
pub use startup::{
    Bootstrap, Ready, Stage, StageError, StartupFailure, StartupPhase, StartupStatus,
    StatusSnapshot,
};
