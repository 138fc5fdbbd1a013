//! app-bootstrap
//!
//! # Architecture Overview
//!
//! ```text
//!   .env / process env
//!          │
//!          ▼
//!   ┌──────────────┐    ┌───────────────────┐    ┌──────────────┐
//!   │ConfigProvider│───▶│ConnectionProvider │───▶│  HttpServer  │
//!   │ (singleton)  │    │   (singleton)     │    │ /healthCheck │
//!   └──────────────┘    └───────────────────┘    └──────────────┘
//!          │                     │                      ▲
//!          └──── Bootstrap ──────┘                      │
//!                   │  status ──────────────────────────┘
//!                   ▼
//!             fail → log + exit(1)
//! ```

use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;

use app_bootstrap::cli::Cli;
use app_bootstrap::lifecycle::signals;
use app_bootstrap::observability::{logging, metrics};
use app_bootstrap::{Bootstrap, ConfigProvider, ConnectionProvider, HttpServer, PostgresConnector, Shutdown};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "app-bootstrap starting");

    if let Some(addr) = cli.metrics_address {
        if let Err(e) = metrics::init_metrics(addr) {
            tracing::error!(metrics_address = %addr, error = %e, "Failed to install metrics exporter");
        }
    }

    let bootstrap = Bootstrap::new(
        ConfigProvider::new(cli.env_source()),
        ConnectionProvider::new(PostgresConnector::new()),
    );
    let status = bootstrap.status();

    let ready = match bootstrap.run().await {
        Ok(ready) => ready,
        Err(failure) => {
            tracing::error!(stage = %failure.stage, error = %failure.error, "Startup failed");
            return ExitCode::FAILURE;
        }
    };
    let pool = ready.database.clone();

    let server = HttpServer::new(ready, status);
    let listener = match TcpListener::bind(server.bind_address()).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(address = %server.bind_address(), error = %e, "Failed to bind listener");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = Shutdown::new();
    let on_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        signals::wait_for_termination().await;
        shutdown.trigger();
    });

    let served = server.run(listener, on_shutdown).await;
    pool.close().await;

    match served {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "HTTP server failed");
            ExitCode::FAILURE
        }
    }
}
