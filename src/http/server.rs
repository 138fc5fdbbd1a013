//! HTTP server setup.
//!
//! # Responsibilities
//! - Create the Axum router with the service routes
//! - Wire up middleware (request id, tracing, panic recovery)
//! - Serve on a bound listener until shutdown

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::database::Ping;
use crate::http::request::{make_request_span, X_REQUEST_ID};
use crate::lifecycle::{Ready, ShutdownListener, StartupStatus, StatusSnapshot};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState<H> {
    pub config: Arc<AppConfig>,
    pub database: H,
    pub status: StartupStatus,
}

/// HTTP server for the service.
pub struct HttpServer {
    router: Router,
    bind_address: SocketAddr,
}

impl HttpServer {
    /// Build the server from fully constructed resources.
    pub fn new<H: Ping>(ready: Ready<H>, status: StartupStatus) -> Self {
        let bind_address = ready.config.server.bind_address();
        let state = AppState {
            config: ready.config,
            database: ready.database,
            status,
        };
        Self {
            router: build_router(state),
            bind_address,
        }
    }

    /// `0.0.0.0:<SERVER_PORT>`.
    pub fn bind_address(&self) -> SocketAddr {
        self.bind_address
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` fires, then drain.
    pub async fn run(self, listener: TcpListener, shutdown: ShutdownListener) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown.wait())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
pub fn build_router<H: Ping>(state: AppState<H>) -> Router {
    Router::new()
        .route("/healthCheck", get(health_check))
        .route("/status", get(startup_status::<H>))
        .route("/ready", get(readiness::<H>))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
                .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                .layer(CatchPanicLayer::new()),
        )
}

async fn health_check() -> Json<&'static str> {
    metrics::record_http_request("/healthCheck");
    Json("server is up")
}

async fn startup_status<H: Ping>(State(state): State<AppState<H>>) -> Json<StatusSnapshot> {
    metrics::record_http_request("/status");
    Json(StatusSnapshot::clone(&state.status.snapshot()))
}

#[derive(Debug, Serialize)]
struct Readiness {
    database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn readiness<H: Ping>(State(state): State<AppState<H>>) -> (StatusCode, Json<Readiness>) {
    metrics::record_http_request("/ready");
    match state.database.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(Readiness {
                database: "up",
                error: None,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness probe failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(Readiness {
                    database: "down",
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
