//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGINT (Ctrl+C) or SIGTERM
//! - Let the caller translate the signal into a shutdown trigger

use tokio::signal;

/// Resolve when the process is asked to terminate.
///
/// A handler that cannot be installed is logged and never fires.
pub async fn wait_for_termination() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => tracing::info!(signal = "SIGINT", "Shutdown signal received"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!(signal = "SIGTERM", "Shutdown signal received");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
