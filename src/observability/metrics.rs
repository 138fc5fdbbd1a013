//! Metrics collection and exposition.
//!
//! # Metrics
//! - `singleton_initializations_total` (counter): factory runs by resource, outcome
//! - `singleton_initialization_seconds` (histogram): factory latency by resource
//! - `startup_stage_seconds` (histogram): bootstrap stage latency by stage, outcome
//! - `startup_phase` (gauge): 0=idle, 1=config, 2=connection, 3=ready, 4=failed
//! - `http_requests_total` (counter): health/status requests by route

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

fn outcome_label(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failure"
    }
}

pub fn record_singleton_init(resource: &'static str, success: bool, elapsed: Duration) {
    metrics::counter!(
        "singleton_initializations_total",
        "resource" => resource,
        "outcome" => outcome_label(success)
    )
    .increment(1);
    metrics::histogram!("singleton_initialization_seconds", "resource" => resource)
        .record(elapsed.as_secs_f64());
}

pub fn record_startup_stage(stage: &'static str, success: bool, elapsed: Duration) {
    metrics::histogram!(
        "startup_stage_seconds",
        "stage" => stage,
        "outcome" => outcome_label(success)
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_startup_phase(code: u8) {
    metrics::gauge!("startup_phase").set(code as f64);
}

pub fn record_http_request(route: &'static str) {
    metrics::counter!("http_requests_total", "route" => route).increment(1);
}
