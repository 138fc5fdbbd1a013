//! Request identification and tracing.
//!
//! # Responsibilities
//! - Name the request-id header
//! - Build the per-request tracing span
//!
//! # Design Decisions
//! - The id is set before the trace layer runs, so every span carries it
//! - Client-supplied ids are kept, not replaced

use axum::body::Body;
use axum::http::{HeaderName, Request};
use tracing::Span;

/// Header carrying the request id in both directions.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Span for one request: method, path and request id.
pub fn make_request_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}

