//! Latency interceptor.
//!
//! Tracks in-flight and completed requests for the adaptive load sampler
//! and flags responses that blow the latency budget. Request logging itself
//! is the trace layer's job; this interceptor only measures.

use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::header::HeaderValue,
    middleware::Next,
    response::Response,
};
use tracing::warn;

use super::AppState;

/// Latency interceptor. Responses over the configured budget get a
/// structured warning and an `X-Slow-Request` header but are still
/// returned.
pub async fn track_latency(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    state.load_metrics.request_started();
    let mut response = next.run(request).await;

    let latency_ms = started.elapsed().as_millis() as u64;
    let status = response.status();
    state
        .load_metrics
        .request_finished(latency_ms, status.is_server_error());

    if latency_ms > state.config.slow_request_threshold_ms {
        warn!(
            method = %method,
            path = %path,
            latency_ms,
            status = status.as_u16(),
            "Request exceeded latency budget"
        );
        response
            .headers_mut()
            .insert("X-Slow-Request", HeaderValue::from_static("true"));
    }

    response
}
