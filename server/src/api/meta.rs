//! Response envelope and metadata block.

use std::time::Instant;

use axum::http::header::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::circuit::CircuitState;

/// Metadata block attached to every operation response.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseMeta {
    /// When the response was generated.
    pub generated_at: DateTime<Utc>,
    /// Server-side processing latency.
    pub processing_ms: u64,
    /// `live`, `cached`, or `fallback`.
    pub cache_status: &'static str,
    /// API version label.
    pub api_version: String,
}

/// Standard operation envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub data: T,
    pub meta: ResponseMeta,
}

/// Builds the enveloped success response with the circuit-state header.
pub fn ok_response<T: Serialize>(
    data: T,
    started: Instant,
    api_version: &str,
    circuit_state: CircuitState,
    cache_status: &'static str,
) -> Response {
    let envelope = ApiResponse {
        data,
        meta: ResponseMeta {
            generated_at: Utc::now(),
            processing_ms: started.elapsed().as_millis() as u64,
            cache_status,
            api_version: api_version.to_string(),
        },
    };
    let mut response = Json(envelope).into_response();
    if let Ok(v) = HeaderValue::from_str(circuit_state.as_str()) {
        response.headers_mut().insert("X-Circuit-State", v);
    }
    response
}
