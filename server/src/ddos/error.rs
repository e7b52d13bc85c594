//! Block rejection responses.

use axum::http::header::HeaderValue;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::BlockRecord;

/// Rejection for a client present in the block set.
#[derive(Debug)]
pub struct BlockedError(pub BlockRecord);

/// JSON response body for blocked clients.
#[derive(Serialize)]
pub struct BlockedResponse {
    /// Error code identifier.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
    /// Detected attack pattern.
    pub attack_type: &'static str,
    /// Severity at detection time.
    pub severity: &'static str,
    /// Seconds until the block expires.
    pub retry_after: u64,
}

impl IntoResponse for BlockedError {
    fn into_response(self) -> Response {
        let record = self.0;
        let retry_after = (record.blocked_until - chrono::Utc::now().timestamp()).max(0) as u64;
        let body = BlockedResponse {
            error: "blocked",
            message: format!(
                "Request blocked: {} attack detected. Wait {retry_after} seconds.",
                record.attack_type.as_str()
            ),
            attack_type: record.attack_type.as_str(),
            severity: record.severity.as_str(),
            retry_after,
        };
        let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
        if let Ok(v) = HeaderValue::from_str(&retry_after.to_string()) {
            response.headers_mut().insert("Retry-After", v);
        }
        response
    }
}
