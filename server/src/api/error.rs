//! API error taxonomy.
//!
//! Every operation maps its failures into this taxonomy; engines keep their
//! own error types and convert at the boundary.

use axum::http::header::HeaderValue;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::analytics::AnalyticsError;
use crate::circuit::{CircuitRecord, FallbackCache, FallbackResponse};
use crate::matches::MatchAnalysisError;
use crate::store::StoreError;
use crate::upstream::UpstreamError;

/// Error surface of the RPC operations.
#[derive(Debug)]
pub enum ApiError {
    /// A required field is missing or invalid; names the field.
    InvalidArgument { field: String },
    /// Fewer matches than the analysis minimum.
    InsufficientData { message: String },
    /// Entity absent in upstream or store.
    NotFound { entity: String },
    /// Authentication required.
    Unauthenticated,
    /// Authenticated but not allowed.
    PermissionDenied,
    /// Admission denied downstream of our own limiter (upstream throttle).
    RateLimited { retry_after_secs: u64 },
    /// Circuit open for a service; carries the circuit document and any
    /// cached fallback.
    CircuitOpen {
        record: CircuitRecord,
        fallback: Option<FallbackResponse>,
    },
    /// The per-request deadline elapsed.
    DeadlineExceeded,
    /// A dependency is down or not configured.
    Unavailable { service: String, message: String },
    /// Unexpected failure; logged at error level by the handler.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::InvalidArgument { field } => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": "invalid_argument",
                    "field": field,
                    "message": format!("missing or invalid field `{field}`"),
                })),
            )
                .into_response(),
            Self::InsufficientData { message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({
                    "error": "insufficient_data",
                    "message": message,
                })),
            )
                .into_response(),
            Self::NotFound { entity } => (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "not_found",
                    "message": format!("{entity} not found"),
                })),
            )
                .into_response(),
            Self::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "unauthenticated", "message": "authentication required"})),
            )
                .into_response(),
            Self::PermissionDenied => (
                StatusCode::FORBIDDEN,
                Json(json!({"error": "permission_denied", "message": "insufficient permissions"})),
            )
                .into_response(),
            Self::RateLimited { retry_after_secs } => {
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({
                        "error": "rate_limited",
                        "message": format!("rate limited, retry after {retry_after_secs}s"),
                        "retry_after": retry_after_secs,
                    })),
                )
                    .into_response();
                if let Ok(v) = HeaderValue::from_str(&retry_after_secs.to_string()) {
                    response.headers_mut().insert("Retry-After", v);
                }
                response
            }
            Self::CircuitOpen { record, fallback } => {
                let retry_after = record
                    .next_retry_at
                    .map(|at| (at - chrono::Utc::now().timestamp()).max(0) as u64);
                let fallback_json = fallback.as_ref().map_or_else(
                    || FallbackCache::degraded_default(&record.service),
                    |f| json!({"data": f.body, "stale": f.stale, "age_secs": f.age_secs}),
                );
                let mut response = (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({
                        "error": "circuit_open",
                        "service": record.service,
                        "state": record.state.as_str(),
                        "failure_count": record.failure_count,
                        "error_rate": record.error_rate,
                        "next_retry_at": record.next_retry_at,
                        "fallback": fallback_json,
                    })),
                )
                    .into_response();

                let headers = response.headers_mut();
                if let Ok(v) = HeaderValue::from_str(record.state.as_str()) {
                    headers.insert("X-Circuit-State", v);
                }
                if let Some(retry_after) = retry_after {
                    if let Ok(v) = HeaderValue::from_str(&retry_after.to_string()) {
                        headers.insert("Retry-After", v);
                    }
                }
                if let Some(f) = &fallback {
                    headers.insert("X-Fallback", HeaderValue::from_static("cached"));
                    if let Ok(v) = HeaderValue::from_str(&f.age_secs.to_string()) {
                        headers.insert("X-Cache-Age", v);
                    }
                }
                response
            }
            Self::DeadlineExceeded => (
                StatusCode::GATEWAY_TIMEOUT,
                Json(json!({"error": "deadline_exceeded", "message": "request deadline elapsed"})),
            )
                .into_response(),
            Self::Unavailable { service, message } => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "unavailable",
                    "service": service,
                    "message": message,
                })),
            )
                .into_response(),
            Self::Internal(message) => {
                tracing::error!(error = %message, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "internal", "message": "internal error"})),
                )
                    .into_response()
            }
        }
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(e: AnalyticsError) -> Self {
        match e {
            AnalyticsError::InvalidRequest(message) => Self::InvalidArgument { field: message },
            AnalyticsError::InsufficientData(message) => Self::InsufficientData { message },
        }
    }
}

impl From<MatchAnalysisError> for ApiError {
    fn from(e: MatchAnalysisError) -> Self {
        match e {
            MatchAnalysisError::InvalidRequest(message) => Self::InvalidArgument { field: message },
            MatchAnalysisError::ParticipantNotFound { match_id, puuid } => Self::NotFound {
                entity: format!("participant {puuid} in match {match_id}"),
            },
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::NotFound => Self::NotFound {
                entity: "upstream entity".to_string(),
            },
            UpstreamError::RateLimited { retry_after_secs } => {
                Self::RateLimited { retry_after_secs }
            }
            UpstreamError::Unavailable(message) => Self::Unavailable {
                service: "upstream".to_string(),
                message,
            },
            UpstreamError::Decode(message) => Self::Internal(message),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Database(err) => Self::Unavailable {
                service: "store".to_string(),
                message: err.to_string(),
            },
            StoreError::Decode(message) => Self::Internal(message),
        }
    }
}

/// `AnalyticsError` status codes for circuit accounting: validation and
/// data-volume failures are client errors, never circuit failures.
#[must_use]
pub const fn analytics_status(e: &AnalyticsError) -> u16 {
    match e {
        AnalyticsError::InvalidRequest(_) => 400,
        AnalyticsError::InsufficientData(_) => 422,
    }
}

/// `MatchAnalysisError` status codes for circuit accounting.
#[must_use]
pub const fn match_status(e: &MatchAnalysisError) -> u16 {
    match e {
        MatchAnalysisError::InvalidRequest(_) => 400,
        MatchAnalysisError::ParticipantNotFound { .. } => 404,
    }
}
