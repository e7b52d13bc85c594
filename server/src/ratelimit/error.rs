//! Rate limiting error types for HTTP responses.

use axum::http::header::HeaderValue;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rift_common::Tier;
use serde::Serialize;

use super::AdmissionDecision;

/// Errors that can occur during admission checks.
#[derive(Debug)]
pub enum RateLimitError {
    /// The cache is unavailable and fail-open is disabled.
    CacheUnavailable,
    /// Request exceeded a rate limit.
    LimitExceeded {
        decision: AdmissionDecision,
        tier: Tier,
    },
}

/// JSON response body for rate limit denials.
#[derive(Serialize)]
pub struct RateLimitErrorResponse {
    /// Error code identifier.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
    /// Seconds to wait before retrying.
    pub retry_after: u64,
    /// Maximum requests allowed in the window.
    pub limit: u32,
    /// Remaining requests (always 0 when rate limited).
    pub remaining: u32,
    /// Unix timestamp when the window resets.
    pub reset_at: u64,
    /// Tier the budget was computed for.
    pub tier: &'static str,
    /// Suggested next step for capped clients.
    pub upgrade_hint: Option<&'static str>,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        match self {
            Self::CacheUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({"error": "service_unavailable"})),
            )
                .into_response(),
            Self::LimitExceeded { decision, tier } => {
                let upgrade_hint = match tier {
                    Tier::Enterprise => None,
                    _ => Some("Higher request budgets are available on upgraded tiers."),
                };
                let body = RateLimitErrorResponse {
                    error: "rate_limited",
                    message: format!(
                        "Too many requests. Wait {} seconds.",
                        decision.retry_after
                    ),
                    retry_after: decision.retry_after,
                    limit: decision.limit,
                    remaining: 0,
                    reset_at: decision.reset_at,
                    tier: tier.as_str(),
                    upgrade_hint,
                };
                let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
                let headers = response.headers_mut();
                if let Ok(v) = HeaderValue::from_str(&decision.retry_after.to_string()) {
                    headers.insert("Retry-After", v);
                }
                if let Ok(v) = HeaderValue::from_str(&decision.limit.to_string()) {
                    headers.insert("X-RateLimit-Limit", v);
                }
                headers.insert("X-RateLimit-Remaining", HeaderValue::from_static("0"));
                if let Ok(v) = HeaderValue::from_str(&decision.reset_at.to_string()) {
                    headers.insert("X-RateLimit-Reset", v);
                }
                if let Ok(v) = HeaderValue::from_str(tier.as_str()) {
                    headers.insert("X-RateLimit-Tier", v);
                }
                response
            }
        }
    }
}
