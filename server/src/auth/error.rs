//! Authentication error types.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

/// Errors from token validation.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Authorization header is malformed")]
    InvalidAuthHeader,

    #[error("Token is invalid")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        let (code, message) = match &self {
            Self::InvalidAuthHeader => ("invalid_auth_header", "Authorization header is malformed"),
            Self::InvalidToken => ("invalid_token", "Token is invalid"),
            Self::ExpiredToken => ("expired_token", "Token has expired"),
        };
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": code,
                "message": message,
            })),
        )
            .into_response()
    }
}
