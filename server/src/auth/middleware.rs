//! Authentication interceptor.
//!
//! Pass-through when auth is disabled. When enabled, a present bearer token
//! is validated and the identity injected into request extensions; requests
//! without a token continue anonymously (they are identified and budgeted by
//! IP downstream).

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use rift_common::Tier;

use crate::api::AppState;

use super::error::AuthError;
use super::jwt::validate_access_token;

/// Authenticated identity injected into request extensions.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Subject claim (user identifier).
    pub subject: String,
    /// Subscription tier from the token; free when unstated.
    pub tier: Tier,
}

/// Auth interceptor: validates a bearer token when present.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let Some(secret) = state.config.jwt_secret.as_deref().filter(|_| state.config.auth_enabled)
    else {
        return Ok(next.run(request).await);
    };

    let Some(auth_header) = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    else {
        // Anonymous callers continue with IP identity.
        return Ok(next.run(request).await);
    };

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?;
    let claims = validate_access_token(token, secret)?;

    let auth_user = AuthUser {
        subject: claims.sub,
        tier: claims
            .tier
            .as_deref()
            .map(Tier::parse)
            .unwrap_or_default(),
    };
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}
