//! Axum middleware for admission control.
//!
//! Resolves the client identity once, consults the DDoS block set, runs the
//! composed rate-limit check, and records the request trace for the
//! detectors. Applied after the auth interceptor so authenticated identity
//! and tier are available.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::header::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use tracing::{debug, warn};

use rift_common::Tier;

use crate::api::AppState;
use crate::auth::AuthUser;
use crate::ddos::BlockedError;

use super::{
    extract_client_ip, normalize_ip, ClientContext, EndpointClass, NormalizedIp, RateLimitError,
};

/// Sets the endpoint class for downstream admission middleware.
///
/// Apply before [`admission`] so the composed check uses the right budgets:
///
/// ```ignore
/// Router::new()
///     .route("/api/analytics/player", post(player_analytics))
///     .layer(from_fn_with_state(state.clone(), admission))
///     .layer(from_fn(with_class(EndpointClass::Analytics)));
/// ```
pub fn with_class(
    class: EndpointClass,
) -> impl Fn(Request, Next) -> std::pin::Pin<Box<dyn std::future::Future<Output = Response> + Send>>
       + Clone
       + Send
       + 'static {
    move |mut request: Request, next: Next| {
        request.extensions_mut().insert(class);
        Box::pin(async move { next.run(request).await })
    }
}

/// Resolves the client context from request extensions and headers.
///
/// Identification priority: authenticated user, API key header, client IP.
fn resolve_context(
    request: &Request,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
    trust_proxy: bool,
) -> ClientContext {
    let ip = normalize_ip(extract_client_ip(
        request.headers(),
        connect_info,
        trust_proxy,
    ));

    let (client_id, tier) = if let Some(auth) = request.extensions().get::<AuthUser>() {
        (format!("user:{}", auth.subject), auth.tier)
    } else if let Some(key) = request
        .headers()
        .get("X-Api-Key")
        .and_then(|v| v.to_str().ok())
    {
        (format!("api:{key}"), Tier::Free)
    } else {
        (ip.clone(), Tier::Free)
    };

    let region = request
        .headers()
        .get("X-Region")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("global")
        .to_string();

    ClientContext {
        client_id,
        tier,
        ip,
        region,
    }
}

/// Admission middleware: block set, then composed rate limit, then request
/// trace recording for the detectors.
#[tracing::instrument(skip_all)]
pub async fn admission(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let class = request
        .extensions()
        .get::<EndpointClass>()
        .copied()
        .unwrap_or(EndpointClass::Other);
    let trust_proxy = state.limiter.config().trust_proxy;
    let ctx = resolve_context(&request, connect_info.as_ref(), trust_proxy);

    request
        .extensions_mut()
        .insert(NormalizedIp(ctx.ip.clone()));

    // A blocked client is rejected before any counter is touched.
    if let Some(block) = state.ddos.check_blocked(&ctx.client_id, &ctx.ip).await {
        debug!(client = %ctx.client_id, attack = %block.attack_type.as_str(), "Blocked client rejected");
        return Err(BlockedError(block).into_response());
    }

    let ratio = state.adaptive.current_ratio().await;
    let decision = state
        .limiter
        .admit_request(&ctx, class, ratio)
        .await
        .map_err(IntoResponse::into_response)?;

    if decision.degraded {
        // Best-effort admissions count against the cache dependency.
        warn!(client = %ctx.client_id, "Admission degraded by cache failure");
        state.breaker.note_dependency_failure("cache").await;
    }

    if !decision.allowed {
        return Err(RateLimitError::LimitExceeded {
            decision,
            tier: ctx.tier,
        }
        .into_response());
    }

    // Trace admitted requests and fan the detectors out off the hot path.
    state.ddos.observe(&ctx.client_id, &ctx.ip, class);

    let tier = ctx.tier;
    request.extensions_mut().insert(ctx);

    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    if decision.limit > 0 {
        if let Ok(v) = HeaderValue::from_str(&decision.limit.to_string()) {
            headers.insert("X-RateLimit-Limit", v);
        }
        if let Ok(v) = HeaderValue::from_str(&decision.remaining.to_string()) {
            headers.insert("X-RateLimit-Remaining", v);
        }
        if let Ok(v) = HeaderValue::from_str(&decision.reset_at.to_string()) {
            headers.insert("X-RateLimit-Reset", v);
        }
    }
    if let Ok(v) = HeaderValue::from_str(tier.as_str()) {
        headers.insert("X-RateLimit-Tier", v);
    }

    Ok(response)
}
