//! Upstream proxy operations.
//!
//! Summoner, match-history, ranked, mastery, and live-game getters, the
//! player sync operation, and rate-limit introspection. Every call runs
//! under the upstream circuit with the request deadline; successful bodies
//! refresh the fallback cache.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{Path, Query, State};
use axum::response::Response;
use serde::{Deserialize, Serialize};

use rift_common::MatchRecord;

use crate::circuit::{services, CircuitGate, CircuitState};
use crate::upstream::{GameDataProvider, UpstreamError};

use super::error::ApiError;
use super::meta::ok_response;
use super::AppState;

fn provider_of(state: &AppState) -> Result<Arc<dyn GameDataProvider>, ApiError> {
    state
        .provider
        .clone()
        .ok_or_else(|| ApiError::Unavailable {
            service: "upstream".to_string(),
            message: "upstream provider not configured".to_string(),
        })
}

/// Runs an upstream call under the upstream circuit and the request
/// deadline, recording the outcome and refreshing the fallback cache.
pub(super) async fn proxy_call<T, F>(
    state: &AppState,
    fallback_path: &str,
    call: F,
) -> Result<Response, ApiError>
where
    T: Serialize,
    F: Future<Output = Result<T, UpstreamError>>,
{
    let started = Instant::now();
    let circuit_state = match state.breaker.gate(services::UPSTREAM).await {
        CircuitGate::Allow => CircuitState::Closed,
        CircuitGate::AllowTrial => CircuitState::HalfOpen,
        CircuitGate::Deny(record) => {
            let fallback = state.fallback.get(services::UPSTREAM, fallback_path).await;
            return Err(ApiError::CircuitOpen { record, fallback });
        }
    };

    let deadline = Duration::from_secs(state.config.request_deadline_secs);
    match tokio::time::timeout(deadline, call).await {
        Err(_) => {
            state
                .breaker
                .record_failure(
                    services::UPSTREAM,
                    504,
                    started.elapsed().as_millis() as u64,
                )
                .await;
            Err(ApiError::DeadlineExceeded)
        }
        Ok(Ok(data)) => {
            state
                .breaker
                .record_success(services::UPSTREAM, started.elapsed().as_millis() as u64)
                .await;
            if let Ok(body) = serde_json::to_value(&data) {
                state
                    .fallback
                    .store(services::UPSTREAM, fallback_path, &body)
                    .await;
            }
            let mut response = ok_response(
                data,
                started,
                &state.config.api_version,
                circuit_state,
                "live",
            );
            if let Some(region) = state.config.upstream_region.as_deref() {
                if let Ok(v) = axum::http::header::HeaderValue::from_str(region) {
                    response.headers_mut().insert("X-Upstream-Region", v);
                }
            }
            Ok(response)
        }
        Ok(Err(e)) => {
            state
                .breaker
                .record_outcome(
                    services::UPSTREAM,
                    e.status_code(),
                    started.elapsed().as_millis() as u64,
                )
                .await;
            Err(e.into())
        }
    }
}

/// `GetSummonerByName`.
///
/// # Route
/// `GET /api/riot/summoner/by-name/{name}`
#[tracing::instrument(skip(state))]
pub async fn get_summoner_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let provider = provider_of(&state)?;
    proxy_call(
        &state,
        &format!("/summoner/by-name/{name}"),
        provider.get_summoner_by_name(&name),
    )
    .await
}

/// `GetSummonerByPUUID`.
///
/// # Route
/// `GET /api/riot/summoner/by-puuid/{puuid}`
#[tracing::instrument(skip(state))]
pub async fn get_summoner_by_puuid(
    State(state): State<AppState>,
    Path(puuid): Path<String>,
) -> Result<Response, ApiError> {
    let provider = provider_of(&state)?;
    proxy_call(
        &state,
        &format!("/summoner/by-puuid/{puuid}"),
        provider.get_summoner_by_puuid(&puuid),
    )
    .await
}

/// `GetSummonerByID`.
///
/// # Route
/// `GET /api/riot/summoner/{id}`
#[tracing::instrument(skip(state))]
pub async fn get_summoner_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let provider = provider_of(&state)?;
    proxy_call(
        &state,
        &format!("/summoner/by-id/{id}"),
        provider.get_summoner_by_id(&id),
    )
    .await
}

/// Query for `GetMatchHistory`.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub count: Option<usize>,
}

/// `GetMatchHistory`: recent match identifiers for a player.
///
/// # Route
/// `GET /api/riot/matches/{puuid}`
#[tracing::instrument(skip(state))]
pub async fn get_match_history(
    State(state): State<AppState>,
    Path(puuid): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Response, ApiError> {
    let provider = provider_of(&state)?;
    let count = query.count.unwrap_or(20).min(100);
    proxy_call(
        &state,
        &format!("/history/{puuid}"),
        provider.get_match_history(&puuid, count),
    )
    .await
}

/// `GetRankedStats`.
///
/// # Route
/// `GET /api/riot/ranked/{summoner_id}`
#[tracing::instrument(skip(state))]
pub async fn get_ranked_stats(
    State(state): State<AppState>,
    Path(summoner_id): Path<String>,
) -> Result<Response, ApiError> {
    let provider = provider_of(&state)?;
    proxy_call(
        &state,
        &format!("/ranked/{summoner_id}"),
        provider.get_ranked_stats(&summoner_id),
    )
    .await
}

/// `GetChampionMastery`.
///
/// # Route
/// `GET /api/riot/mastery/{summoner_id}`
#[tracing::instrument(skip(state))]
pub async fn get_champion_mastery(
    State(state): State<AppState>,
    Path(summoner_id): Path<String>,
) -> Result<Response, ApiError> {
    let provider = provider_of(&state)?;
    proxy_call(
        &state,
        &format!("/mastery/{summoner_id}"),
        provider.get_champion_mastery(&summoner_id),
    )
    .await
}

/// `GetCurrentGame`: live game lookup.
///
/// # Route
/// `GET /api/riot/live/{summoner_id}`
#[tracing::instrument(skip(state))]
pub async fn get_current_game(
    State(state): State<AppState>,
    Path(summoner_id): Path<String>,
) -> Result<Response, ApiError> {
    let provider = provider_of(&state)?;
    proxy_call(
        &state,
        &format!("/live/{summoner_id}"),
        provider.get_current_game(&summoner_id),
    )
    .await
}

/// Query for `SyncPlayer`.
#[derive(Debug, Deserialize)]
pub struct SyncQuery {
    pub count: Option<usize>,
}

/// Response for `SyncPlayer`.
#[derive(Debug, Serialize)]
pub struct SyncResponse {
    pub puuid: String,
    pub fetched: usize,
    pub skipped: usize,
    pub matches: Vec<MatchRecord>,
}

/// `SyncPlayer`: pulls the player's recent match history and the match
/// records behind it in one call. Individual match fetch failures are
/// skipped and counted.
///
/// # Route
/// `POST /api/riot/sync/{puuid}`
#[tracing::instrument(skip(state))]
pub async fn sync_player(
    State(state): State<AppState>,
    Path(puuid): Path<String>,
    Query(query): Query<SyncQuery>,
) -> Result<Response, ApiError> {
    let provider = provider_of(&state)?;
    let count = query.count.unwrap_or(20).min(50);
    let fetch_provider = provider.clone();

    proxy_call(&state, &format!("/sync/{puuid}"), async move {
        let ids = fetch_provider.get_match_history(&puuid, count).await?;
        let mut matches = Vec::new();
        let mut skipped = 0usize;
        for id in &ids {
            match fetch_provider.get_match(id).await {
                Ok(record) => matches.push(record),
                Err(UpstreamError::RateLimited { retry_after_secs }) => {
                    return Err(UpstreamError::RateLimited { retry_after_secs });
                }
                Err(_) => skipped += 1,
            }
        }
        Ok(SyncResponse {
            puuid,
            fetched: matches.len(),
            skipped,
            matches,
        })
    })
    .await
}

/// Own-side budget summary included in the introspection response.
#[derive(Debug, Serialize)]
pub struct OwnLimits {
    pub tier: &'static str,
    pub tier_limit: u32,
    pub analytics_limit: u32,
    pub proxy_limit: u32,
    pub window_secs: u64,
}

/// `GetRateLimitInfo`: rate-limit introspection for the calling client and
/// the upstream provider.
///
/// # Route
/// `GET /api/riot/rate-limit`
#[tracing::instrument(skip(state, ctx))]
pub async fn get_rate_limit_info(
    State(state): State<AppState>,
    ctx: Option<axum::Extension<crate::ratelimit::ClientContext>>,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    let tier = ctx.map(|c| c.0.tier).unwrap_or_default();
    let config = state.limiter.config();
    let own = OwnLimits {
        tier: tier.as_str(),
        tier_limit: config.tier_limit(tier).requests,
        analytics_limit: config.analytics_limit(tier).requests,
        proxy_limit: config.proxy_limit(tier).requests,
        window_secs: config.tier_limit(tier).window_secs,
    };

    let upstream = match state.provider.as_ref() {
        Some(provider) => provider.get_rate_limit_info().await.ok(),
        None => None,
    };

    Ok(ok_response(
        serde_json::json!({
            "client": own,
            "upstream": upstream,
        }),
        started,
        &state.config.api_version,
        CircuitState::Closed,
        "live",
    ))
}
