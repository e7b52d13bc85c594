//! Analytics operations.
//!
//! `GetPlayerAnalytics`, `GetMatchAnalytics`, `GetChampionAnalytics`,
//! `BatchProcessAnalytics`, and `CalculateSkillGap`. Every operation runs
//! under its service circuit; successful payloads refresh the fallback
//! cache so an open circuit can still answer.

use std::time::Instant;

use axum::extract::State;
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};

use rift_common::{MatchRecord, RankTier};

use crate::analytics::champions::compute_champion_performance;
use crate::analytics::{AnalyzeRequest, ChampionPerformance, CoreMetrics, PlayerAnalysis};
use crate::circuit::{services, CircuitGate, CircuitState};
use crate::matches::MatchAnalysisRequest;

use super::error::{analytics_status, match_status, ApiError};
use super::meta::ok_response;
use super::AppState;

/// Runs a synchronous compute under a service circuit: gate, outcome
/// recording, fallback upkeep. The compute itself is CPU-bound and runs
/// without yielding.
pub(super) async fn run_compute<T, E, F>(
    state: &AppState,
    service: &str,
    fallback_path: &str,
    status_of: fn(&E) -> u16,
    compute: F,
) -> Result<(T, CircuitState), ApiError>
where
    T: Serialize,
    E: Into<ApiError>,
    F: FnOnce() -> Result<T, E>,
{
    let started = Instant::now();
    let circuit_state = match state.breaker.gate(service).await {
        CircuitGate::Allow => CircuitState::Closed,
        CircuitGate::AllowTrial => CircuitState::HalfOpen,
        CircuitGate::Deny(record) => {
            let fallback = state.fallback.get(service, fallback_path).await;
            return Err(ApiError::CircuitOpen { record, fallback });
        }
    };

    let result = compute();
    let latency_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(data) => {
            state.breaker.record_success(service, latency_ms).await;
            if let Ok(body) = serde_json::to_value(&data) {
                state.fallback.store(service, fallback_path, &body).await;
            }
            Ok((data, circuit_state))
        }
        Err(e) => {
            state
                .breaker
                .record_outcome(service, status_of(&e), latency_ms)
                .await;
            Err(e.into())
        }
    }
}

/// `GetPlayerAnalytics`: full player analysis over the posted match set.
///
/// # Route
/// `POST /api/analytics/player`
#[tracing::instrument(skip(state, request), fields(puuid = %request.puuid))]
pub async fn get_player_analytics(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    if request.puuid.trim().is_empty() {
        return Err(ApiError::InvalidArgument {
            field: "puuid".to_string(),
        });
    }

    let path = format!("/player/{}", request.puuid);
    let engine = state.engine.clone();
    let (analysis, circuit_state): (PlayerAnalysis, _) = run_compute(
        &state,
        services::ANALYTICS,
        &path,
        analytics_status,
        move || engine.analyze_player(&request),
    )
    .await?;

    Ok(ok_response(
        analysis,
        started,
        &state.config.api_version,
        circuit_state,
        "live",
    ))
}

/// `GetMatchAnalytics`: single-match analysis with optional phase and
/// key-moment decomposition.
///
/// # Route
/// `POST /api/analytics/match`
#[tracing::instrument(skip(state, request), fields(match_id = %request.record.match_id))]
pub async fn get_match_analytics(
    State(state): State<AppState>,
    Json(request): Json<MatchAnalysisRequest>,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    if request.puuid.trim().is_empty() {
        return Err(ApiError::InvalidArgument {
            field: "puuid".to_string(),
        });
    }

    let path = format!("/match/{}/{}", request.record.match_id, request.puuid);
    let analyzer = state.analyzer.clone();
    let (result, circuit_state) = run_compute(
        &state,
        services::MATCHES,
        &path,
        match_status,
        move || analyzer.analyze_match(&request),
    )
    .await?;

    Ok(ok_response(
        result,
        started,
        &state.config.api_version,
        circuit_state,
        "live",
    ))
}

/// Request for `GetChampionAnalytics`.
#[derive(Debug, Deserialize)]
pub struct ChampionAnalyticsRequest {
    pub puuid: String,
    /// Restrict to one champion; absent returns the full breakdown.
    pub champion: Option<String>,
    pub matches: Vec<MatchRecord>,
}

/// `GetChampionAnalytics`: champion breakdown over the posted match set.
///
/// # Route
/// `POST /api/analytics/champion`
#[tracing::instrument(skip(state, request), fields(puuid = %request.puuid))]
pub async fn get_champion_analytics(
    State(state): State<AppState>,
    Json(request): Json<ChampionAnalyticsRequest>,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    if request.puuid.trim().is_empty() {
        return Err(ApiError::InvalidArgument {
            field: "puuid".to_string(),
        });
    }

    let path = format!("/champion/{}", request.puuid);
    let engine = state.engine.clone();
    let champion_filter = request.champion.clone();
    let (mut champions, circuit_state): (Vec<ChampionPerformance>, _) = run_compute(
        &state,
        services::ANALYTICS,
        &path,
        analytics_status,
        move || {
            Ok::<_, crate::analytics::AnalyticsError>(compute_champion_performance(
                &request.matches,
                &request.puuid,
                engine.config(),
            ))
        },
    )
    .await?;

    if let Some(champion) = champion_filter {
        champions.retain(|c| c.champion.eq_ignore_ascii_case(&champion));
        if champions.is_empty() {
            return Err(ApiError::NotFound {
                entity: format!("champion {champion} with enough games"),
            });
        }
    }

    Ok(ok_response(
        champions,
        started,
        &state.config.api_version,
        circuit_state,
        "live",
    ))
}

/// Request for `BatchProcessAnalytics`.
#[derive(Debug, Deserialize)]
pub struct BatchAnalyticsRequest {
    pub requests: Vec<AnalyzeRequest>,
}

/// One entry of a batch result.
#[derive(Debug, Serialize)]
pub struct BatchAnalyticsEntry {
    pub puuid: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<PlayerAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// `BatchProcessAnalytics`: runs several analyses in one call. Individual
/// failures do not fail the batch.
///
/// # Route
/// `POST /api/analytics/batch`
#[tracing::instrument(skip(state, request), fields(batch = request.requests.len()))]
pub async fn batch_process_analytics(
    State(state): State<AppState>,
    Json(request): Json<BatchAnalyticsRequest>,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    if request.requests.is_empty() {
        return Err(ApiError::InvalidArgument {
            field: "requests".to_string(),
        });
    }

    let circuit_state = match state.breaker.gate(services::ANALYTICS).await {
        CircuitGate::Allow => CircuitState::Closed,
        CircuitGate::AllowTrial => CircuitState::HalfOpen,
        CircuitGate::Deny(record) => {
            return Err(ApiError::CircuitOpen {
                record,
                fallback: None,
            })
        }
    };

    let entries: Vec<BatchAnalyticsEntry> = request
        .requests
        .iter()
        .map(|req| match state.engine.analyze_player(req) {
            Ok(analysis) => BatchAnalyticsEntry {
                puuid: req.puuid.clone(),
                ok: true,
                analysis: Some(analysis),
                error: None,
            },
            Err(e) => BatchAnalyticsEntry {
                puuid: req.puuid.clone(),
                ok: false,
                analysis: None,
                error: Some(e.to_string()),
            },
        })
        .collect();

    state
        .breaker
        .record_success(services::ANALYTICS, started.elapsed().as_millis() as u64)
        .await;

    Ok(ok_response(
        entries,
        started,
        &state.config.api_version,
        circuit_state,
        "live",
    ))
}

/// Request for `CalculateSkillGap`.
#[derive(Debug, Deserialize)]
pub struct SkillGapRequest {
    pub current: CoreMetrics,
    pub target_rank: String,
}

/// `CalculateSkillGap`: distance between current metrics and a target rank.
///
/// # Route
/// `POST /api/analytics/skill-gap`
#[tracing::instrument(skip(state, request), fields(target = %request.target_rank))]
pub async fn calculate_skill_gap(
    State(state): State<AppState>,
    Json(request): Json<SkillGapRequest>,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    let target = RankTier::parse(&request.target_rank).ok_or_else(|| {
        ApiError::InvalidArgument {
            field: "target_rank".to_string(),
        }
    })?;

    let gap = state.engine.calculate_skill_gap(&request.current, target);
    Ok(ok_response(
        gap,
        started,
        &state.config.api_version,
        CircuitState::Closed,
        "live",
    ))
}
