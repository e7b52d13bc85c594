//! Match operations.
//!
//! `ProcessMatch`, `BatchProcessMatches`, `GetMatch`, `SearchMatches`,
//! `ExportMatches`, and `GetMatchTimeline`. Store reads run under the store
//! circuit; timeline reads proxy to the upstream provider.

use std::time::{Duration, Instant};

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};

use rift_common::MatchRecord;

use crate::circuit::{services, CircuitGate, CircuitState};
use crate::matches::{AnalysisOptions, MatchAnalysisRequest, MatchAnalysisResult, MatchSeriesAnalysis};
use crate::store::{MatchFilter, MatchStore};

use super::error::{match_status, ApiError};
use super::meta::ok_response;
use super::proxy::proxy_call;
use super::AppState;

fn store_of(state: &AppState) -> Result<&dyn MatchStore, ApiError> {
    state
        .store
        .as_deref()
        .ok_or_else(|| ApiError::Unavailable {
            service: "store".to_string(),
            message: "match store not configured".to_string(),
        })
}

/// `ProcessMatch`: per-match analysis pipeline over a posted record.
///
/// # Route
/// `POST /api/matches/process`
#[tracing::instrument(skip(state, request), fields(match_id = %request.record.match_id))]
pub async fn process_match(
    State(state): State<AppState>,
    Json(request): Json<MatchAnalysisRequest>,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    if request.puuid.trim().is_empty() {
        return Err(ApiError::InvalidArgument {
            field: "puuid".to_string(),
        });
    }

    let path = format!("/process/{}/{}", request.record.match_id, request.puuid);
    let analyzer = state.analyzer.clone();
    let (result, circuit_state) = super::analytics::run_compute(
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

/// Request for `BatchProcessMatches`.
#[derive(Debug, Deserialize)]
pub struct BatchMatchesRequest {
    pub puuid: String,
    pub records: Vec<MatchRecord>,
    /// Also compute the series-level view (default true).
    #[serde(default = "default_true")]
    pub include_series: bool,
}

const fn default_true() -> bool {
    true
}

/// Response for `BatchProcessMatches`.
#[derive(Debug, Serialize)]
pub struct BatchMatchesResponse {
    pub results: Vec<MatchAnalysisResult>,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series: Option<MatchSeriesAnalysis>,
}

/// `BatchProcessMatches`: per-match analysis across a set, plus the series
/// view (trends, streaks, patterns, recurring priorities).
///
/// # Route
/// `POST /api/matches/batch`
#[tracing::instrument(skip(state, request), fields(puuid = %request.puuid, records = request.records.len()))]
pub async fn batch_process_matches(
    State(state): State<AppState>,
    Json(request): Json<BatchMatchesRequest>,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    if request.puuid.trim().is_empty() {
        return Err(ApiError::InvalidArgument {
            field: "puuid".to_string(),
        });
    }
    if request.records.is_empty() {
        return Err(ApiError::InvalidArgument {
            field: "records".to_string(),
        });
    }

    let circuit_state = match state.breaker.gate(services::MATCHES).await {
        CircuitGate::Allow => CircuitState::Closed,
        CircuitGate::AllowTrial => CircuitState::HalfOpen,
        CircuitGate::Deny(record) => {
            return Err(ApiError::CircuitOpen {
                record,
                fallback: None,
            })
        }
    };

    let mut results = Vec::new();
    let mut failed = 0usize;
    for record in &request.records {
        match state.analyzer.analyze_match(&MatchAnalysisRequest {
            puuid: request.puuid.clone(),
            record: record.clone(),
            options: AnalysisOptions::default(),
        }) {
            Ok(result) => results.push(result),
            Err(_) => failed += 1,
        }
    }

    let series = if request.include_series && !results.is_empty() {
        state
            .analyzer
            .analyze_series(&request.puuid, &request.records)
            .ok()
    } else {
        None
    };

    state
        .breaker
        .record_success(services::MATCHES, started.elapsed().as_millis() as u64)
        .await;

    Ok(ok_response(
        BatchMatchesResponse {
            results,
            failed,
            series,
        },
        started,
        &state.config.api_version,
        circuit_state,
        "live",
    ))
}

/// Runs a store read under the store circuit and the request deadline.
async fn store_read<T, F>(
    state: &AppState,
    fallback_path: &str,
    read: F,
) -> Result<(T, CircuitState), ApiError>
where
    T: Serialize,
    F: std::future::Future<Output = Result<T, crate::store::StoreError>>,
{
    let started = Instant::now();
    let circuit_state = match state.breaker.gate(services::STORE).await {
        CircuitGate::Allow => CircuitState::Closed,
        CircuitGate::AllowTrial => CircuitState::HalfOpen,
        CircuitGate::Deny(record) => {
            let fallback = state.fallback.get(services::STORE, fallback_path).await;
            return Err(ApiError::CircuitOpen { record, fallback });
        }
    };

    let deadline = Duration::from_secs(state.config.request_deadline_secs);
    match tokio::time::timeout(deadline, read).await {
        Err(_) => {
            state
                .breaker
                .record_failure(services::STORE, 504, started.elapsed().as_millis() as u64)
                .await;
            Err(ApiError::DeadlineExceeded)
        }
        Ok(Ok(data)) => {
            state
                .breaker
                .record_success(services::STORE, started.elapsed().as_millis() as u64)
                .await;
            if let Ok(body) = serde_json::to_value(&data) {
                state.fallback.store(services::STORE, fallback_path, &body).await;
            }
            Ok((data, circuit_state))
        }
        Ok(Err(e)) => {
            state
                .breaker
                .record_failure(services::STORE, 503, started.elapsed().as_millis() as u64)
                .await;
            Err(e.into())
        }
    }
}

/// `GetMatch`: reads one stored match document.
///
/// # Route
/// `GET /api/matches/{match_id}`
#[tracing::instrument(skip(state))]
pub async fn get_match(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    let store = store_of(&state)?;

    let path = format!("/matches/{match_id}");
    let (record, circuit_state) =
        store_read(&state, &path, store.get_match(&match_id)).await?;

    let record = record.ok_or_else(|| ApiError::NotFound {
        entity: format!("match {match_id}"),
    })?;

    Ok(ok_response(
        record,
        started,
        &state.config.api_version,
        circuit_state,
        "live",
    ))
}

/// `SearchMatches`: filtered search over stored matches, newest first.
///
/// # Route
/// `GET /api/matches/search`
#[tracing::instrument(skip(state, filter))]
pub async fn search_matches(
    State(state): State<AppState>,
    Query(filter): Query<MatchFilter>,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    let store = store_of(&state)?;

    let path = format!(
        "/matches/search/{}",
        filter.puuid.as_deref().unwrap_or("all")
    );
    let (records, circuit_state) =
        store_read(&state, &path, store.search_matches(&filter)).await?;

    Ok(ok_response(
        records,
        started,
        &state.config.api_version,
        circuit_state,
        "live",
    ))
}

/// Query for `ExportMatches`.
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub puuid: String,
    pub limit: Option<u32>,
}

/// Response for `ExportMatches`.
#[derive(Debug, Serialize)]
pub struct ExportResponse {
    pub puuid: String,
    pub count: usize,
    pub matches: Vec<MatchRecord>,
}

/// `ExportMatches`: bulk export of one player's stored matches. Tightly
/// rate limited through the export scope.
///
/// # Route
/// `GET /api/matches/export`
#[tracing::instrument(skip(state))]
pub async fn export_matches(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let started = Instant::now();
    if query.puuid.trim().is_empty() {
        return Err(ApiError::InvalidArgument {
            field: "puuid".to_string(),
        });
    }
    let store = store_of(&state)?;

    let filter = MatchFilter {
        puuid: Some(query.puuid.clone()),
        limit: Some(query.limit.unwrap_or(100)),
        ..MatchFilter::default()
    };
    let path = format!("/matches/export/{}", query.puuid);
    let (matches, circuit_state) =
        store_read(&state, &path, store.search_matches(&filter)).await?;

    Ok(ok_response(
        ExportResponse {
            puuid: query.puuid,
            count: matches.len(),
            matches,
        },
        started,
        &state.config.api_version,
        circuit_state,
        "live",
    ))
}

/// `GetMatchTimeline`: proxies the per-match event timeline from the
/// upstream provider.
///
/// # Route
/// `GET /api/matches/{match_id}/timeline`
#[tracing::instrument(skip(state))]
pub async fn get_match_timeline(
    State(state): State<AppState>,
    Path(match_id): Path<String>,
) -> Result<Response, ApiError> {
    let provider = state.provider.clone().ok_or_else(|| ApiError::Unavailable {
        service: "upstream".to_string(),
        message: "upstream provider not configured".to_string(),
    })?;

    let path = format!("/timeline/{match_id}");
    proxy_call(&state, &path, provider.get_match_timeline(&match_id)).await
}
