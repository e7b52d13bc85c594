//! Streaming operations over WebSocket.
//!
//! `StreamAnalytics` and `StreamLiveMatch` are cooperative loops: every
//! update interval an event is computed and sent; caller cancellation and
//! transport errors terminate the stream cleanly on the next tick or
//! sooner. No server-side retries; clients reconnect.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::response::Response;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analytics::metrics::compute_core_metrics;
use crate::analytics::CoreMetrics;
use crate::store::MatchFilter;
use crate::upstream::{CurrentGame, UpstreamError};

use super::AppState;

/// Server-to-client stream events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Periodic analytics refresh for a player.
    AnalyticsUpdate {
        puuid: String,
        generated_at: DateTime<Utc>,
        matches_analyzed: usize,
        core: Option<CoreMetrics>,
    },
    /// Periodic live-game snapshot.
    LiveMatchUpdate {
        summoner_id: String,
        generated_at: DateTime<Utc>,
        in_game: bool,
        game: Option<CurrentGame>,
    },
    /// Stream-level error; the stream stays open unless transport fails.
    Error { code: String, message: String },
}

/// Query parameters for `StreamAnalytics`.
#[derive(Debug, Deserialize)]
pub struct AnalyticsStreamQuery {
    pub puuid: String,
}

/// `StreamAnalytics`: emits an analytics refresh every update interval
/// until the caller cancels.
///
/// # Route
/// `GET /ws/analytics?puuid=...`
pub async fn stream_analytics(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(query): Query<AnalyticsStreamQuery>,
) -> Response {
    ws.on_upgrade(move |socket| analytics_loop(state, socket, query.puuid))
}

async fn analytics_loop(state: AppState, mut socket: WebSocket, puuid: String) {
    let mut interval = tokio::time::interval(Duration::from_secs(
        state.config.stream_update_interval_secs,
    ));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let event = analytics_event(&state, &puuid).await;
                if !send_event(&mut socket, &event).await {
                    break;
                }
            }
            incoming = socket.recv() => {
                if !still_open(incoming) {
                    break;
                }
            }
        }
    }
    debug!(puuid = %puuid, "Analytics stream closed");
}

async fn analytics_event(state: &AppState, puuid: &str) -> StreamEvent {
    let Some(store) = state.store.as_deref() else {
        return StreamEvent::Error {
            code: "store_unavailable".to_string(),
            message: "match store not configured".to_string(),
        };
    };

    let filter = MatchFilter {
        puuid: Some(puuid.to_string()),
        limit: Some(20),
        ..MatchFilter::default()
    };
    match store.search_matches(&filter).await {
        Ok(matches) => {
            let core = compute_core_metrics(&matches, puuid);
            StreamEvent::AnalyticsUpdate {
                puuid: puuid.to_string(),
                generated_at: state.clock.now(),
                matches_analyzed: core.as_ref().map_or(0, |c| c.games),
                core,
            }
        }
        Err(e) => StreamEvent::Error {
            code: "store_error".to_string(),
            message: e.to_string(),
        },
    }
}

/// `StreamLiveMatch`: emits a live-game snapshot every update interval
/// until the caller cancels.
///
/// # Route
/// `GET /ws/live/{summoner_id}`
pub async fn stream_live_match(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(summoner_id): Path<String>,
) -> Response {
    ws.on_upgrade(move |socket| live_match_loop(state, socket, summoner_id))
}

async fn live_match_loop(state: AppState, mut socket: WebSocket, summoner_id: String) {
    let mut interval = tokio::time::interval(Duration::from_secs(
        state.config.stream_update_interval_secs,
    ));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let event = live_match_event(&state, &summoner_id).await;
                if !send_event(&mut socket, &event).await {
                    break;
                }
            }
            incoming = socket.recv() => {
                if !still_open(incoming) {
                    break;
                }
            }
        }
    }
    debug!(summoner_id = %summoner_id, "Live match stream closed");
}

async fn live_match_event(state: &AppState, summoner_id: &str) -> StreamEvent {
    let Some(provider) = state.provider.as_deref() else {
        return StreamEvent::Error {
            code: "upstream_unavailable".to_string(),
            message: "upstream provider not configured".to_string(),
        };
    };

    match provider.get_current_game(summoner_id).await {
        Ok(game) => StreamEvent::LiveMatchUpdate {
            summoner_id: summoner_id.to_string(),
            generated_at: state.clock.now(),
            in_game: true,
            game: Some(game),
        },
        Err(UpstreamError::NotFound) => StreamEvent::LiveMatchUpdate {
            summoner_id: summoner_id.to_string(),
            generated_at: state.clock.now(),
            in_game: false,
            game: None,
        },
        Err(e) => StreamEvent::Error {
            code: "upstream_error".to_string(),
            message: e.to_string(),
        },
    }
}

/// Serializes and sends one event; false means the transport failed and the
/// stream should terminate.
async fn send_event(socket: &mut WebSocket, event: &StreamEvent) -> bool {
    let Ok(payload) = serde_json::to_string(event) else {
        return false;
    };
    socket.send(Message::Text(payload.into())).await.is_ok()
}

/// Whether the incoming side of the socket is still open.
fn still_open(incoming: Option<Result<Message, axum::Error>>) -> bool {
    !matches!(incoming, None | Some(Err(_)) | Some(Ok(Message::Close(_))))
}
