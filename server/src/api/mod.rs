//! API Router and Application State
//!
//! Central routing configuration and shared state for the RPC surface.
//! Interceptor order: logging (trace layer) -> latency -> auth -> endpoint
//! class -> admission (block set + rate limit), then the handler with its
//! per-service circuit gate.

pub mod analytics;
pub mod error;
pub mod health;
pub mod matches;
pub mod meta;
pub mod middleware;
pub mod proxy;
pub mod stream;

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::analytics::{AnalyticsConfig, AnalyticsEngine};
use crate::auth;
use crate::cache::Cache;
use crate::circuit::{CircuitBreaker, CircuitConfig, FallbackCache};
use crate::clock::SharedClock;
use crate::config::Config;
use crate::ddos::{DdosConfig, DdosProtector};
use crate::matches::{MatchAnalyzer, MatchAnalyzerConfig};
use crate::ratelimit::{
    admission, with_class, AdaptiveLimiter, EndpointClass, LoadMetrics, RateLimitConfig,
    RateLimiter,
};
use crate::store::MatchStore;
use crate::upstream::GameDataProvider;

pub use error::ApiError;
pub use health::{HealthRegistry, OPERATIONS};
pub use meta::{ApiResponse, ResponseMeta};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<Config>,
    /// Shared cache port.
    pub cache: Arc<dyn Cache>,
    /// Clock port.
    pub clock: SharedClock,
    /// Sliding-window rate limiter.
    pub limiter: RateLimiter,
    /// Adaptive limit ratio store.
    pub adaptive: AdaptiveLimiter,
    /// DDoS detection and mitigation.
    pub ddos: DdosProtector,
    /// Per-service circuit breakers.
    pub breaker: CircuitBreaker,
    /// Fallback response cache.
    pub fallback: FallbackCache,
    /// Analytics compute engine.
    pub engine: AnalyticsEngine,
    /// Match analyzer.
    pub analyzer: MatchAnalyzer,
    /// Match document store (optional).
    pub store: Option<Arc<dyn MatchStore>>,
    /// Upstream game-data provider (optional).
    pub provider: Option<Arc<dyn GameDataProvider>>,
    /// Per-operation health registry.
    pub health: Arc<HealthRegistry>,
    /// Request-path counters for the load sampler.
    pub load_metrics: Arc<LoadMetrics>,
}

/// Configuration for creating a new [`AppState`].
pub struct AppStateConfig {
    pub config: Config,
    pub cache: Arc<dyn Cache>,
    pub clock: SharedClock,
    pub store: Option<Arc<dyn MatchStore>>,
    pub provider: Option<Arc<dyn GameDataProvider>>,
    pub rate_limit: RateLimitConfig,
    pub ddos: DdosConfig,
    pub circuit: CircuitConfig,
    pub analytics: AnalyticsConfig,
    pub match_analyzer: MatchAnalyzerConfig,
}

impl AppState {
    /// Create new application state, wiring every engine to the shared
    /// cache and clock ports.
    #[must_use]
    pub fn new(cfg: AppStateConfig) -> Self {
        let cache = cfg.cache;
        let clock = cfg.clock;
        let circuit_config = Arc::new(cfg.circuit.clone());

        Self {
            config: Arc::new(cfg.config),
            limiter: RateLimiter::new(cache.clone(), clock.clone(), cfg.rate_limit),
            adaptive: AdaptiveLimiter::new(cache.clone(), clock.clone()),
            ddos: DdosProtector::new(cache.clone(), clock.clone(), cfg.ddos),
            breaker: CircuitBreaker::new(cache.clone(), clock.clone(), cfg.circuit),
            fallback: FallbackCache::new(cache.clone(), clock.clone(), circuit_config),
            engine: AnalyticsEngine::new(cfg.analytics, clock.clone()),
            analyzer: MatchAnalyzer::new(cfg.match_analyzer, clock.clone()),
            store: cfg.store,
            provider: cfg.provider,
            health: Arc::new(HealthRegistry::new()),
            load_metrics: Arc::new(LoadMetrics::default()),
            cache,
            clock,
        }
    }
}

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    // Configure CORS based on allowed origins; production deployments set
    // CORS_ALLOWED_ORIGINS to specific origins.
    let cors = if state.config.cors_allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use axum::http::{header, HeaderName, Method};
        let origins: Vec<_> = state
            .config
            .cors_allowed_origins
            .iter()
            .filter_map(|o| {
                if let Ok(origin) = o.parse() {
                    Some(origin)
                } else {
                    tracing::warn!(origin = %o, "Invalid CORS origin in configuration, skipping");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([
                header::CONTENT_TYPE,
                header::AUTHORIZATION,
                HeaderName::from_static("x-api-key"),
                HeaderName::from_static("x-region"),
                HeaderName::from_static("x-request-id"),
            ])
            .allow_credentials(true)
    };

    // Analytics operations carry the tier-multiplied analytics budget.
    let analytics_routes = Router::new()
        .route("/api/analytics/player", post(analytics::get_player_analytics))
        .route("/api/analytics/match", post(analytics::get_match_analytics))
        .route(
            "/api/analytics/champion",
            post(analytics::get_champion_analytics),
        )
        .route("/api/analytics/batch", post(analytics::batch_process_analytics))
        .route(
            "/api/analytics/skill-gap",
            post(analytics::calculate_skill_gap),
        )
        .layer(from_fn_with_state(state.clone(), admission))
        .layer(from_fn(with_class(EndpointClass::Analytics)));

    let match_routes = Router::new()
        .route("/api/matches/process", post(matches::process_match))
        .route("/api/matches/batch", post(matches::batch_process_matches))
        .route("/api/matches/search", get(matches::search_matches))
        .route("/api/matches/{match_id}", get(matches::get_match))
        .route(
            "/api/matches/{match_id}/timeline",
            get(matches::get_match_timeline),
        )
        .layer(from_fn_with_state(state.clone(), admission))
        .layer(from_fn(with_class(EndpointClass::Matches)));

    // Bulk export rides its own much tighter budget.
    let export_routes = Router::new()
        .route("/api/matches/export", get(matches::export_matches))
        .layer(from_fn_with_state(state.clone(), admission))
        .layer(from_fn(with_class(EndpointClass::Export)));

    let proxy_routes = Router::new()
        .route(
            "/api/riot/summoner/by-name/{name}",
            get(proxy::get_summoner_by_name),
        )
        .route(
            "/api/riot/summoner/by-puuid/{puuid}",
            get(proxy::get_summoner_by_puuid),
        )
        .route("/api/riot/summoner/{id}", get(proxy::get_summoner_by_id))
        .route("/api/riot/matches/{puuid}", get(proxy::get_match_history))
        .route("/api/riot/ranked/{summoner_id}", get(proxy::get_ranked_stats))
        .route(
            "/api/riot/mastery/{summoner_id}",
            get(proxy::get_champion_mastery),
        )
        .route("/api/riot/live/{summoner_id}", get(proxy::get_current_game))
        .route("/api/riot/sync/{puuid}", post(proxy::sync_player))
        .route("/api/riot/rate-limit", get(proxy::get_rate_limit_info))
        .layer(from_fn_with_state(state.clone(), admission))
        .layer(from_fn(with_class(EndpointClass::Proxy)));

    let stream_routes = Router::new()
        .route("/ws/analytics", get(stream::stream_analytics))
        .route("/ws/live/{summoner_id}", get(stream::stream_live_match))
        .layer(from_fn_with_state(state.clone(), admission))
        .layer(from_fn(with_class(EndpointClass::Stream)));

    Router::new()
        // Health check (no admission; load balancers poll it)
        .route("/health", get(health_check))
        .merge(analytics_routes)
        .merge(match_routes)
        .merge(export_routes)
        .merge(proxy_routes)
        .merge(stream_routes)
        // API documentation
        .merge(api_docs(state.config.enable_api_docs))
        // Interceptors (outermost first: logging -> latency -> auth)
        .layer(from_fn_with_state(state.clone(), auth::authenticate))
        .layer(from_fn_with_state(state.clone(), middleware::track_latency))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors)
        // Request ID for tracing correlation
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        // State
        .with_state(state)
}

/// OpenAPI documentation routes, when enabled.
fn api_docs(enabled: bool) -> Router<AppState> {
    #[derive(OpenApi)]
    #[openapi(paths(health_check))]
    struct ApiDoc;

    if enabled {
        Router::new().merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
    } else {
        Router::new()
    }
}

/// Health check response.
#[derive(Serialize, utoipa::ToSchema)]
pub(crate) struct HealthResponse {
    /// Overall service status ("ok", "degraded", or "shutting_down")
    status: &'static str,
    /// Shared cache connectivity
    cache: bool,
    /// Per-operation serving status
    operations: BTreeMap<String, String>,
    /// Per-service circuit state
    circuits: BTreeMap<String, String>,
}

/// Health check endpoint.
///
/// Reports per-operation serving status (flipped to not-serving during
/// shutdown), shared-cache connectivity, and every service's circuit state.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health status", body = HealthResponse),
    ),
)]
pub(crate) async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let cache_ok = state.cache.exists("health:ping").await.is_ok();

    let mut circuits = BTreeMap::new();
    for service in &state.breaker.config().services.clone() {
        let label = match state.breaker.record(service).await {
            Ok(record) => record.state.as_str().to_string(),
            Err(_) => "unknown".to_string(),
        };
        circuits.insert(service.clone(), label);
    }

    let status = if !state.health.all_serving() {
        "shutting_down"
    } else if cache_ok {
        "ok"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status,
        cache: cache_ok,
        operations: state
            .health
            .statuses()
            .into_iter()
            .map(|(op, s)| (op.to_string(), s.to_string()))
            .collect(),
        circuits,
    })
}
