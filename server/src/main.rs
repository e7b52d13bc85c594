//! Rift Analytics Server - Main Entry Point
//!
//! Gaming-analytics backend: analytics compute core behind multi-tier rate
//! limiting, DDoS mitigation, and per-service circuit breaking.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use rift_server::analytics::AnalyticsConfig;
use rift_server::api;
use rift_server::cache::{Cache, RedisCache};
use rift_server::circuit::{CircuitConfig, HealthProbe};
use rift_server::clock::{SharedClock, SystemClock};
use rift_server::config::Config;
use rift_server::ddos::DdosConfig;
use rift_server::matches::MatchAnalyzerConfig;
use rift_server::ratelimit::{ProcessLoadSampler, RateLimitConfig};
use rift_server::store::{self, MatchStore, PgMatchStore};
use rift_server::upstream::{GameDataProvider, HttpProvider};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rift_server=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Rift Analytics Server"
    );

    // Shared ports
    let cache: Arc<dyn Cache> = Arc::new(RedisCache::connect(&config.redis_url).await?);
    let clock: SharedClock = Arc::new(SystemClock);

    // Match store (optional - match reads are disabled if not configured)
    let match_store: Option<Arc<dyn MatchStore>> = match &config.database_url {
        Some(url) => {
            let pool = store::create_pool(url).await?;
            Some(Arc::new(PgMatchStore::new(pool)))
        }
        None => {
            warn!("DATABASE_URL not set; match store operations disabled");
            None
        }
    };

    // Upstream provider (optional - proxy operations are disabled if not configured)
    let provider: Option<Arc<dyn GameDataProvider>> = if config.has_upstream() {
        let base = config.upstream_base_url.clone().unwrap_or_default();
        let key = config.upstream_api_key.clone().unwrap_or_default();
        Some(Arc::new(HttpProvider::new(&base, &key)?))
    } else {
        warn!("Upstream provider not configured; proxy operations disabled");
        None
    };

    // Build application state
    let state = api::AppState::new(api::AppStateConfig {
        config: config.clone(),
        cache: cache.clone(),
        clock,
        store: match_store,
        provider,
        rate_limit: RateLimitConfig::from_env(),
        ddos: DdosConfig::from_env(),
        circuit: CircuitConfig::from_env(),
        analytics: AnalyticsConfig::default(),
        match_analyzer: MatchAnalyzerConfig::default(),
    });

    // Background loops: circuit health probe and adaptive limit refresh
    let probe = HealthProbe::new(state.breaker.clone(), cache);
    let probe_task = tokio::spawn(probe.run());

    let sampler = Arc::new(ProcessLoadSampler::new(
        state.load_metrics.clone(),
        config.max_connections,
    ));
    let adaptive_task = tokio::spawn(
        state
            .adaptive
            .clone()
            .run(sampler, Arc::new(state.ddos.clone())),
    );

    // Build router
    let app = api::create_router(state.clone());

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!(address = %config.bind_address, "Server listening");

    // Graceful shutdown: flip health to not-serving, then drain in-flight
    // requests before closing the listener.
    let shutdown_state = state.clone();
    let shutdown_signal = async move {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install CTRL+C signal handler");
        };
        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = ctrl_c => {},
            () = terminate => {},
        }
        info!("Received shutdown signal, draining in-flight requests");
        shutdown_state.health.set_shutting_down();
    };

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal)
    .await?;

    probe_task.abort();
    adaptive_task.abort();
    info!("Server shutdown complete");

    Ok(())
}
