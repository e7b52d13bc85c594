//! Server Configuration
//!
//! Loads configuration from environment variables.

use anyhow::Result;
use std::env;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8080")
    pub bind_address: String,

    /// Redis connection URL
    pub redis_url: String,

    /// `PostgreSQL` connection URL for the match store (optional; match
    /// reads are disabled without it)
    pub database_url: Option<String>,

    /// Upstream provider base URL (optional; proxy operations are disabled
    /// without it)
    pub upstream_base_url: Option<String>,

    /// Upstream provider API key
    pub upstream_api_key: Option<String>,

    /// Upstream provider region label, echoed in proxy response headers
    pub upstream_region: Option<String>,

    /// Whether bearer-token auth is enforced
    pub auth_enabled: bool,

    /// JWT verification secret (required when auth is enabled)
    pub jwt_secret: Option<String>,

    /// Streaming update interval in seconds (default: 30)
    pub stream_update_interval_secs: u64,

    /// Analytics request deadline in seconds (default: 5)
    pub request_deadline_secs: u64,

    /// Latency above which a structured warning is emitted, in ms
    pub slow_request_threshold_ms: u64,

    /// Connection count the load sampler normalizes against
    pub max_connections: u64,

    /// Allowed CORS origins ("*" allows any)
    pub cors_allowed_origins: Vec<String>,

    /// Whether to serve the OpenAPI docs
    pub enable_api_docs: bool,

    /// API version reported in response metadata
    pub api_version: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let auth_enabled = env::var("AUTH_ENABLED")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(false);
        let jwt_secret = env::var("JWT_SECRET").ok();
        if auth_enabled && jwt_secret.is_none() {
            anyhow::bail!("JWT_SECRET must be set when AUTH_ENABLED=true");
        }

        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            redis_url: env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".into()),
            database_url: env::var("DATABASE_URL").ok(),
            upstream_base_url: env::var("UPSTREAM_BASE_URL").ok(),
            upstream_api_key: env::var("UPSTREAM_API_KEY").ok(),
            upstream_region: env::var("UPSTREAM_REGION").ok(),
            auth_enabled,
            jwt_secret,
            stream_update_interval_secs: env::var("STREAM_UPDATE_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            request_deadline_secs: env::var("REQUEST_DEADLINE_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            slow_request_threshold_ms: env::var("SLOW_REQUEST_THRESHOLD_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5_000),
            max_connections: env::var("MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1_024),
            cors_allowed_origins: env::var("CORS_ALLOWED_ORIGINS")
                .map(|s| {
                    s.split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_else(|_| vec!["*".to_string()]),
            enable_api_docs: env::var("ENABLE_API_DOCS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            api_version: env::var("API_VERSION").unwrap_or_else(|_| "v1".into()),
        })
    }

    /// Whether the upstream proxy surface is wired.
    #[must_use]
    pub const fn has_upstream(&self) -> bool {
        self.upstream_base_url.is_some() && self.upstream_api_key.is_some()
    }

    /// Create a default configuration for testing.
    #[must_use]
    pub fn default_for_test() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".into(),
            redis_url: "redis://localhost:6379".into(),
            database_url: None,
            upstream_base_url: None,
            upstream_api_key: None,
            upstream_region: None,
            auth_enabled: false,
            jwt_secret: Some("test-secret".into()),
            stream_update_interval_secs: 30,
            request_deadline_secs: 5,
            slow_request_threshold_ms: 5_000,
            max_connections: 1_024,
            cors_allowed_origins: vec!["*".to_string()],
            enable_api_docs: false,
            api_version: "v1".into(),
        }
    }
}
