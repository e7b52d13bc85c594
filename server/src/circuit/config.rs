//! Circuit breaker configuration.

/// Well-known downstream service names.
pub mod services {
    /// Analytics compute core.
    pub const ANALYTICS: &str = "analytics";
    /// Match analyzer.
    pub const MATCHES: &str = "matches";
    /// Upstream game-data provider.
    pub const UPSTREAM: &str = "upstream";
    /// Match document store.
    pub const STORE: &str = "store";
    /// Shared cache dependency.
    pub const CACHE: &str = "cache";
}

/// Tunables for the per-service circuit breakers.
#[derive(Debug, Clone)]
pub struct CircuitConfig {
    /// Prefix for cache keys (e.g., "cb").
    pub key_prefix: String,
    /// Services the health probe watches.
    pub services: Vec<String>,

    /// Consecutive failures that trip a closed circuit.
    pub consecutive_threshold: i64,
    /// Total failures required before the error-rate trigger applies.
    pub failure_threshold: i64,
    /// Error rate above which a closed circuit trips (with enough failures).
    pub error_rate_trip: f64,
    /// Successes in half-open required to close.
    pub success_threshold: i64,

    /// Seconds an open circuit waits before allowing a trial.
    pub open_timeout_secs: u64,
    /// Seconds a half-open trial may run before the circuit reopens; also
    /// the trial lock TTL.
    pub half_open_timeout_secs: u64,
    /// Error-rate computation window in seconds.
    pub error_rate_window_secs: u64,

    /// Probe loop interval in seconds.
    pub probe_interval_secs: u64,
    /// Probe: recent error rate at or below this reads as healthy.
    pub probe_error_rate_max: f64,
    /// Probe: average response time at or below this reads as healthy.
    pub probe_avg_response_ms_max: f64,
    /// Probe (upstream rule): recent rate-limit errors tolerated.
    pub probe_upstream_rate_limit_errors_max: u64,
    /// Probe (analytics rule): processing-queue depth tolerated.
    pub probe_analytics_queue_depth_max: i64,

    /// Fallback response freshness window in seconds.
    pub fallback_ttl_secs: u64,
    /// Circuit document TTL in seconds.
    pub state_ttl_secs: u64,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            key_prefix: "cb".to_string(),
            services: vec![
                services::ANALYTICS.to_string(),
                services::MATCHES.to_string(),
                services::UPSTREAM.to_string(),
                services::STORE.to_string(),
                services::CACHE.to_string(),
            ],
            consecutive_threshold: 5,
            failure_threshold: 10,
            error_rate_trip: 0.5,
            success_threshold: 3,
            open_timeout_secs: 60,
            half_open_timeout_secs: 30,
            error_rate_window_secs: 60,
            probe_interval_secs: 30,
            probe_error_rate_max: 0.1,
            probe_avg_response_ms_max: 5_000.0,
            probe_upstream_rate_limit_errors_max: 10,
            probe_analytics_queue_depth_max: 1_000,
            fallback_ttl_secs: 600,
            state_ttl_secs: 24 * 60 * 60,
        }
    }
}

impl CircuitConfig {
    /// Creates configuration from environment variables.
    ///
    /// Environment variables:
    /// - `CIRCUIT_CONSECUTIVE_THRESHOLD` (default: 5)
    /// - `CIRCUIT_FAILURE_THRESHOLD` (default: 10)
    /// - `CIRCUIT_SUCCESS_THRESHOLD` (default: 3)
    /// - `CIRCUIT_OPEN_TIMEOUT_SECS` (default: 60)
    /// - `CIRCUIT_HALF_OPEN_TIMEOUT_SECS` (default: 30)
    /// - `CIRCUIT_FALLBACK_TTL_SECS` (default: 600)
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        for (var, slot) in [
            (
                "CIRCUIT_CONSECUTIVE_THRESHOLD",
                &mut config.consecutive_threshold,
            ),
            ("CIRCUIT_FAILURE_THRESHOLD", &mut config.failure_threshold),
            ("CIRCUIT_SUCCESS_THRESHOLD", &mut config.success_threshold),
        ] {
            if let Ok(val) = std::env::var(var) {
                if let Ok(n) = val.parse() {
                    *slot = n;
                }
            }
        }
        for (var, slot) in [
            ("CIRCUIT_OPEN_TIMEOUT_SECS", &mut config.open_timeout_secs),
            (
                "CIRCUIT_HALF_OPEN_TIMEOUT_SECS",
                &mut config.half_open_timeout_secs,
            ),
            ("CIRCUIT_FALLBACK_TTL_SECS", &mut config.fallback_ttl_secs),
        ] {
            if let Ok(val) = std::env::var(var) {
                if let Ok(n) = val.parse() {
                    *slot = n;
                }
            }
        }

        config
    }
}
