//! Adaptive limit adjustment.
//!
//! A background task recomputes a bounded multiplier for all rate limits
//! every 30 seconds from a weighted system-load score and the traffic
//! pattern score, biased by time of day. The ratio and the reason it was
//! chosen are stored in the shared cache for observability and read by the
//! admission path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Timelike;
use tracing::{debug, warn};

use crate::cache::{Cache, CacheResult};
use crate::clock::SharedClock;

use super::constants::{
    ADAPTIVE_INTERVAL_SECS, ADAPTIVE_RATIO_MAX, ADAPTIVE_RATIO_MIN, OFF_HOURS_MULTIPLIER,
    PEAK_HOURS_MULTIPLIER,
};

/// Cache key holding the current ratio and reason.
pub const ADAPTIVE_STATE_KEY: &str = "adaptive:state";

/// Point-in-time system load. Every factor is normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLoad {
    pub cpu: f64,
    pub memory: f64,
    pub connections: f64,
    pub error_rate: f64,
    pub response_time: f64,
}

impl SystemLoad {
    /// Weighted combination of the load factors.
    #[must_use]
    pub fn score(&self) -> f64 {
        let combined = self.cpu * 0.3
            + self.memory * 0.2
            + self.connections * 0.2
            + self.error_rate * 0.2
            + self.response_time * 0.1;
        combined.clamp(0.0, 1.0)
    }
}

/// Source of system-load samples.
pub trait LoadSampler: Send + Sync + 'static {
    /// Current normalized load.
    fn sample(&self) -> SystemLoad;
}

/// Source of the traffic-pattern score in `[0, 1]` (0 = nominal traffic,
/// 1 = anomalous volume). Implemented by the DDoS detector.
#[async_trait]
pub trait TrafficSignal: Send + Sync + 'static {
    async fn traffic_score(&self) -> f64;
}

/// Request-path counters the process sampler derives load factors from.
#[derive(Debug, Default)]
pub struct LoadMetrics {
    in_flight: AtomicU64,
    requests: AtomicU64,
    errors: AtomicU64,
    response_ms_total: AtomicU64,
}

impl LoadMetrics {
    /// Marks a request as started.
    pub fn request_started(&self) {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    /// Marks a request as finished with its latency and outcome.
    pub fn request_finished(&self, latency_ms: u64, is_error: bool) {
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.response_ms_total.fetch_add(latency_ms, Ordering::Relaxed);
        if is_error {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Drains the accumulated counters into a load sample and resets them.
    /// CPU and memory pressure are not sampled directly; their factors stay
    /// at zero and the remaining weights carry the signal.
    #[must_use]
    pub fn drain(&self, max_connections: u64) -> SystemLoad {
        let requests = self.requests.swap(0, Ordering::Relaxed);
        let errors = self.errors.swap(0, Ordering::Relaxed);
        let response_ms = self.response_ms_total.swap(0, Ordering::Relaxed);
        let in_flight = self.in_flight.load(Ordering::Relaxed);

        let error_rate = if requests == 0 {
            0.0
        } else {
            errors as f64 / requests as f64
        };
        let avg_response_ms = if requests == 0 {
            0.0
        } else {
            response_ms as f64 / requests as f64
        };

        SystemLoad {
            cpu: 0.0,
            memory: 0.0,
            connections: (in_flight as f64 / max_connections.max(1) as f64).clamp(0.0, 1.0),
            error_rate: error_rate.clamp(0.0, 1.0),
            response_time: (avg_response_ms / 5_000.0).clamp(0.0, 1.0),
        }
    }
}

/// Load sampler backed by [`LoadMetrics`].
pub struct ProcessLoadSampler {
    metrics: Arc<LoadMetrics>,
    max_connections: u64,
}

impl ProcessLoadSampler {
    #[must_use]
    pub const fn new(metrics: Arc<LoadMetrics>, max_connections: u64) -> Self {
        Self {
            metrics,
            max_connections,
        }
    }
}

impl LoadSampler for ProcessLoadSampler {
    fn sample(&self) -> SystemLoad {
        self.metrics.drain(self.max_connections)
    }
}

/// Computes the ratio for a load score, traffic score, and local hour.
#[must_use]
pub fn compute_ratio(load_score: f64, traffic_score: f64, hour: u32) -> (f64, String) {
    // Light load grants headroom, heavy load withdraws it.
    let load_factor = 1.5 - load_score;
    let traffic_factor = 1.0 - 0.5 * traffic_score.clamp(0.0, 1.0);
    let tod_factor = if (18..=23).contains(&hour) {
        PEAK_HOURS_MULTIPLIER
    } else if hour < 6 {
        OFF_HOURS_MULTIPLIER
    } else {
        1.0
    };

    let ratio = (load_factor * traffic_factor * tod_factor)
        .clamp(ADAPTIVE_RATIO_MIN, ADAPTIVE_RATIO_MAX);
    let reason = format!(
        "load={load_score:.2} traffic={traffic_score:.2} tod=x{tod_factor:.1} hour={hour}"
    );
    (ratio, reason)
}

/// Adaptive ratio store. The admission path reads the current ratio; the
/// background task refreshes it.
#[derive(Clone)]
pub struct AdaptiveLimiter {
    cache: Arc<dyn Cache>,
    clock: SharedClock,
}

impl AdaptiveLimiter {
    #[must_use]
    pub fn new(cache: Arc<dyn Cache>, clock: SharedClock) -> Self {
        Self { cache, clock }
    }

    /// Current ratio, defaulting to 1.0 when unset or when the cache is
    /// unavailable (adaptive adjustment is skipped, never guessed).
    pub async fn current_ratio(&self) -> f64 {
        match self.cache.hash_get_all(ADAPTIVE_STATE_KEY).await {
            Ok(state) => state
                .get("ratio")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1.0),
            Err(e) => {
                debug!(error = %e, "Adaptive state unavailable, using ratio 1.0");
                1.0
            }
        }
    }

    /// Recomputes and stores the ratio.
    pub async fn refresh(&self, load: SystemLoad, traffic_score: f64) -> CacheResult<f64> {
        let hour = self.clock.now().hour();
        let (ratio, reason) = compute_ratio(load.score(), traffic_score, hour);

        self.cache
            .hash_set(
                ADAPTIVE_STATE_KEY,
                &[
                    ("ratio", format!("{ratio:.4}")),
                    ("reason", reason.clone()),
                    ("updated_at", self.clock.now().timestamp().to_string()),
                ],
                Some(Duration::from_secs(24 * 60 * 60)),
            )
            .await?;

        debug!(ratio, reason = %reason, "Adaptive ratio refreshed");
        Ok(ratio)
    }

    /// Background refresh loop. Runs until the task is aborted at shutdown.
    pub async fn run(
        self,
        sampler: Arc<dyn LoadSampler>,
        traffic: Arc<dyn TrafficSignal>,
    ) {
        let mut interval =
            tokio::time::interval(Duration::from_secs(ADAPTIVE_INTERVAL_SECS));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let load = sampler.sample();
            let traffic_score = traffic.traffic_score().await;
            if let Err(e) = self.refresh(load, traffic_score).await {
                warn!(error = %e, "Failed to refresh adaptive ratio");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::cache::MemoryCache;
    use crate::clock::ManualClock;

    use super::*;

    #[test]
    fn test_load_score_weights() {
        let load = SystemLoad {
            cpu: 1.0,
            memory: 1.0,
            connections: 1.0,
            error_rate: 1.0,
            response_time: 1.0,
        };
        assert!((load.score() - 1.0).abs() < 1e-9);

        let load = SystemLoad {
            cpu: 1.0,
            ..SystemLoad::default()
        };
        assert!((load.score() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_bounds() {
        // Worst case stays at the floor.
        let (ratio, _) = compute_ratio(1.0, 1.0, 3);
        assert!(ratio >= ADAPTIVE_RATIO_MIN);

        // Best case stays under the ceiling.
        let (ratio, _) = compute_ratio(0.0, 0.0, 20);
        assert!(ratio <= ADAPTIVE_RATIO_MAX);
    }

    #[test]
    fn test_time_of_day_bias() {
        let (evening, _) = compute_ratio(0.5, 0.0, 20);
        let (midday, _) = compute_ratio(0.5, 0.0, 13);
        let (early, _) = compute_ratio(0.5, 0.0, 4);
        assert!(evening > midday);
        assert!(early < midday);
    }

    #[test]
    fn test_traffic_score_withdraws_headroom() {
        let (calm, _) = compute_ratio(0.2, 0.0, 13);
        let (stormy, _) = compute_ratio(0.2, 1.0, 13);
        assert!(stormy < calm);
    }

    #[test]
    fn test_load_metrics_drain() {
        let metrics = LoadMetrics::default();
        metrics.request_started();
        metrics.request_finished(250, false);
        metrics.request_started();
        metrics.request_finished(750, true);

        let load = metrics.drain(100);
        assert!((load.error_rate - 0.5).abs() < 1e-9);
        assert!((load.response_time - 0.1).abs() < 1e-9);

        // Counters reset after drain.
        let load = metrics.drain(100);
        assert!((load.error_rate).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_refresh_and_read_back() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = Arc::new(MemoryCache::new(clock.clone()));
        let adaptive = AdaptiveLimiter::new(cache, clock);

        let stored = adaptive
            .refresh(SystemLoad::default(), 0.0)
            .await
            .unwrap();
        let read = adaptive.current_ratio().await;
        assert!((stored - read).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_missing_state_defaults_to_one() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = Arc::new(MemoryCache::new(clock.clone()));
        let adaptive = AdaptiveLimiter::new(cache, clock);

        assert!((adaptive.current_ratio().await - 1.0).abs() < f64::EPSILON);
    }
}
