//! Per-service circuit breaker state machine.
//!
//! State lives in one cache hash per service; updates are HSET-based so
//! concurrent workers converge on the same document. The half-open trial
//! slot is a SET-NX lock with the half-open timeout as its TTL. Cache errors
//! inside the engine never change circuit state; they are logged and the
//! request is allowed.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::{Cache, CacheResult};
use crate::clock::{epoch_nanos, SharedClock};

use super::{CircuitConfig, CircuitGate, CircuitRecord, CircuitState};

/// Circuit breaker engine shared by every handler.
#[derive(Clone)]
pub struct CircuitBreaker {
    cache: Arc<dyn Cache>,
    clock: SharedClock,
    config: Arc<CircuitConfig>,
}

impl CircuitBreaker {
    /// Creates a new breaker.
    #[must_use]
    pub fn new(cache: Arc<dyn Cache>, clock: SharedClock, config: CircuitConfig) -> Self {
        Self {
            cache,
            clock,
            config: Arc::new(config),
        }
    }

    /// Returns the configuration for this breaker.
    #[must_use]
    pub fn config(&self) -> &CircuitConfig {
        &self.config
    }

    fn state_key(&self, service: &str) -> String {
        format!("{}:{service}", self.config.key_prefix)
    }

    fn responses_key(&self, service: &str) -> String {
        format!("{}:responses:{service}", self.config.key_prefix)
    }

    fn failures_key(&self, service: &str) -> String {
        format!("{}:failures:{service}", self.config.key_prefix)
    }

    fn trial_lock_key(&self, service: &str) -> String {
        format!("{}:halfopen:{service}", self.config.key_prefix)
    }

    /// Reads the circuit document for a service.
    pub async fn record(&self, service: &str) -> CacheResult<CircuitRecord> {
        let fields = self.cache.hash_get_all(&self.state_key(service)).await?;
        Ok(CircuitRecord::from_fields(
            service,
            &fields,
            self.clock.now().timestamp(),
        ))
    }

    async fn save(&self, record: &CircuitRecord) {
        let ttl = Duration::from_secs(self.config.state_ttl_secs);
        if let Err(e) = self
            .cache
            .hash_set(&self.state_key(&record.service), &record.to_fields(), Some(ttl))
            .await
        {
            warn!(service = %record.service, error = %e, "Failed to persist circuit state");
        }
    }

    fn trip_open(&self, record: &mut CircuitRecord, now: i64) {
        record.state = CircuitState::Open;
        record.state_changed_at = now;
        record.next_retry_at = Some(now + self.config.open_timeout_secs as i64);
        record.success_count = 0;
    }

    async fn try_trial(&self, service: &str, record: CircuitRecord) -> CircuitGate {
        let ttl = Duration::from_secs(self.config.half_open_timeout_secs);
        match self
            .cache
            .set_nx_ex(&self.trial_lock_key(service), "1", ttl)
            .await
        {
            Ok(true) => CircuitGate::AllowTrial,
            Ok(false) => CircuitGate::Deny(record),
            Err(e) => {
                warn!(service = %service, error = %e, "Trial lock unavailable, allowing");
                CircuitGate::AllowTrial
            }
        }
    }

    async fn release_trial(&self, service: &str) {
        if let Err(e) = self.cache.del(&self.trial_lock_key(service)).await {
            debug!(service = %service, error = %e, "Failed to release trial lock");
        }
    }

    /// Gate a request against the service's circuit.
    #[tracing::instrument(skip(self))]
    pub async fn gate(&self, service: &str) -> CircuitGate {
        let record = match self.record(service).await {
            Ok(record) => record,
            Err(e) => {
                warn!(service = %service, error = %e, "Circuit state unavailable, allowing");
                return CircuitGate::Allow;
            }
        };
        let now = self.clock.now().timestamp();

        match record.state {
            CircuitState::Closed => CircuitGate::Allow,
            CircuitState::Open => {
                if now >= record.state_changed_at + self.config.open_timeout_secs as i64 {
                    let mut record = record;
                    record.state = CircuitState::HalfOpen;
                    record.state_changed_at = now;
                    record.next_retry_at = None;
                    record.success_count = 0;
                    self.save(&record).await;
                    info!(service = %service, "Circuit open timeout elapsed, trying half-open");
                    self.try_trial(service, record).await
                } else {
                    CircuitGate::Deny(record)
                }
            }
            CircuitState::HalfOpen => {
                if now > record.state_changed_at + self.config.half_open_timeout_secs as i64 {
                    // The trial never reported back; reopen.
                    let mut record = record;
                    self.trip_open(&mut record, now);
                    self.save(&record).await;
                    warn!(service = %service, "Half-open trial timed out, reopening circuit");
                    CircuitGate::Deny(record)
                } else {
                    self.try_trial(service, record).await
                }
            }
        }
    }

    /// Records a successful call.
    #[tracing::instrument(skip(self))]
    pub async fn record_success(&self, service: &str, latency_ms: u64) {
        let now = self.clock.now();
        let nanos = epoch_nanos(now) as f64;
        let window = 2 * self.config.error_rate_window_secs;
        let member = format!("{}:{latency_ms}", epoch_nanos(now));
        if let Err(e) = self
            .cache
            .sliding_window(
                &self.responses_key(service),
                nanos - window as f64 * 1e9,
                &member,
                nanos,
                Duration::from_secs(window),
            )
            .await
        {
            debug!(service = %service, error = %e, "Failed to record response-time sample");
        }

        let Ok(mut record) = self.record(service).await else {
            warn!(service = %service, "Circuit state unavailable while recording success");
            return;
        };
        record.success_count += 1;
        record.last_success_at = Some(now.timestamp());
        record.consecutive_failures = 0;

        if record.state == CircuitState::HalfOpen {
            if record.success_count >= self.config.success_threshold {
                record.state = CircuitState::Closed;
                record.state_changed_at = now.timestamp();
                record.failure_count = 0;
                record.success_count = 0;
                record.consecutive_failures = 0;
                record.next_retry_at = None;
                record.error_rate = 0.0;
                info!(service = %service, "Circuit closed after successful trials");
            }
            self.release_trial(service).await;
        }

        if let Ok(rate) = self.error_rate(service).await {
            record.error_rate = rate;
        }
        self.save(&record).await;
    }

    /// Records a failed call with its status code and latency.
    #[tracing::instrument(skip(self))]
    pub async fn record_failure(&self, service: &str, status: u16, latency_ms: u64) {
        let now = self.clock.now();
        let nanos = epoch_nanos(now) as f64;
        let window = 2 * self.config.error_rate_window_secs;
        let member = format!("{}:{status}:{latency_ms}", epoch_nanos(now));
        if let Err(e) = self
            .cache
            .sliding_window(
                &self.failures_key(service),
                nanos - window as f64 * 1e9,
                &member,
                nanos,
                Duration::from_secs(window),
            )
            .await
        {
            debug!(service = %service, error = %e, "Failed to record failure sample");
        }

        let Ok(mut record) = self.record(service).await else {
            warn!(service = %service, "Circuit state unavailable while recording failure");
            return;
        };
        record.failure_count += 1;
        record.consecutive_failures += 1;
        record.last_failure_at = Some(now.timestamp());
        if let Ok(rate) = self.error_rate(service).await {
            record.error_rate = rate;
        }

        match record.state {
            CircuitState::HalfOpen => {
                self.trip_open(&mut record, now.timestamp());
                self.release_trial(service).await;
                warn!(service = %service, "Half-open trial failed, reopening circuit");
            }
            CircuitState::Closed => {
                let consecutive_trip =
                    record.consecutive_failures >= self.config.consecutive_threshold;
                let rate_trip = record.error_rate > self.config.error_rate_trip
                    && record.failure_count >= self.config.failure_threshold;
                if consecutive_trip || rate_trip {
                    self.trip_open(&mut record, now.timestamp());
                    warn!(
                        service = %service,
                        consecutive = record.consecutive_failures,
                        error_rate = record.error_rate,
                        "Circuit tripped open"
                    );
                }
            }
            CircuitState::Open => {}
        }

        self.save(&record).await;
    }

    /// Routes a handler outcome to success or failure. Client errors (4xx)
    /// are neither.
    pub async fn record_outcome(&self, service: &str, status: u16, latency_ms: u64) {
        match status {
            200..=299 => self.record_success(service, latency_ms).await,
            400..=499 => {}
            _ => self.record_failure(service, status, latency_ms).await,
        }
    }

    /// Lightweight failure signal for dependency degradation (no latency
    /// sample to attach).
    pub async fn note_dependency_failure(&self, service: &str) {
        self.record_failure(service, 503, 0).await;
    }

    /// Error rate over the configured window:
    /// `failures / (failures + successes)`.
    pub async fn error_rate(&self, service: &str) -> CacheResult<f64> {
        let now_nanos = epoch_nanos(self.clock.now()) as f64;
        let window_start = now_nanos - self.config.error_rate_window_secs as f64 * 1e9;

        let failures = self
            .cache
            .zcount(&self.failures_key(service), window_start, now_nanos)
            .await?;
        let successes = self
            .cache
            .zcount(&self.responses_key(service), window_start, now_nanos)
            .await?;

        let total = failures + successes;
        if total == 0 {
            Ok(0.0)
        } else {
            Ok(failures as f64 / total as f64)
        }
    }

    /// Average response time over the window, from the success samples.
    pub async fn avg_response_time_ms(&self, service: &str) -> CacheResult<f64> {
        let now_nanos = epoch_nanos(self.clock.now()) as f64;
        let window_start = now_nanos - self.config.error_rate_window_secs as f64 * 1e9;

        let samples = self
            .cache
            .zrange_by_score(&self.responses_key(service), window_start, now_nanos)
            .await?;
        if samples.is_empty() {
            return Ok(0.0);
        }
        let total: u64 = samples
            .iter()
            .filter_map(|(member, _)| member.rsplit(':').next())
            .filter_map(|latency| latency.parse::<u64>().ok())
            .sum();
        Ok(total as f64 / samples.len() as f64)
    }

    /// Recent rate-limit (429) failures, for the upstream probe rule.
    pub async fn recent_rate_limit_errors(&self, service: &str) -> CacheResult<u64> {
        let now_nanos = epoch_nanos(self.clock.now()) as f64;
        let window_start = now_nanos - self.config.error_rate_window_secs as f64 * 1e9;

        let samples = self
            .cache
            .zrange_by_score(&self.failures_key(service), window_start, now_nanos)
            .await?;
        Ok(samples
            .iter()
            .filter_map(|(member, _)| member.split(':').nth(1))
            .filter(|status| *status == "429")
            .count() as u64)
    }

    /// Forces an open circuit to half-open (used by the health probe when
    /// the service looks healthy again).
    pub async fn force_half_open(&self, service: &str) {
        let Ok(mut record) = self.record(service).await else {
            return;
        };
        if record.state != CircuitState::Open {
            return;
        }
        record.state = CircuitState::HalfOpen;
        record.state_changed_at = self.clock.now().timestamp();
        record.next_retry_at = None;
        record.success_count = 0;
        self.save(&record).await;
        info!(service = %service, "Health probe forced circuit to half-open");
    }
}
