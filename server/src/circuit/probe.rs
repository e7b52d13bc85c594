//! Background health probe.
//!
//! Every interval, services whose circuit is open are evaluated: when the
//! recent error rate and average response time look healthy (plus any
//! service-specific rule), the circuit is forced to half-open so the next
//! request can trial the recovery.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::Cache;

use super::{services, CircuitBreaker, CircuitState};

/// Cache key the analytics workers publish their queue depth to.
pub const ANALYTICS_QUEUE_DEPTH_KEY: &str = "analytics:queue_depth";

/// Health probe over the open circuits.
#[derive(Clone)]
pub struct HealthProbe {
    breaker: CircuitBreaker,
    cache: Arc<dyn Cache>,
}

impl HealthProbe {
    /// Creates a probe sharing the breaker's configuration.
    #[must_use]
    pub const fn new(breaker: CircuitBreaker, cache: Arc<dyn Cache>) -> Self {
        Self { breaker, cache }
    }

    /// Service-specific recovery rule on top of the base health check.
    async fn service_rule_healthy(&self, service: &str) -> bool {
        let config = self.breaker.config();
        match service {
            services::UPSTREAM => match self.breaker.recent_rate_limit_errors(service).await {
                Ok(errors) => errors <= config.probe_upstream_rate_limit_errors_max,
                Err(_) => false,
            },
            services::ANALYTICS => {
                let depth = self
                    .cache
                    .get_i64(ANALYTICS_QUEUE_DEPTH_KEY)
                    .await
                    .ok()
                    .flatten()
                    .unwrap_or(0);
                depth <= config.probe_analytics_queue_depth_max
            }
            _ => true,
        }
    }

    /// Evaluates whether an open service looks healthy enough to trial.
    pub async fn looks_healthy(&self, service: &str) -> bool {
        let config = self.breaker.config();
        let error_rate = match self.breaker.error_rate(service).await {
            Ok(rate) => rate,
            Err(e) => {
                debug!(service = %service, error = %e, "Probe could not read error rate");
                return false;
            }
        };
        let avg_response = match self.breaker.avg_response_time_ms(service).await {
            Ok(avg) => avg,
            Err(e) => {
                debug!(service = %service, error = %e, "Probe could not read response times");
                return false;
            }
        };

        error_rate <= config.probe_error_rate_max
            && avg_response <= config.probe_avg_response_ms_max
            && self.service_rule_healthy(service).await
    }

    /// One probe pass over every configured service.
    pub async fn probe_once(&self) {
        let service_names = self.breaker.config().services.clone();
        for service in &service_names {
            let record = match self.breaker.record(service).await {
                Ok(record) => record,
                Err(e) => {
                    warn!(service = %service, error = %e, "Probe could not read circuit state");
                    continue;
                }
            };
            if record.state != CircuitState::Open {
                continue;
            }
            if self.looks_healthy(service).await {
                self.breaker.force_half_open(service).await;
            } else {
                debug!(service = %service, "Open service still unhealthy");
            }
        }
    }

    /// Background probe loop. Runs until the task is aborted at shutdown.
    pub async fn run(self) {
        let interval_secs = self.breaker.config().probe_interval_secs;
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            self.probe_once().await;
        }
    }
}
