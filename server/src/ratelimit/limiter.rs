//! Core rate limiter service backed by the shared cache.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::Cache;
use crate::clock::{epoch_nanos, SharedClock};

use super::constants::WINDOW_TTL_SLACK_SECS;
use super::{
    AdmissionDecision, ClientContext, EndpointClass, LimitConfig, RateLimitConfig, RateLimitError,
    RateLimitScope,
};

/// Sliding-window rate limiter.
///
/// Each (scope, key) pair owns a sorted set of request timestamps; admission
/// removes entries older than the window, inserts the current request, and
/// compares the resulting cardinality against the limit. The whole sequence
/// runs as one pipelined atomic group, so concurrent workers observe a
/// single consistent count per request.
#[derive(Clone)]
pub struct RateLimiter {
    cache: Arc<dyn Cache>,
    clock: SharedClock,
    config: Arc<RateLimitConfig>,
}

impl RateLimiter {
    /// Creates a new rate limiter instance.
    #[must_use]
    pub fn new(cache: Arc<dyn Cache>, clock: SharedClock, config: RateLimitConfig) -> Self {
        Self {
            cache,
            clock,
            config: Arc::new(config),
        }
    }

    /// Returns the configuration for this rate limiter.
    #[must_use]
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Checks whether the identifier bypasses rate limiting entirely.
    #[must_use]
    pub fn is_allowlisted(&self, identifier: &str) -> bool {
        self.config.allowlist.contains(identifier)
    }

    /// Single-scope sliding-window admission.
    ///
    /// On cache failure the request is admitted best-effort with
    /// `degraded = true` (unless `fail_open` is off, in which case the error
    /// propagates); callers count such events against the cache circuit.
    #[tracing::instrument(skip(self), fields(scope = %scope.as_str()))]
    pub async fn admit(
        &self,
        scope: RateLimitScope,
        key: &str,
        limit: u32,
        window: Duration,
    ) -> Result<AdmissionDecision, RateLimitError> {
        if !self.config.enabled {
            return Ok(AdmissionDecision::bypass(scope));
        }

        let now = self.clock.now();
        let score = epoch_nanos(now) as f64;
        let cutoff = score - window.as_nanos() as f64;
        // Member unique per request so two admissions in the same nanosecond
        // both count.
        let member = format!("{}-{}", epoch_nanos(now), Uuid::now_v7());
        let cache_key = format!("{}:{}:{}", self.config.key_prefix, scope.as_str(), key);
        let ttl = window + Duration::from_secs(WINDOW_TTL_SLACK_SECS);

        let count = match self
            .cache
            .sliding_window(&cache_key, cutoff, &member, score, ttl)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                warn!(error = %e, key = %cache_key, "Cache unavailable during admission");
                if !self.config.fail_open {
                    return Err(RateLimitError::CacheUnavailable);
                }
                return Ok(AdmissionDecision {
                    allowed: true,
                    scope,
                    limit,
                    remaining: limit.saturating_sub(1),
                    reset_at: (now.timestamp() as u64) + window.as_secs(),
                    retry_after: 0,
                    degraded: true,
                });
            }
        };

        let allowed = count <= u64::from(limit);
        let remaining = if allowed {
            limit.saturating_sub(count as u32)
        } else {
            0
        };

        debug!(
            key = %cache_key,
            count,
            limit,
            allowed,
            "Sliding-window admission"
        );

        Ok(AdmissionDecision {
            allowed,
            scope,
            limit,
            remaining,
            reset_at: (now.timestamp() as u64) + window.as_secs(),
            retry_after: if allowed { 0 } else { window.as_secs() },
            degraded: false,
        })
    }

    /// Composed admission for one request: global ceiling, tier budget,
    /// endpoint budget, region ceiling, and the analytics / proxy / export
    /// scope when the endpoint class carries one. The most restrictive
    /// decision wins; any denial is returned immediately.
    #[tracing::instrument(skip(self, ctx), fields(client = %ctx.client_id, class = %class.as_str()))]
    pub async fn admit_request(
        &self,
        ctx: &ClientContext,
        class: EndpointClass,
        ratio: f64,
    ) -> Result<AdmissionDecision, RateLimitError> {
        if !self.config.enabled {
            return Ok(AdmissionDecision::bypass(RateLimitScope::Global));
        }
        if self.is_allowlisted(&ctx.client_id) || self.is_allowlisted(&ctx.ip) {
            debug!(client = %ctx.client_id, "Client allowlisted, bypassing rate limit");
            return Ok(AdmissionDecision::bypass(RateLimitScope::Global));
        }

        let mut checks: Vec<(RateLimitScope, String, LimitConfig)> = vec![
            (RateLimitScope::Global, "all".to_string(), self.config.global),
            (
                RateLimitScope::Tier,
                format!("{}:{}", ctx.tier.as_str(), ctx.client_id),
                self.config.tier_limit(ctx.tier),
            ),
        ];
        if let Some(limit) = self.config.endpoint_limit(class) {
            checks.push((
                RateLimitScope::Endpoint,
                format!("{}:{}", class.as_str(), ctx.client_id),
                limit,
            ));
        }
        checks.push((
            RateLimitScope::Region,
            ctx.region.clone(),
            self.config.region,
        ));
        match class {
            EndpointClass::Analytics => checks.push((
                RateLimitScope::Analytics,
                ctx.client_id.clone(),
                self.config.analytics_limit(ctx.tier),
            )),
            EndpointClass::Proxy => checks.push((
                RateLimitScope::Proxy,
                ctx.client_id.clone(),
                self.config.proxy_limit(ctx.tier),
            )),
            EndpointClass::Export => checks.push((
                RateLimitScope::Export,
                ctx.client_id.clone(),
                self.config.export,
            )),
            _ => {}
        }

        let mut most_restrictive: Option<AdmissionDecision> = None;
        for (scope, key, limit_cfg) in checks {
            let limit = scale_limit(limit_cfg.requests, ratio);
            let window = Duration::from_secs(limit_cfg.window_secs);
            let decision = self.admit(scope, &key, limit, window).await?;
            if !decision.allowed {
                return Ok(decision);
            }
            let tighter = most_restrictive
                .as_ref()
                .is_none_or(|best| decision.remaining < best.remaining);
            if tighter {
                most_restrictive = Some(decision);
            }
        }

        Ok(most_restrictive.unwrap_or_else(|| AdmissionDecision::bypass(RateLimitScope::Global)))
    }
}

/// Applies the adaptive ratio to a configured limit. The effective limit
/// never drops below 1.
fn scale_limit(limit: u32, ratio: f64) -> u32 {
    ((f64::from(limit) * ratio).round() as u32).max(1)
}
