//! Fallback response cache.
//!
//! Successful GET responses are stored per `{service}:{path}` with a
//! freshness window. While a circuit is open the stored body is served with
//! a `stale` flag once past its freshness window; the cache entry itself
//! lives twice as long so "stale but present" is representable. When nothing
//! is stored, a per-service degraded default answers instead.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::cache::Cache;
use crate::clock::SharedClock;

use super::{services, CircuitConfig};

/// Stored fallback envelope.
#[derive(Debug, Serialize, Deserialize)]
struct FallbackEnvelope {
    stored_at: i64,
    expires_at: i64,
    body: serde_json::Value,
}

/// A fallback served to a caller while the circuit is open.
#[derive(Debug, Clone, Serialize)]
pub struct FallbackResponse {
    /// The cached response body.
    pub body: serde_json::Value,
    /// True when the freshness window has passed.
    pub stale: bool,
    /// Seconds since the response was stored.
    pub age_secs: u64,
}

/// Best-effort degraded-response buffer; never an authoritative store.
#[derive(Clone)]
pub struct FallbackCache {
    cache: Arc<dyn Cache>,
    clock: SharedClock,
    config: Arc<CircuitConfig>,
}

impl FallbackCache {
    /// Creates a new fallback cache.
    #[must_use]
    pub fn new(cache: Arc<dyn Cache>, clock: SharedClock, config: Arc<CircuitConfig>) -> Self {
        Self {
            cache,
            clock,
            config,
        }
    }

    fn key(&self, service: &str, path: &str) -> String {
        format!("{}:fallback:{service}:{path}", self.config.key_prefix)
    }

    /// Stores a successful response body. Errors are logged and swallowed;
    /// a missed fallback write must never fail the request it shadows.
    pub async fn store(&self, service: &str, path: &str, body: &serde_json::Value) {
        let now = self.clock.now().timestamp();
        let envelope = FallbackEnvelope {
            stored_at: now,
            expires_at: now + self.config.fallback_ttl_secs as i64,
            body: body.clone(),
        };
        let Ok(serialized) = serde_json::to_string(&envelope) else {
            return;
        };
        let ttl = Duration::from_secs(self.config.fallback_ttl_secs * 2);
        if let Err(e) = self.cache.set_ex(&self.key(service, path), &serialized, ttl).await {
            debug!(service = %service, path = %path, error = %e, "Failed to store fallback");
        }
    }

    /// Reads the stored fallback for a path, if any.
    pub async fn get(&self, service: &str, path: &str) -> Option<FallbackResponse> {
        let raw = match self.cache.get(&self.key(service, path)).await {
            Ok(raw) => raw?,
            Err(e) => {
                debug!(service = %service, path = %path, error = %e, "Fallback read failed");
                return None;
            }
        };
        let envelope: FallbackEnvelope = serde_json::from_str(&raw).ok()?;
        let now = self.clock.now().timestamp();
        Some(FallbackResponse {
            body: envelope.body,
            stale: now > envelope.expires_at,
            age_secs: (now - envelope.stored_at).max(0) as u64,
        })
    }

    /// Degraded default served when no fallback is stored.
    #[must_use]
    pub fn degraded_default(service: &str) -> serde_json::Value {
        match service {
            services::ANALYTICS | services::MATCHES => json!({
                "status": "degraded",
                "service": service,
                "message": "Limited data available while the analytics service recovers.",
            }),
            services::UPSTREAM => json!({
                "status": "degraded",
                "service": service,
                "message": "Upstream game-data provider unavailable; consult the provider status page.",
            }),
            services::STORE => json!({
                "status": "degraded",
                "service": service,
                "message": "Match store unavailable; stored matches cannot be read right now.",
            }),
            _ => json!({
                "status": "degraded",
                "service": service,
                "message": "Service temporarily unavailable.",
            }),
        }
    }
}
