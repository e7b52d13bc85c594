//! DDoS protection service.
//!
//! Records request traces, consults the block set on admission, runs the
//! detectors off the hot path, and places blocks when a signature clears the
//! mitigation gate. All state lives in the shared cache so blocks apply
//! across every worker.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::cache::{Cache, CacheResult};
use crate::clock::{epoch_nanos, SharedClock};
use crate::ratelimit::{subnet24, EndpointClass, TrafficSignal};

use super::{
    detector, AbuseKind, AttackSignature, AttackType, BlockRecord, DdosConfig, Severity,
};

/// DDoS detector and mitigator.
#[derive(Clone)]
pub struct DdosProtector {
    cache: Arc<dyn Cache>,
    clock: SharedClock,
    config: Arc<DdosConfig>,
}

impl DdosProtector {
    /// Creates a new protector.
    #[must_use]
    pub fn new(cache: Arc<dyn Cache>, clock: SharedClock, config: DdosConfig) -> Self {
        Self {
            cache,
            clock,
            config: Arc::new(config),
        }
    }

    /// Returns the configuration for this protector.
    #[must_use]
    pub fn config(&self) -> &DdosConfig {
        &self.config
    }

    fn key(&self, parts: &[&str]) -> String {
        let mut key = self.config.key_prefix.clone();
        for part in parts {
            key.push(':');
            key.push_str(part);
        }
        key
    }

    /// Fire-and-forget trace + detection for an admitted request. Detection
    /// runs on its own task so admission latency never pays for it.
    pub fn observe(&self, client_id: &str, ip: &str, class: EndpointClass) {
        if !self.config.enabled {
            return;
        }
        let this = self.clone();
        let client_id = client_id.to_string();
        let ip = ip.to_string();
        tokio::spawn(async move {
            if let Err(e) = this.record_request(&client_id, &ip, class).await {
                debug!(error = %e, "Failed to record request trace");
                return;
            }
            match this.detect(&client_id, &ip).await {
                Ok(signatures) => {
                    for sig in signatures {
                        if let Err(e) = this.mitigate(&client_id, &ip, &sig).await {
                            warn!(error = %e, attack = %sig.attack_type.as_str(), "Mitigation failed");
                        }
                    }
                }
                Err(e) => debug!(error = %e, "Detector pass failed"),
            }
        });
    }

    /// Appends the request to the per-client, per-IP, and per-subnet traces
    /// and bumps the per-minute volume and endpoint-abuse counters.
    pub async fn record_request(
        &self,
        client_id: &str,
        ip: &str,
        class: EndpointClass,
    ) -> CacheResult<()> {
        let now = self.clock.now();
        let score = epoch_nanos(now) as f64;
        let ttl = Duration::from_secs(self.config.trace_ttl_secs);
        let cutoff = score - self.config.trace_ttl_secs as f64 * 1e9;
        let member = format!("{}-{}", epoch_nanos(now), Uuid::now_v7());

        self.cache
            .sliding_window(&self.key(&["requests", client_id]), cutoff, &member, score, ttl)
            .await?;
        self.cache
            .sliding_window(&self.key(&["ip_requests", ip]), cutoff, &member, score, ttl)
            .await?;
        // Subnet trace dedupes by IP: re-inserting refreshes the score, so
        // cardinality within the window counts distinct active addresses.
        let subnet = subnet24(ip);
        self.cache
            .sliding_window(&self.key(&["subnet", &subnet]), cutoff, ip, score, ttl)
            .await?;

        let minute = now.timestamp() / 60;
        let volume_key = self.key(&["volume", &minute.to_string()]);
        self.cache.incr(&volume_key).await?;
        self.cache.expire(&volume_key, ttl).await?;

        let abuse = match class {
            EndpointClass::Analytics => Some(AbuseKind::AnalyticsSpam),
            EndpointClass::Proxy => Some(AbuseKind::ProxyAbuse),
            EndpointClass::Export => Some(AbuseKind::ExportSpam),
            _ => None,
        };
        if let Some(kind) = abuse {
            let abuse_key = self.key(&["abuse", client_id]);
            self.cache.hash_incr(&abuse_key, kind.as_str(), 1).await?;
            self.cache.expire(&abuse_key, ttl).await?;
        }

        Ok(())
    }

    /// Runs every detector for the client/IP pair.
    pub async fn detect(&self, client_id: &str, ip: &str) -> CacheResult<Vec<AttackSignature>> {
        let now_nanos = epoch_nanos(self.clock.now()) as f64;
        let client_key = self.key(&["requests", client_id]);
        let ip_key = self.key(&["ip_requests", ip]);
        let subnet = subnet24(ip);
        let subnet_key = self.key(&["subnet", &subnet]);
        let abuse_key = self.key(&["abuse", client_id]);

        let mut signatures = Vec::new();
        let cache = self.cache.as_ref();
        let config = &self.config;

        if let Some(sig) = detector::volumetric(cache, config, &client_key, now_nanos).await? {
            signatures.push(sig);
        }
        if let Some(sig) = detector::burst(cache, config, &client_key, now_nanos).await? {
            signatures.push(sig);
        }
        if let Some(sig) = detector::slowloris(cache, config, &ip_key, now_nanos).await? {
            signatures.push(sig);
        }
        if let Some(sig) =
            detector::distributed(cache, config, &subnet_key, &subnet, now_nanos).await?
        {
            signatures.push(sig);
        }
        if let Some(sig) = detector::gaming_abuse(cache, config, &abuse_key).await? {
            signatures.push(sig);
        }

        Ok(signatures)
    }

    /// Whether a signature clears the mitigation gate.
    fn should_mitigate(&self, sig: &AttackSignature) -> bool {
        sig.confidence >= self.config.confidence_gate
            || sig.attack_type == AttackType::Distributed
            || sig.severity >= Severity::High
    }

    /// Block duration for a signature: base, scaled by attack type and by
    /// critical severity.
    #[must_use]
    pub fn block_duration(&self, sig: &AttackSignature) -> Duration {
        let type_factor = match sig.attack_type {
            AttackType::Slowloris => 2,
            AttackType::Distributed => 4,
            _ => 1,
        };
        let severity_factor = if sig.severity == Severity::Critical {
            3
        } else {
            1
        };
        Duration::from_secs(self.config.base_block_secs * type_factor * severity_factor)
    }

    /// Places blocks for a signature when it clears the gate. Returns the
    /// block record that was written, if any.
    pub async fn mitigate(
        &self,
        client_id: &str,
        ip: &str,
        sig: &AttackSignature,
    ) -> CacheResult<Option<BlockRecord>> {
        if !self.should_mitigate(sig) {
            debug!(
                attack = %sig.attack_type.as_str(),
                confidence = sig.confidence,
                "Signature below mitigation gate"
            );
            return Ok(None);
        }

        let duration = self.block_duration(sig);
        let now = self.clock.now();
        let record = BlockRecord {
            client_id: client_id.to_string(),
            reason: sig.detail.clone(),
            attack_type: sig.attack_type,
            severity: sig.severity,
            blocked_until: now.timestamp() + duration.as_secs() as i64,
            source_ip: ip.to_string(),
            request_count: sig.request_count,
        };
        let ttl = duration + Duration::from_secs(self.config.block_ttl_slack_secs);

        self.write_block(&self.key(&["blocked", client_id]), &record, ttl)
            .await?;

        if sig.severity >= Severity::High {
            self.write_block(&self.key(&["blocked", "ip", ip]), &record, ttl)
                .await?;
        }
        if sig.attack_type == AttackType::Distributed && sig.severity >= Severity::High {
            let subnet = subnet24(ip);
            self.write_block(&self.key(&["blocked", "subnet", &subnet]), &record, ttl)
                .await?;
        }
        if sig.severity == Severity::Critical {
            self.cache
                .set_ex(&self.key(&["captcha", ip]), "1", ttl)
                .await?;
        }

        warn!(
            client = %client_id,
            ip = %ip,
            attack = %sig.attack_type.as_str(),
            severity = %sig.severity.as_str(),
            confidence = sig.confidence,
            block_secs = duration.as_secs(),
            "Client blocked by DDoS mitigation"
        );
        Ok(Some(record))
    }

    async fn write_block(
        &self,
        key: &str,
        record: &BlockRecord,
        ttl: Duration,
    ) -> CacheResult<()> {
        self.cache
            .hash_set(
                key,
                &[
                    ("client_id", record.client_id.clone()),
                    ("reason", record.reason.clone()),
                    ("attack_type", record.attack_type.as_str().to_string()),
                    ("severity", record.severity.as_str().to_string()),
                    ("blocked_until", record.blocked_until.to_string()),
                    ("source_ip", record.source_ip.clone()),
                    ("request_count", record.request_count.to_string()),
                ],
                Some(ttl),
            )
            .await
    }

    /// Consults the block set for a client, its IP, and its subnet. Expired
    /// records found before their TTL fires are purged on the spot. Cache
    /// errors read as "not blocked" (admission must not depend on the cache
    /// being up).
    pub async fn check_blocked(&self, client_id: &str, ip: &str) -> Option<BlockRecord> {
        if !self.config.enabled {
            return None;
        }
        let subnet = subnet24(ip);
        for key in [
            self.key(&["blocked", client_id]),
            self.key(&["blocked", "ip", ip]),
            self.key(&["blocked", "subnet", &subnet]),
        ] {
            match self.read_block(&key).await {
                Ok(Some(record)) => return Some(record),
                Ok(None) => {}
                Err(e) => {
                    debug!(error = %e, key = %key, "Block check degraded, allowing");
                    return None;
                }
            }
        }
        None
    }

    async fn read_block(&self, key: &str) -> CacheResult<Option<BlockRecord>> {
        let fields = self.cache.hash_get_all(key).await?;
        if fields.is_empty() {
            return Ok(None);
        }

        let record = BlockRecord {
            client_id: fields.get("client_id").cloned().unwrap_or_default(),
            reason: fields.get("reason").cloned().unwrap_or_default(),
            attack_type: fields
                .get("attack_type")
                .and_then(|v| AttackType::parse(v))
                .unwrap_or(AttackType::Volumetric),
            severity: fields
                .get("severity")
                .and_then(|v| Severity::parse(v))
                .unwrap_or(Severity::Low),
            blocked_until: fields
                .get("blocked_until")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            source_ip: fields.get("source_ip").cloned().unwrap_or_default(),
            request_count: fields
                .get("request_count")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
        };

        if record.blocked_until <= self.clock.now().timestamp() {
            self.cache.del(key).await?;
            return Ok(None);
        }
        Ok(Some(record))
    }

    /// Whether a captcha challenge is required for an IP (set on critical
    /// events).
    pub async fn captcha_required(&self, ip: &str) -> bool {
        self.cache
            .exists(&self.key(&["captcha", ip]))
            .await
            .unwrap_or(false)
    }

    /// Global request volume over the last minute, from the per-minute
    /// counters the recorder maintains.
    pub async fn requests_per_minute(&self) -> u64 {
        let minute = self.clock.now().timestamp() / 60;
        let mut rpm = 0u64;
        for m in [minute, minute - 1] {
            if let Ok(Some(count)) = self
                .cache
                .get_i64(&self.key(&["volume", &m.to_string()]))
                .await
            {
                rpm = rpm.max(count.max(0) as u64);
            }
        }
        rpm
    }
}

#[async_trait]
impl TrafficSignal for DdosProtector {
    /// Traffic-pattern score: global RPM against the alert level.
    async fn traffic_score(&self) -> f64 {
        let rpm = self.requests_per_minute().await;
        (rpm as f64 / self.config.volume_alert_rpm.max(1) as f64).clamp(0.0, 1.0)
    }
}
