//! DDoS detection and mitigation.
//!
//! Every admitted request is traced per client, per IP, and per /24 subnet.
//! Detectors run asynchronously over the traces and emit signatures with a
//! confidence and severity; signatures clearing the mitigation gate place
//! temporary blocks that admission consults before any rate-limit counter is
//! touched.

pub mod config;
pub mod detector;
pub mod error;
pub mod protector;
pub mod types;

pub use config::*;
pub use error::*;
pub use protector::*;
pub use types::*;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use crate::cache::MemoryCache;
    use crate::clock::ManualClock;
    use crate::ratelimit::EndpointClass;

    use super::*;

    fn protector() -> (Arc<ManualClock>, DdosProtector) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let cache = Arc::new(MemoryCache::new(clock.clone()));
        (
            clock.clone(),
            DdosProtector::new(cache, clock, DdosConfig::default()),
        )
    }

    #[tokio::test]
    async fn test_quiet_client_produces_no_signatures() {
        let (_clock, ddos) = protector();
        for _ in 0..5 {
            ddos.record_request("user:1", "203.0.113.7", EndpointClass::Other)
                .await
                .unwrap();
        }
        let signatures = ddos.detect("user:1", "203.0.113.7").await.unwrap();
        assert!(signatures.is_empty());
    }

    #[tokio::test]
    async fn test_volumetric_detection_confidence() {
        let (clock, ddos) = protector();
        // 1500 requests spread over the minute.
        for _ in 0..1_500 {
            ddos.record_request("bot:1", "203.0.113.8", EndpointClass::Other)
                .await
                .unwrap();
            clock.advance(chrono::Duration::milliseconds(10));
        }
        let signatures = ddos.detect("bot:1", "203.0.113.8").await.unwrap();
        let sig = signatures
            .iter()
            .find(|s| s.attack_type == AttackType::Volumetric)
            .expect("volumetric signature");
        assert!(sig.confidence >= 1_500.0 / 3_000.0);
        assert!(sig.confidence <= 1.0);
    }

    #[tokio::test]
    async fn test_block_and_expiry() {
        let (clock, ddos) = protector();
        let sig = AttackSignature {
            attack_type: AttackType::Volumetric,
            severity: Severity::Medium,
            confidence: 0.8,
            request_count: 2_400,
            detail: "2400 requests in 60s".to_string(),
        };

        let record = ddos
            .mitigate("bot:2", "203.0.113.9", &sig)
            .await
            .unwrap()
            .expect("block placed");
        assert_eq!(record.attack_type, AttackType::Volumetric);

        // Blocked while the record is live.
        assert!(ddos.check_blocked("bot:2", "203.0.113.9").await.is_some());

        // 15-minute base block expires.
        clock.advance(chrono::Duration::seconds(901));
        assert!(ddos.check_blocked("bot:2", "203.0.113.9").await.is_none());
    }

    #[tokio::test]
    async fn test_low_confidence_not_mitigated() {
        let (_clock, ddos) = protector();
        let sig = AttackSignature {
            attack_type: AttackType::Volumetric,
            severity: Severity::Low,
            confidence: 0.4,
            request_count: 1_200,
            detail: "1200 requests in 60s".to_string(),
        };
        assert!(ddos
            .mitigate("bot:3", "203.0.113.10", &sig)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_critical_blocks_ip_and_sets_captcha() {
        let (_clock, ddos) = protector();
        let sig = AttackSignature {
            attack_type: AttackType::Volumetric,
            severity: Severity::Critical,
            confidence: 1.0,
            request_count: 4_000,
            detail: "4000 requests in 60s".to_string(),
        };
        ddos.mitigate("bot:4", "203.0.113.11", &sig).await.unwrap();

        // Another client from the same IP is also rejected.
        assert!(ddos.check_blocked("other:9", "203.0.113.11").await.is_some());
        assert!(ddos.captcha_required("203.0.113.11").await);
    }

    #[tokio::test]
    async fn test_critical_triples_block_duration() {
        let (_clock, ddos) = protector();
        let critical = AttackSignature {
            attack_type: AttackType::Slowloris,
            severity: Severity::Critical,
            confidence: 0.6,
            request_count: 900,
            detail: "900 connections".to_string(),
        };
        // Slowloris x2, critical x3.
        assert_eq!(
            ddos.block_duration(&critical).as_secs(),
            900 * 2 * 3
        );
    }
}
