//! DDoS detection scenario tests: volumetric confidence, distributed
//! subnet detection at low and high severity, and block expiry.

mod helpers;

use helpers::clock_and_cache;
use rift_server::ddos::{AttackType, DdosConfig, DdosProtector, Severity};
use rift_server::ratelimit::EndpointClass;

fn protector() -> (
    std::sync::Arc<rift_server::clock::ManualClock>,
    DdosProtector,
) {
    let (clock, cache) = clock_and_cache();
    (
        clock.clone(),
        DdosProtector::new(cache, clock, DdosConfig::default()),
    )
}

/// Volumetric detector law: N > 1000 requests in 60 s fire with confidence
/// at least N/3000, capped at 1.
#[tokio::test]
async fn test_volumetric_confidence_law() {
    let (clock, ddos) = protector();
    let n = 1_200u32;
    for _ in 0..n {
        ddos.record_request("bot:v", "203.0.113.30", EndpointClass::Other)
            .await
            .unwrap();
        clock.advance(chrono::Duration::milliseconds(5));
    }

    let signatures = ddos.detect("bot:v", "203.0.113.30").await.unwrap();
    let sig = signatures
        .iter()
        .find(|s| s.attack_type == AttackType::Volumetric)
        .expect("volumetric fires above 1000");
    assert!(sig.confidence >= f64::from(n) / 3_000.0);
    assert!(sig.confidence <= 1.0);
}

/// Distributed detection at 11 IPs: low severity, per-client blocks at 4x
/// the base duration, no subnet-wide block.
#[tokio::test]
async fn test_distributed_low_severity_scenario() {
    let (_clock, ddos) = protector();

    // Eleven distinct IPs in 10.1.2.0/24, one request each.
    for i in 1..=11u8 {
        let ip = format!("10.1.2.{i}");
        ddos.record_request(&ip, &ip, EndpointClass::Other)
            .await
            .unwrap();
    }

    let probe_ip = "10.1.2.5";
    let signatures = ddos.detect(probe_ip, probe_ip).await.unwrap();
    let sig = signatures
        .iter()
        .find(|s| s.attack_type == AttackType::Distributed)
        .expect("distributed fires above 10 IPs");
    assert!((sig.confidence - 11.0 / 50.0).abs() < 1e-9);
    assert_eq!(sig.severity, Severity::Low);

    // Participating clients are blocked for base x4 even below the
    // confidence gate.
    assert_eq!(ddos.block_duration(sig).as_secs(), 900 * 4);
    let record = ddos
        .mitigate(probe_ip, probe_ip, sig)
        .await
        .unwrap()
        .expect("distributed mitigates its participants");
    assert_eq!(record.attack_type, AttackType::Distributed);
    assert!(ddos.check_blocked(probe_ip, probe_ip).await.is_some());

    // Low severity: a fresh client on the same subnet is not swept up.
    assert!(ddos
        .check_blocked("10.1.2.200", "10.1.2.200")
        .await
        .is_none());
}

/// Raising the subnet to more than 30 active IPs promotes the severity to
/// high and adds the subnet-wide block.
#[tokio::test]
async fn test_distributed_high_severity_blocks_subnet() {
    let (_clock, ddos) = protector();

    for i in 1..=31u8 {
        let ip = format!("10.1.2.{i}");
        ddos.record_request(&ip, &ip, EndpointClass::Other)
            .await
            .unwrap();
    }

    let probe_ip = "10.1.2.7";
    let signatures = ddos.detect(probe_ip, probe_ip).await.unwrap();
    let sig = signatures
        .iter()
        .find(|s| s.attack_type == AttackType::Distributed)
        .unwrap();
    assert_eq!(sig.severity, Severity::High);

    ddos.mitigate(probe_ip, probe_ip, sig).await.unwrap();

    // The whole /24 is now rejected, including addresses never seen.
    assert!(ddos
        .check_blocked("10.1.2.250", "10.1.2.250")
        .await
        .is_some());
    // A neighboring subnet is unaffected.
    assert!(ddos.check_blocked("10.1.3.9", "10.1.3.9").await.is_none());
}

/// Blocked clients are rejected before any rate-limit counter and released
/// when the block expires.
#[tokio::test]
async fn test_block_lifecycle() {
    let (clock, ddos) = protector();
    let sig = rift_server::ddos::AttackSignature {
        attack_type: AttackType::Burst,
        severity: Severity::Medium,
        confidence: 0.75,
        request_count: 800,
        detail: "4 high-volume windows, 800 requests in 60s".to_string(),
    };

    ddos.mitigate("bot:b", "203.0.113.31", &sig).await.unwrap();
    let block = ddos
        .check_blocked("bot:b", "203.0.113.31")
        .await
        .expect("blocked");
    assert_eq!(block.attack_type, AttackType::Burst);

    clock.advance(chrono::Duration::seconds(901));
    assert!(ddos.check_blocked("bot:b", "203.0.113.31").await.is_none());
}

/// Gaming-abuse counters accumulate per endpoint class and fire once the
/// summed total crosses the threshold.
#[tokio::test]
async fn test_gaming_abuse_counters() {
    let (_clock, ddos) = protector();

    for _ in 0..60 {
        ddos.record_request("user:g", "203.0.113.32", EndpointClass::Analytics)
            .await
            .unwrap();
    }
    for _ in 0..50 {
        ddos.record_request("user:g", "203.0.113.32", EndpointClass::Export)
            .await
            .unwrap();
    }

    let signatures = ddos.detect("user:g", "203.0.113.32").await.unwrap();
    let sig = signatures
        .iter()
        .find(|s| s.attack_type == AttackType::GamingAbuse)
        .expect("abuse fires above 100 calls");
    assert!((sig.confidence - 110.0 / 500.0).abs() < 1e-9);
}
