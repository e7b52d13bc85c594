//! Circuit breaker trip-and-recovery scenario, fallback behavior, and the
//! transition laws.

mod helpers;

use helpers::clock_and_cache;
use rift_server::circuit::{
    services, CircuitBreaker, CircuitConfig, CircuitGate, CircuitState, FallbackCache,
    HealthProbe,
};

fn scenario_config() -> CircuitConfig {
    CircuitConfig {
        consecutive_threshold: 3,
        open_timeout_secs: 60,
        success_threshold: 2,
        ..CircuitConfig::default()
    }
}

#[tokio::test]
async fn test_trip_deny_recover_scenario() {
    let (clock, cache) = clock_and_cache();
    let breaker = CircuitBreaker::new(cache, clock.clone(), scenario_config());

    // Three consecutive failures trip the circuit.
    for _ in 0..3 {
        breaker.record_failure(services::UPSTREAM, 502, 150).await;
    }
    let record = breaker.record(services::UPSTREAM).await.unwrap();
    assert_eq!(record.state, CircuitState::Open);
    assert_eq!(record.next_retry_at, Some(record.state_changed_at + 60));

    // Requests inside the open timeout fail fast.
    clock.advance(chrono::Duration::seconds(30));
    assert!(matches!(
        breaker.gate(services::UPSTREAM).await,
        CircuitGate::Deny(_)
    ));

    // After the timeout the first caller gets the half-open trial.
    clock.advance(chrono::Duration::seconds(31));
    assert!(matches!(
        breaker.gate(services::UPSTREAM).await,
        CircuitGate::AllowTrial
    ));

    // Two successful trials close the circuit and reset the counters.
    breaker.record_success(services::UPSTREAM, 40).await;
    assert!(matches!(
        breaker.gate(services::UPSTREAM).await,
        CircuitGate::AllowTrial
    ));
    breaker.record_success(services::UPSTREAM, 40).await;

    let record = breaker.record(services::UPSTREAM).await.unwrap();
    assert_eq!(record.state, CircuitState::Closed);
    assert_eq!(record.failure_count, 0);
    assert_eq!(record.consecutive_failures, 0);
    assert!(record.next_retry_at.is_none());
}

#[tokio::test]
async fn test_half_open_failure_reopens_with_fresh_timer() {
    let (clock, cache) = clock_and_cache();
    let breaker = CircuitBreaker::new(cache, clock.clone(), scenario_config());

    for _ in 0..3 {
        breaker.record_failure(services::ANALYTICS, 500, 200).await;
    }
    clock.advance(chrono::Duration::seconds(61));
    assert!(matches!(
        breaker.gate(services::ANALYTICS).await,
        CircuitGate::AllowTrial
    ));

    breaker.record_failure(services::ANALYTICS, 500, 200).await;
    let record = breaker.record(services::ANALYTICS).await.unwrap();
    assert_eq!(record.state, CircuitState::Open);
    assert_eq!(record.next_retry_at, Some(record.state_changed_at + 60));
}

#[tokio::test]
async fn test_open_circuit_serves_cached_fallback() {
    let (clock, cache) = clock_and_cache();
    let breaker = CircuitBreaker::new(cache.clone(), clock.clone(), scenario_config());
    let fallback = FallbackCache::new(
        cache,
        clock.clone(),
        std::sync::Arc::new(scenario_config()),
    );

    // A healthy response is cached, then the service collapses.
    let body = serde_json::json!({"performance_score": 87.5});
    fallback.store(services::ANALYTICS, "/player/p1", &body).await;
    for _ in 0..3 {
        breaker.record_failure(services::ANALYTICS, 500, 900).await;
    }
    assert!(matches!(
        breaker.gate(services::ANALYTICS).await,
        CircuitGate::Deny(_)
    ));

    let cached = fallback
        .get(services::ANALYTICS, "/player/p1")
        .await
        .unwrap();
    assert!(!cached.stale);
    assert_eq!(cached.body, body);

    // Past the freshness window the record is served stale.
    clock.advance(chrono::Duration::seconds(700));
    let stale = fallback
        .get(services::ANALYTICS, "/player/p1")
        .await
        .unwrap();
    assert!(stale.stale);
}

#[tokio::test]
async fn test_probe_reopens_healthy_service() {
    let (clock, cache) = clock_and_cache();
    let breaker = CircuitBreaker::new(cache.clone(), clock.clone(), scenario_config());
    let probe = HealthProbe::new(breaker.clone(), cache);

    for _ in 0..3 {
        breaker.record_failure(services::STORE, 500, 100).await;
    }
    assert_eq!(
        breaker.record(services::STORE).await.unwrap().state,
        CircuitState::Open
    );

    // While failures are recent the probe leaves the circuit open.
    probe.probe_once().await;
    assert_eq!(
        breaker.record(services::STORE).await.unwrap().state,
        CircuitState::Open
    );

    // Once the failure samples age out of the window, the probe forces
    // half-open without waiting for a caller.
    clock.advance(chrono::Duration::seconds(61));
    probe.probe_once().await;
    assert_eq!(
        breaker.record(services::STORE).await.unwrap().state,
        CircuitState::HalfOpen
    );
}

#[tokio::test]
async fn test_error_rate_trip_requires_enough_failures() {
    let (clock, cache) = clock_and_cache();
    let config = CircuitConfig {
        consecutive_threshold: 100,
        failure_threshold: 10,
        ..CircuitConfig::default()
    };
    let breaker = CircuitBreaker::new(cache, clock, config);

    // Alternate failures and successes: error rate 0.5 (not above), then
    // pure failures push the rate over 0.5 with enough total failures.
    for _ in 0..9 {
        breaker.record_failure(services::MATCHES, 500, 100).await;
        breaker.record_success(services::MATCHES, 50).await;
    }
    assert_eq!(
        breaker.record(services::MATCHES).await.unwrap().state,
        CircuitState::Closed
    );

    for _ in 0..5 {
        breaker.record_failure(services::MATCHES, 500, 100).await;
    }
    assert_eq!(
        breaker.record(services::MATCHES).await.unwrap().state,
        CircuitState::Open
    );
}
