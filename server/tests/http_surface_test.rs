//! HTTP-Level Surface Tests
//!
//! Exercises the full interceptor chain (latency, auth, class, admission)
//! and the handlers through a real server bound to an ephemeral port. State
//! lives in the memory cache, so no external services are required; the
//! stateful middleware needs a running server rather than `oneshot`.

mod helpers;

use helpers::{baseline_matches, spawn_test_server, test_state};
use rift_server::ratelimit::{LimitConfig, RateLimitConfig};

fn tight_free_tier(requests: u32) -> RateLimitConfig {
    let mut config = RateLimitConfig::default();
    config.tiers.free = LimitConfig {
        requests,
        window_secs: 60,
    };
    config
}

#[tokio::test]
async fn test_health_reports_operations_and_circuits() {
    let (_clock, state) = test_state(RateLimitConfig::default());
    let server = spawn_test_server(state).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/health", server.url))
        .send()
        .await
        .expect("health request");
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.expect("health body");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["operations"]["GetPlayerAnalytics"], "SERVING");
    assert_eq!(body["circuits"]["analytics"], "closed");
}

#[tokio::test]
async fn test_player_analytics_envelope_and_headers() {
    let (_clock, state) = test_state(RateLimitConfig::default());
    let server = spawn_test_server(state).await;
    let client = reqwest::Client::new();

    let request = serde_json::json!({
        "puuid": "player-1",
        "rank": "GOLD",
        "timeframe": "recent",
        "matches": baseline_matches("player-1", 10),
    });
    let resp = client
        .post(format!("{}/api/analytics/player", server.url))
        .json(&request)
        .send()
        .await
        .expect("analytics request");
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()
            .get("X-Circuit-State")
            .and_then(|v| v.to_str().ok()),
        Some("closed")
    );
    assert!(resp.headers().contains_key("X-RateLimit-Remaining"));
    assert_eq!(
        resp.headers()
            .get("X-RateLimit-Tier")
            .and_then(|v| v.to_str().ok()),
        Some("free")
    );

    let body: serde_json::Value = resp.json().await.expect("analytics body");
    assert_eq!(body["data"]["core"]["win_rate"], 1.0);
    assert_eq!(body["meta"]["api_version"], "v1");
    assert_eq!(body["meta"]["cache_status"], "live");
}

#[tokio::test]
async fn test_missing_field_is_invalid_argument() {
    let (_clock, state) = test_state(RateLimitConfig::default());
    let server = spawn_test_server(state).await;
    let client = reqwest::Client::new();

    let request = serde_json::json!({
        "puuid": "",
        "matches": [],
    });
    let resp = client
        .post(format!("{}/api/analytics/player", server.url))
        .json(&request)
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 400);

    let body: serde_json::Value = resp.json().await.expect("body");
    assert_eq!(body["error"], "invalid_argument");
    assert_eq!(body["field"], "puuid");
}

#[tokio::test]
async fn test_insufficient_data_reported() {
    let (_clock, state) = test_state(RateLimitConfig::default());
    let server = spawn_test_server(state).await;
    let client = reqwest::Client::new();

    let request = serde_json::json!({
        "puuid": "player-1",
        "matches": baseline_matches("player-1", 9),
    });
    let resp = client
        .post(format!("{}/api/analytics/player", server.url))
        .json(&request)
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 422);

    let body: serde_json::Value = resp.json().await.expect("body");
    assert_eq!(body["error"], "insufficient_data");
    assert!(body["message"].as_str().unwrap().contains("at least 10"));
}

#[tokio::test]
async fn test_rate_limit_denial_over_http() {
    let (_clock, state) = test_state(tight_free_tier(3));
    let server = spawn_test_server(state).await;
    let client = reqwest::Client::new();

    let request = serde_json::json!({
        "current": {
            "games": 10, "avg_kills": 5.0, "avg_deaths": 4.0, "avg_assists": 6.0,
            "avg_kda": 2.75, "avg_cs": 180.0, "cs_per_minute": 6.0, "avg_gold": 12000.0,
            "gold_efficiency": 1.0, "avg_damage": 18000.0, "damage_share": 0.22,
            "avg_vision": 18.0, "win_rate": 0.55
        },
        "target_rank": "DIAMOND",
    });

    for _ in 0..3 {
        let resp = client
            .post(format!("{}/api/analytics/skill-gap", server.url))
            .json(&request)
            .send()
            .await
            .expect("request");
        assert_eq!(resp.status(), 200);
    }

    let denied = client
        .post(format!("{}/api/analytics/skill-gap", server.url))
        .json(&request)
        .send()
        .await
        .expect("request");
    assert_eq!(denied.status(), 429);
    assert!(denied.headers().contains_key("Retry-After"));
    assert_eq!(
        denied
            .headers()
            .get("X-RateLimit-Remaining")
            .and_then(|v| v.to_str().ok()),
        Some("0")
    );

    let body: serde_json::Value = denied.json().await.expect("body");
    assert_eq!(body["error"], "rate_limited");
    assert_eq!(body["tier"], "free");
    assert!(body["upgrade_hint"].is_string());
}

#[tokio::test]
async fn test_unconfigured_store_is_unavailable() {
    let (_clock, state) = test_state(RateLimitConfig::default());
    let server = spawn_test_server(state).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/api/matches/RIFT_404", server.url))
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), 503);

    let body: serde_json::Value = resp.json().await.expect("body");
    assert_eq!(body["error"], "unavailable");
    assert_eq!(body["service"], "store");
}
