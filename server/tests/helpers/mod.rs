//! Shared test fixtures: deterministic clock/cache wiring and match
//! builders.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use rift_common::{MatchRecord, ParticipantRecord, QueueId};
use rift_server::analytics::AnalyticsConfig;
use rift_server::api::{create_router, AppState, AppStateConfig};
use rift_server::cache::MemoryCache;
use rift_server::circuit::CircuitConfig;
use rift_server::clock::ManualClock;
use rift_server::config::Config;
use rift_server::ddos::DdosConfig;
use rift_server::matches::MatchAnalyzerConfig;
use rift_server::ratelimit::RateLimitConfig;

/// A manual clock plus the memory cache reading from it.
pub fn clock_and_cache() -> (Arc<ManualClock>, Arc<MemoryCache>) {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let cache = Arc::new(MemoryCache::new(clock.clone()));
    (clock, cache)
}

/// A baseline participant: 10/2/10, 240 CS in 30 minutes, 20k damage,
/// vision 20, 15k gold.
pub fn baseline_participant(puuid: &str, team_id: u32, win: bool) -> ParticipantRecord {
    ParticipantRecord {
        puuid: puuid.to_string(),
        team_id,
        role_tag: "MID".to_string(),
        champion: "Ahri".to_string(),
        kills: 10,
        deaths: 2,
        assists: 10,
        minions_killed: 200,
        neutral_minions_killed: 40,
        gold_earned: 15_000,
        gold_spent: 14_000,
        damage_to_champions: 20_000,
        vision_score: 20,
        dragon_takedowns: 1,
        baron_takedowns: 0,
        turret_takedowns: 2,
        inhibitor_takedowns: 0,
        double_kills: 0,
        triple_kills: 0,
        quadra_kills: 0,
        penta_kills: 0,
        first_blood_kill: false,
        first_blood_assist: false,
        win,
    }
}

/// A 30-minute win for `puuid` where the team deals 80k damage in total
/// (the player's 20k is a 0.25 share).
pub fn baseline_match(match_id: &str, puuid: &str, game_start: DateTime<Utc>) -> MatchRecord {
    let ally = |name: &str| ParticipantRecord {
        puuid: name.to_string(),
        damage_to_champions: 20_000,
        ..baseline_participant(name, 100, true)
    };
    MatchRecord {
        match_id: match_id.to_string(),
        game_duration_secs: 1_800,
        game_start,
        queue_id: QueueId::RANKED_SOLO,
        participants: vec![
            baseline_participant(puuid, 100, true),
            ally("ally-1"),
            ally("ally-2"),
            ally("ally-3"),
            ParticipantRecord {
                role_tag: "TOP".to_string(),
                ..baseline_participant("enemy-1", 200, false)
            },
        ],
    }
}

/// `count` baseline wins spaced one day apart, newest last.
pub fn baseline_matches(puuid: &str, count: usize) -> Vec<MatchRecord> {
    let start = Utc::now() - Duration::days(count as i64);
    (0..count)
        .map(|i| {
            baseline_match(
                &format!("RIFT_{i}"),
                puuid,
                start + Duration::days(i as i64),
            )
        })
        .collect()
}

/// Application state over the memory cache and a manual clock, for
/// HTTP-level tests without external services.
pub fn test_state(rate_limit: RateLimitConfig) -> (Arc<ManualClock>, AppState) {
    let (clock, cache) = clock_and_cache();
    let state = AppState::new(AppStateConfig {
        config: Config::default_for_test(),
        cache,
        clock: clock.clone(),
        store: None,
        provider: None,
        rate_limit,
        ddos: DdosConfig::default(),
        circuit: CircuitConfig::default(),
        analytics: AnalyticsConfig::default(),
        match_analyzer: MatchAnalyzerConfig::default(),
    });
    (clock, state)
}

/// A running test server bound to an ephemeral port.
pub struct TestServer {
    pub url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Spawns the router on 127.0.0.1:0 and returns its base URL.
pub async fn spawn_test_server(state: AppState) -> TestServer {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");

    let handle = tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("test server");
    });

    TestServer {
        url: format!("http://{addr}"),
        handle,
    }
}
