//! Upstream game-data provider DTOs.

use serde::{Deserialize, Serialize};

/// Summoner account record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summoner {
    /// Encrypted summoner id.
    pub id: String,
    /// Encrypted account id.
    #[serde(default)]
    pub account_id: String,
    /// Player identifier.
    pub puuid: String,
    /// Display name.
    pub name: String,
    #[serde(default)]
    pub profile_icon_id: u32,
    #[serde(default)]
    pub summoner_level: u32,
}

/// Ranked queue standing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedEntry {
    pub queue_type: String,
    pub tier: String,
    pub rank: String,
    pub league_points: u32,
    pub wins: u32,
    pub losses: u32,
}

/// Champion mastery line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChampionMastery {
    pub champion_id: u64,
    pub champion_level: u32,
    pub champion_points: u64,
}

/// One participant of a live game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentGameParticipant {
    pub summoner_name: String,
    pub champion_id: u64,
    pub team_id: u32,
}

/// A game in progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentGame {
    pub game_id: u64,
    pub game_mode: String,
    /// Epoch milliseconds.
    pub game_start_time: i64,
    pub game_length_secs: i64,
    pub participants: Vec<CurrentGameParticipant>,
}

/// Per-match event timeline. Frames are passed through untyped; the core
/// only relays them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchTimeline {
    pub match_id: String,
    pub frame_interval_ms: u64,
    pub frames: serde_json::Value,
}

/// Provider-side rate limit usage, surfaced by the introspection operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamRateLimitInfo {
    /// Raw application limit header, when the provider sent one.
    pub app_limit: Option<String>,
    /// Raw application usage header.
    pub app_count: Option<String>,
    /// Seconds to wait, when the provider throttled the last call.
    pub retry_after_secs: Option<u64>,
}
