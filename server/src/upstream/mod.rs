//! Upstream game-data provider port.
//!
//! The analytics core consumes match and account data from an external
//! provider. The port is a capability set; the HTTP backend is selected at
//! wire-up and handlers only see the trait.

pub mod client;
pub mod error;
pub mod types;

use async_trait::async_trait;
use rift_common::MatchRecord;

pub use client::HttpProvider;
pub use error::UpstreamError;
pub use types::*;

/// Capability set of the upstream game-data provider.
#[async_trait]
pub trait GameDataProvider: Send + Sync + 'static {
    async fn get_summoner_by_name(&self, name: &str) -> Result<Summoner, UpstreamError>;
    async fn get_summoner_by_puuid(&self, puuid: &str) -> Result<Summoner, UpstreamError>;
    async fn get_summoner_by_id(&self, id: &str) -> Result<Summoner, UpstreamError>;

    /// Recent match identifiers for a player, newest first.
    async fn get_match_history(
        &self,
        puuid: &str,
        count: usize,
    ) -> Result<Vec<String>, UpstreamError>;
    async fn get_match(&self, match_id: &str) -> Result<MatchRecord, UpstreamError>;
    async fn get_match_timeline(&self, match_id: &str) -> Result<MatchTimeline, UpstreamError>;
    async fn get_current_game(&self, summoner_id: &str) -> Result<CurrentGame, UpstreamError>;
    async fn get_champion_mastery(
        &self,
        summoner_id: &str,
    ) -> Result<Vec<ChampionMastery>, UpstreamError>;
    async fn get_ranked_stats(&self, summoner_id: &str) -> Result<Vec<RankedEntry>, UpstreamError>;

    /// Provider-side rate limit usage observed on recent calls.
    async fn get_rate_limit_info(&self) -> Result<UpstreamRateLimitInfo, UpstreamError>;
}
