//! HTTP client for the upstream game-data provider.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use rift_common::MatchRecord;

use super::{
    ChampionMastery, CurrentGame, GameDataProvider, MatchTimeline, RankedEntry, Summoner,
    UpstreamError, UpstreamRateLimitInfo,
};

/// Default per-call timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Reqwest-backed provider. The api key travels in the provider's token
/// header; rate-limit usage headers from the last response are retained for
/// the introspection operation.
pub struct HttpProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    last_rate_limit: Mutex<UpstreamRateLimitInfo>,
}

impl HttpProvider {
    /// Creates a provider against `base_url`.
    pub fn new(base_url: &str, api_key: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            last_rate_limit: Mutex::new(UpstreamRateLimitInfo::default()),
        })
    }

    fn remember_rate_limit(&self, response: &reqwest::Response, retry_after: Option<u64>) {
        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };
        if let Ok(mut info) = self.last_rate_limit.lock() {
            info.app_limit = header("X-App-Rate-Limit").or(info.app_limit.take());
            info.app_count = header("X-App-Rate-Limit-Count").or(info.app_count.take());
            info.retry_after_secs = retry_after;
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, UpstreamError> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "Upstream GET");

        let response = self
            .http
            .get(&url)
            .header("X-Riot-Token", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %url, error = %e, "Upstream request failed");
                UpstreamError::Unavailable(e.to_string())
            })?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                self.remember_rate_limit(&response, None);
                Err(UpstreamError::NotFound)
            }
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after_secs = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(1);
                self.remember_rate_limit(&response, Some(retry_after_secs));
                Err(UpstreamError::RateLimited { retry_after_secs })
            }
            status if status.is_server_error() => {
                self.remember_rate_limit(&response, None);
                Err(UpstreamError::Unavailable(format!("upstream returned {status}")))
            }
            status if !status.is_success() => {
                self.remember_rate_limit(&response, None);
                Err(UpstreamError::Unavailable(format!("upstream returned {status}")))
            }
            _ => {
                self.remember_rate_limit(&response, None);
                response
                    .json()
                    .await
                    .map_err(|e| UpstreamError::Decode(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl GameDataProvider for HttpProvider {
    async fn get_summoner_by_name(&self, name: &str) -> Result<Summoner, UpstreamError> {
        self.get_json(&format!("/summoner/v4/summoners/by-name/{name}"))
            .await
    }

    async fn get_summoner_by_puuid(&self, puuid: &str) -> Result<Summoner, UpstreamError> {
        self.get_json(&format!("/summoner/v4/summoners/by-puuid/{puuid}"))
            .await
    }

    async fn get_summoner_by_id(&self, id: &str) -> Result<Summoner, UpstreamError> {
        self.get_json(&format!("/summoner/v4/summoners/{id}")).await
    }

    async fn get_match_history(
        &self,
        puuid: &str,
        count: usize,
    ) -> Result<Vec<String>, UpstreamError> {
        self.get_json(&format!("/match/v5/matches/by-puuid/{puuid}/ids?count={count}"))
            .await
    }

    async fn get_match(&self, match_id: &str) -> Result<MatchRecord, UpstreamError> {
        self.get_json(&format!("/match/v5/matches/{match_id}")).await
    }

    async fn get_match_timeline(&self, match_id: &str) -> Result<MatchTimeline, UpstreamError> {
        self.get_json(&format!("/match/v5/matches/{match_id}/timeline"))
            .await
    }

    async fn get_current_game(&self, summoner_id: &str) -> Result<CurrentGame, UpstreamError> {
        self.get_json(&format!("/spectator/v4/active-games/by-summoner/{summoner_id}"))
            .await
    }

    async fn get_champion_mastery(
        &self,
        summoner_id: &str,
    ) -> Result<Vec<ChampionMastery>, UpstreamError> {
        self.get_json(&format!(
            "/champion-mastery/v4/champion-masteries/by-summoner/{summoner_id}"
        ))
        .await
    }

    async fn get_ranked_stats(&self, summoner_id: &str) -> Result<Vec<RankedEntry>, UpstreamError> {
        self.get_json(&format!("/league/v4/entries/by-summoner/{summoner_id}"))
            .await
    }

    async fn get_rate_limit_info(&self) -> Result<UpstreamRateLimitInfo, UpstreamError> {
        Ok(self
            .last_rate_limit
            .lock()
            .map(|info| info.clone())
            .unwrap_or_default())
    }
}
