//! Analytics engine entry points.

use std::sync::Arc;

use rift_common::RankTier;
use tracing::debug;

use crate::clock::SharedClock;

use super::champions::compute_champion_performance;
use super::insights::build_insights;
use super::metrics::compute_core_metrics;
use super::roles::compute_role_performance;
use super::score::{performance_score, skill_gap};
use super::trends::analyze_trend;
use super::{
    AnalysisDepth, AnalyticsConfig, AnalyticsError, AnalyzeRequest, CoreMetrics, PlayerAnalysis,
    SkillGap,
};

/// Deterministic analytics over match sets. Every output is a pure function
/// of the request, the config snapshot, and the rank; only `analyzed_at` is
/// stamped from the clock.
#[derive(Clone)]
pub struct AnalyticsEngine {
    config: Arc<AnalyticsConfig>,
    clock: SharedClock,
}

impl AnalyticsEngine {
    /// Creates an engine over a config snapshot.
    #[must_use]
    pub fn new(config: AnalyticsConfig, clock: SharedClock) -> Self {
        Self {
            config: Arc::new(config),
            clock,
        }
    }

    /// Returns the configuration for this engine.
    #[must_use]
    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Full player analysis over the request's match set.
    #[tracing::instrument(skip(self, request), fields(puuid = %request.puuid, matches = request.matches.len()))]
    pub fn analyze_player(
        &self,
        request: &AnalyzeRequest,
    ) -> Result<PlayerAnalysis, AnalyticsError> {
        if request.puuid.trim().is_empty() {
            return Err(AnalyticsError::missing_field("puuid"));
        }

        let min = self.config.min_matches_required;
        if request.matches.len() < min {
            return Err(AnalyticsError::InsufficientData(format!(
                "at least {min} matches are required, got {}",
                request.matches.len()
            )));
        }
        let participated = request
            .matches
            .iter()
            .filter(|m| m.participant(&request.puuid).is_some())
            .count();
        if participated < min {
            return Err(AnalyticsError::InsufficientData(format!(
                "at least {min} participated matches are required, got {participated}"
            )));
        }

        // Guarded above; participation implies a computable aggregate.
        let core = compute_core_metrics(&request.matches, &request.puuid).ok_or_else(|| {
            AnalyticsError::InsufficientData(format!(
                "at least {min} participated matches are required, got 0"
            ))
        })?;

        let roles = compute_role_performance(&request.matches, &request.puuid, &self.config);
        let champions =
            compute_champion_performance(&request.matches, &request.puuid, &self.config);
        let trend = analyze_trend(&request.matches, &request.puuid, &self.config);

        let rank = request.rank.as_deref().and_then(RankTier::parse);
        if rank.is_none() {
            debug!(requested = ?request.rank, "Unknown or absent rank, using SILVER thresholds");
        }
        let thresholds = self.config.thresholds_for(rank);
        let score = performance_score(&core, &thresholds, &self.config.weights);

        let insights = (request.depth == AnalysisDepth::Full)
            .then(|| build_insights(&core, &thresholds, &self.config.weights, score));

        Ok(PlayerAnalysis {
            puuid: request.puuid.clone(),
            analyzed_at: self.clock.now(),
            timeframe: request
                .timeframe
                .clone()
                .unwrap_or_else(|| "recent".to_string()),
            matches_analyzed: participated,
            core,
            roles,
            champions,
            trend,
            performance_score: score,
            insights,
        })
    }

    /// Distance between current metrics and a target rank's floors.
    #[must_use]
    pub fn calculate_skill_gap(&self, core: &CoreMetrics, target_rank: RankTier) -> SkillGap {
        let thresholds = self.config.thresholds_for(Some(target_rank));
        skill_gap(core, target_rank, &thresholds, &self.config.weights)
    }
}
