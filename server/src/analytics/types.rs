//! Analytics request and result types.

use chrono::{DateTime, Utc};
use rift_common::{MatchRecord, RankTier, Role};
use serde::{Deserialize, Serialize};

/// How deep an analysis run goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisDepth {
    /// Core metrics and breakdowns only.
    Basic,
    /// Adds trend analysis and the performance score.
    #[default]
    Standard,
    /// Adds insights and coaching output.
    Full,
}

/// Input to a player analysis run.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    /// Player identifier.
    pub puuid: String,
    /// Rank label for threshold normalization; unknown or absent ranks use
    /// the SILVER row.
    pub rank: Option<String>,
    /// The match set to analyze.
    pub matches: Vec<MatchRecord>,
    /// Timeframe label carried through to the result.
    pub timeframe: Option<String>,
    /// Analysis depth.
    #[serde(default)]
    pub depth: AnalysisDepth,
}

/// Per-player aggregate metrics over a match set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreMetrics {
    /// Matches the player actually appeared in.
    pub games: usize,
    pub avg_kills: f64,
    pub avg_deaths: f64,
    pub avg_assists: f64,
    /// (K+A)/max(D,1) over the totals.
    pub avg_kda: f64,
    /// Average creep score (lane plus neutral).
    pub avg_cs: f64,
    /// Average of per-match CS-per-minute ratios.
    pub cs_per_minute: f64,
    pub avg_gold: f64,
    /// Average of per-match `min(gpm/400, 2.0)`.
    pub gold_efficiency: f64,
    pub avg_damage: f64,
    /// Average of per-match shares of team damage.
    pub damage_share: f64,
    pub avg_vision: f64,
    /// Wins over games, in `[0, 1]`.
    pub win_rate: f64,
}

/// Metrics and rating for one role.
#[derive(Debug, Clone, Serialize)]
pub struct RolePerformance {
    pub role: Role,
    pub metrics: CoreMetrics,
    /// Average of per-metric observed/expected ratios, clamped to [0, 100].
    pub rating: f64,
}

/// Metrics, mastery estimate, and trend for one champion.
#[derive(Debug, Clone, Serialize)]
pub struct ChampionPerformance {
    pub champion: String,
    pub metrics: CoreMetrics,
    /// Estimated mastery in 1..=7.
    pub mastery_level: u8,
    /// Win-rate trend between the older and recent half of the games.
    pub trend: TrendLabel,
}

/// Direction of a metric between two periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendLabel {
    Improving,
    Declining,
    Stable,
}

/// One metric's movement between the older and recent slice.
#[derive(Debug, Clone, Serialize)]
pub struct MetricTrend {
    pub metric: &'static str,
    pub previous: f64,
    pub current: f64,
    pub label: TrendLabel,
}

/// Recent-versus-older form analysis.
#[derive(Debug, Clone, Serialize)]
pub struct TrendAnalysis {
    /// Period label; `insufficient_data` below the minimum match count.
    pub period: String,
    pub recent_games: usize,
    pub older_games: usize,
    pub metrics: Vec<MetricTrend>,
    /// Overall direction from the per-metric improvement count.
    pub direction: TrendLabel,
    /// `min(recent/20, 1.0)`; 0 when below the minimum match count.
    pub confidence: f64,
}

/// Playstyle label from the aggression ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Playstyle {
    Aggressive,
    Passive,
    Balanced,
}

/// Skill band from the performance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
    Elite,
}

/// One observed-versus-expected data point.
#[derive(Debug, Clone, Serialize)]
pub struct Insight {
    pub metric: &'static str,
    pub observed: f64,
    pub expected: f64,
    pub message: String,
}

/// Coaching output for a full-depth analysis.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerInsights {
    /// Metrics comfortably above threshold.
    pub strengths: Vec<Insight>,
    /// Metrics below threshold.
    pub improvement_areas: Vec<Insight>,
    /// Template tips keyed off the deficits.
    pub coaching_tips: Vec<String>,
    pub playstyle: Playstyle,
    pub skill_level: SkillLevel,
}

/// Full player analysis envelope.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerAnalysis {
    pub puuid: String,
    /// Stamped from the wall clock; everything else is a pure function of
    /// the inputs.
    pub analyzed_at: DateTime<Utc>,
    pub timeframe: String,
    pub matches_analyzed: usize,
    pub core: CoreMetrics,
    pub roles: Vec<RolePerformance>,
    pub champions: Vec<ChampionPerformance>,
    pub trend: TrendAnalysis,
    /// Weighted score against the rank thresholds, in [0, 100].
    pub performance_score: f64,
    pub insights: Option<PlayerInsights>,
}

/// One metric's distance from a target rank's floor.
#[derive(Debug, Clone, Serialize)]
pub struct MetricGap {
    pub metric: &'static str,
    pub current: f64,
    pub required: f64,
    /// `max(required - current, 0)`.
    pub gap: f64,
    /// Gap as a percentage of the requirement.
    pub gap_pct: f64,
}

/// Distance between current form and a target rank.
#[derive(Debug, Clone, Serialize)]
pub struct SkillGap {
    pub target_rank: RankTier,
    pub gaps: Vec<MetricGap>,
    /// Metric names ordered by largest relative gap.
    pub focus_areas: Vec<&'static str>,
    /// Share of metrics already at or above the target floor, in [0, 1].
    pub readiness: f64,
}
