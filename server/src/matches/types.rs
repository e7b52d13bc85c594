//! Match analysis types.

use chrono::{DateTime, Utc};
use rift_common::{MatchRecord, Role};
use serde::{Deserialize, Serialize};

use crate::analytics::TrendLabel;

/// Optional stages of the per-match pipeline.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct AnalysisOptions {
    /// Phase decomposition (lane / mid / late).
    #[serde(default = "default_true")]
    pub phases: bool,
    /// Key-moment detection.
    #[serde(default = "default_true")]
    pub key_moments: bool,
    /// Team-contribution breakdown.
    #[serde(default = "default_true")]
    pub team_contribution: bool,
}

const fn default_true() -> bool {
    true
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            phases: true,
            key_moments: true,
            team_contribution: true,
        }
    }
}

/// Input to a single-match analysis.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchAnalysisRequest {
    /// Player to analyze.
    pub puuid: String,
    /// The match record.
    pub record: MatchRecord,
    /// Pipeline options.
    #[serde(default)]
    pub options: AnalysisOptions,
}

/// Single-match performance line for one player.
#[derive(Debug, Clone, Serialize)]
pub struct MatchPerformance {
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub kda: f64,
    pub cs: u32,
    pub cs_per_minute: f64,
    pub gold: u32,
    pub gold_efficiency: f64,
    pub damage: u64,
    pub damage_share: f64,
    pub vision: u32,
    pub role: Role,
    pub champion: String,
    pub win: bool,
}

/// Game phase boundaries at 15 and 25 minutes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    Lane,
    Mid,
    Late,
}

impl GamePhase {
    /// String identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lane => "lane",
            Self::Mid => "mid",
            Self::Late => "late",
        }
    }
}

/// Approximated per-phase stat line.
#[derive(Debug, Clone, Serialize)]
pub struct PhasePerformance {
    pub phase: GamePhase,
    /// Phase duration in seconds.
    pub duration_secs: u32,
    pub kills: f64,
    pub deaths: f64,
    pub assists: f64,
    pub cs: f64,
    pub gold: f64,
    pub damage: f64,
    /// Phase rating on [0, 100].
    pub rating: f64,
}

/// Phase decomposition output.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseAnalysis {
    pub phases: Vec<PhasePerformance>,
    pub strongest: GamePhase,
    pub weakest: GamePhase,
    /// `100 - 2 x stddev(phase ratings)`, floored at 0.
    pub consistency: f64,
}

/// A notable event reconstructed from the participant flags.
#[derive(Debug, Clone, Serialize)]
pub struct KeyMoment {
    pub moment_type: &'static str,
    /// Positive or negative impact on the game.
    pub positive: bool,
    /// Importance on a 1-10 scale; output is sorted descending.
    pub importance: u8,
    pub description: String,
    pub learning_point: String,
}

/// Share of the team's output contributed by the player.
#[derive(Debug, Clone, Serialize)]
pub struct TeamContribution {
    pub damage_share: f64,
    /// Kills and assists over team kills.
    pub kill_participation: f64,
    pub objective_participation: f64,
    pub vision_share: f64,
}

/// Full single-match analysis.
#[derive(Debug, Clone, Serialize)]
pub struct MatchAnalysisResult {
    pub match_id: String,
    pub puuid: String,
    pub analyzed_at: DateTime<Utc>,
    pub performance: MatchPerformance,
    pub phases: Option<PhaseAnalysis>,
    pub key_moments: Vec<KeyMoment>,
    pub team_contribution: Option<TeamContribution>,
    pub insights: Vec<String>,
    pub learning_opportunities: Vec<String>,
    /// Overall match rating on [0, 100].
    pub rating: f64,
}

/// Win/loss streak at the end of a series.
#[derive(Debug, Clone, Serialize)]
pub struct StreakInfo {
    pub winning: bool,
    pub length: usize,
}

/// A grouped pattern by champion or role.
#[derive(Debug, Clone, Serialize)]
pub struct PlayPattern {
    pub label: String,
    pub games: usize,
    pub win_rate: f64,
    pub avg_rating: f64,
}

/// Spread of one metric across a series.
#[derive(Debug, Clone, Serialize)]
pub struct MetricConsistency {
    pub metric: &'static str,
    pub mean: f64,
    pub stddev: f64,
    /// 100 for perfectly flat, lower with higher relative spread.
    pub consistency: f64,
}

/// Series-level analysis over several matches.
#[derive(Debug, Clone, Serialize)]
pub struct MatchSeriesAnalysis {
    pub puuid: String,
    pub matches_analyzed: usize,
    /// Per-match ratings, oldest first.
    pub ratings: Vec<f64>,
    /// Trend over the most recent three ratings.
    pub trend: TrendLabel,
    pub best_match_id: Option<String>,
    pub worst_match_id: Option<String>,
    pub streak: Option<StreakInfo>,
    /// Standard deviation of the ratings.
    pub volatility: f64,
    pub champion_patterns: Vec<PlayPattern>,
    pub role_patterns: Vec<PlayPattern>,
    pub consistency: Vec<MetricConsistency>,
    /// Learning opportunities recurring across the series.
    pub priorities: Vec<String>,
}

/// Direction of one compared metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComparisonDirection {
    Improved,
    Declined,
    Same,
}

/// Magnitude band of a change (by 5/10/20 percent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComparisonSignificance {
    Minor,
    Moderate,
    Major,
}

/// One metric compared between two matches.
#[derive(Debug, Clone, Serialize)]
pub struct MetricComparison {
    pub metric: &'static str,
    pub before: f64,
    pub after: f64,
    pub change: f64,
    pub change_pct: f64,
    pub direction: ComparisonDirection,
    pub significance: ComparisonSignificance,
}

/// Overall label of a two-match comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ComparisonLabel {
    Improved,
    Declined,
    Similar,
}

/// Two-match comparison output.
#[derive(Debug, Clone, Serialize)]
pub struct MatchComparisonResult {
    pub puuid: String,
    pub first_match_id: String,
    pub second_match_id: String,
    pub metrics: Vec<MetricComparison>,
    pub rating_delta: f64,
    pub overall: ComparisonLabel,
}
