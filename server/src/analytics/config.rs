//! Analytics configuration: rank thresholds, metric weights, and role
//! expectations. Snapshot at construction; hot-reloading is out of scope.

use std::collections::BTreeMap;

use rift_common::{RankTier, Role};

/// Canonical metric names used across thresholds, weights, trends, and
/// insights.
pub mod metric {
    pub const KDA: &str = "kda";
    pub const CS_PER_MINUTE: &str = "cs_per_minute";
    pub const WIN_RATE: &str = "win_rate";
    pub const DAMAGE_SHARE: &str = "damage_share";
    pub const VISION: &str = "vision";
    pub const GOLD_EFFICIENCY: &str = "gold_efficiency";
}

/// Minimum expected values for the core metrics at one rank.
#[derive(Debug, Clone, Copy)]
pub struct MetricThresholds {
    pub kda: f64,
    pub cs_per_minute: f64,
    pub win_rate: f64,
    pub damage_share: f64,
    pub vision: f64,
    pub gold_efficiency: f64,
}

impl MetricThresholds {
    /// Threshold for a metric by canonical name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        match name {
            metric::KDA => Some(self.kda),
            metric::CS_PER_MINUTE => Some(self.cs_per_minute),
            metric::WIN_RATE => Some(self.win_rate),
            metric::DAMAGE_SHARE => Some(self.damage_share),
            metric::VISION => Some(self.vision),
            metric::GOLD_EFFICIENCY => Some(self.gold_efficiency),
            _ => None,
        }
    }
}

/// Weight per metric for the performance score.
#[derive(Debug, Clone, Copy)]
pub struct MetricWeights {
    pub kda: f64,
    pub cs_per_minute: f64,
    pub win_rate: f64,
    pub damage_share: f64,
    pub vision: f64,
    pub gold_efficiency: f64,
}

impl MetricWeights {
    /// (name, weight) pairs in a stable order.
    #[must_use]
    pub fn entries(&self) -> [(&'static str, f64); 6] {
        [
            (metric::KDA, self.kda),
            (metric::CS_PER_MINUTE, self.cs_per_minute),
            (metric::WIN_RATE, self.win_rate),
            (metric::DAMAGE_SHARE, self.damage_share),
            (metric::VISION, self.vision),
            (metric::GOLD_EFFICIENCY, self.gold_efficiency),
        ]
    }
}

/// Expected values and priority metrics for one role.
#[derive(Debug, Clone)]
pub struct RoleExpectation {
    /// Expected floors for this role.
    pub expected: MetricThresholds,
    /// Metrics that define the role, used for the role rating.
    pub priority: Vec<&'static str>,
}

/// Immutable analytics tunables.
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    /// Minimum participated matches for an analysis.
    pub min_matches_required: usize,
    /// Maximum size of the recent slice in trend analysis.
    pub recent_window: usize,
    /// Games required for a role to appear in the breakdown.
    pub role_min_games: usize,
    /// Games required for a champion to appear in the breakdown.
    pub champion_min_games: usize,
    /// Per-rank metric floors.
    pub rank_thresholds: BTreeMap<RankTier, MetricThresholds>,
    /// Hard default when even the SILVER row is missing.
    pub default_thresholds: MetricThresholds,
    /// Performance-score weights.
    pub weights: MetricWeights,
    /// Per-role expected values.
    pub role_expectations: Vec<(Role, RoleExpectation)>,
}

impl AnalyticsConfig {
    /// Threshold row for a rank: the rank's own row, else SILVER, else the
    /// hard default.
    #[must_use]
    pub fn thresholds_for(&self, rank: Option<RankTier>) -> MetricThresholds {
        rank.and_then(|r| self.rank_thresholds.get(&r).copied())
            .or_else(|| self.rank_thresholds.get(&RankTier::Silver).copied())
            .unwrap_or(self.default_thresholds)
    }

    /// Expectation row for a role, if one is configured.
    #[must_use]
    pub fn expectation_for(&self, role: Role) -> Option<&RoleExpectation> {
        self.role_expectations
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, e)| e)
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        let mut rank_thresholds = BTreeMap::new();
        for (rank, kda, cs, wr, ds, vision, ge) in [
            (RankTier::Iron, 1.2, 3.5, 0.45, 0.15, 8.0, 0.70),
            (RankTier::Bronze, 1.5, 4.0, 0.47, 0.17, 10.0, 0.75),
            (RankTier::Silver, 1.8, 4.8, 0.49, 0.18, 12.0, 0.80),
            (RankTier::Gold, 2.2, 5.5, 0.50, 0.20, 15.0, 0.90),
            (RankTier::Platinum, 2.6, 6.2, 0.51, 0.22, 18.0, 1.00),
            (RankTier::Emerald, 3.0, 6.8, 0.52, 0.23, 22.0, 1.05),
            (RankTier::Diamond, 3.4, 7.4, 0.53, 0.24, 28.0, 1.10),
            (RankTier::Master, 3.8, 8.0, 0.54, 0.25, 35.0, 1.15),
            (RankTier::Grandmaster, 4.2, 8.5, 0.55, 0.26, 42.0, 1.20),
            (RankTier::Challenger, 4.6, 9.0, 0.56, 0.27, 50.0, 1.25),
        ] {
            rank_thresholds.insert(
                rank,
                MetricThresholds {
                    kda,
                    cs_per_minute: cs,
                    win_rate: wr,
                    damage_share: ds,
                    vision,
                    gold_efficiency: ge,
                },
            );
        }

        let lane_expectation = |kda, cs, wr, ds, vision, ge, priority| RoleExpectation {
            expected: MetricThresholds {
                kda,
                cs_per_minute: cs,
                win_rate: wr,
                damage_share: ds,
                vision,
                gold_efficiency: ge,
            },
            priority,
        };

        Self {
            min_matches_required: 10,
            recent_window: 10,
            role_min_games: 3,
            champion_min_games: 2,
            rank_thresholds,
            default_thresholds: MetricThresholds {
                kda: 2.0,
                cs_per_minute: 5.0,
                win_rate: 0.5,
                damage_share: 0.2,
                vision: 15.0,
                gold_efficiency: 0.9,
            },
            weights: MetricWeights {
                kda: 0.20,
                cs_per_minute: 0.20,
                win_rate: 0.25,
                damage_share: 0.15,
                vision: 0.10,
                gold_efficiency: 0.10,
            },
            role_expectations: vec![
                (
                    Role::Top,
                    lane_expectation(
                        2.0,
                        6.5,
                        0.5,
                        0.22,
                        12.0,
                        0.9,
                        vec![metric::CS_PER_MINUTE, metric::KDA, metric::DAMAGE_SHARE],
                    ),
                ),
                (
                    Role::Jungle,
                    lane_expectation(
                        2.5,
                        5.0,
                        0.5,
                        0.18,
                        18.0,
                        0.9,
                        vec![metric::KDA, metric::VISION, metric::WIN_RATE],
                    ),
                ),
                (
                    Role::Middle,
                    lane_expectation(
                        2.5,
                        7.0,
                        0.5,
                        0.26,
                        12.0,
                        0.95,
                        vec![metric::DAMAGE_SHARE, metric::CS_PER_MINUTE, metric::KDA],
                    ),
                ),
                (
                    Role::Bottom,
                    lane_expectation(
                        2.5,
                        7.5,
                        0.5,
                        0.28,
                        10.0,
                        1.0,
                        vec![metric::DAMAGE_SHARE, metric::CS_PER_MINUTE, metric::GOLD_EFFICIENCY],
                    ),
                ),
                (
                    Role::Support,
                    lane_expectation(
                        2.8,
                        1.5,
                        0.5,
                        0.10,
                        35.0,
                        0.7,
                        vec![metric::VISION, metric::KDA, metric::WIN_RATE],
                    ),
                ),
            ],
        }
    }
}
