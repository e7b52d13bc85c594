//! Performance score and skill gap against rank thresholds.

use rift_common::RankTier;

use super::metrics::metric_value;
use super::{CoreMetrics, MetricGap, MetricThresholds, MetricWeights, SkillGap};

/// Weighted average of `min(observed/threshold * 100, 100)` across the
/// weighted metrics, normalized by the weight sum and clamped to [0, 100].
#[must_use]
pub fn performance_score(
    core: &CoreMetrics,
    thresholds: &MetricThresholds,
    weights: &MetricWeights,
) -> f64 {
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for (name, weight) in weights.entries() {
        if weight <= 0.0 {
            continue;
        }
        let Some(observed) = metric_value(core, name) else {
            continue;
        };
        let Some(threshold) = thresholds.get(name) else {
            continue;
        };
        let attainment = if threshold <= 0.0 {
            100.0
        } else {
            (observed / threshold * 100.0).min(100.0)
        };
        weighted_sum += attainment * weight;
        weight_total += weight;
    }

    if weight_total <= 0.0 {
        return 0.0;
    }
    (weighted_sum / weight_total).clamp(0.0, 100.0)
}

/// Distance from current form to a target rank's floors.
#[must_use]
pub fn skill_gap(
    core: &CoreMetrics,
    target_rank: RankTier,
    thresholds: &MetricThresholds,
    weights: &MetricWeights,
) -> SkillGap {
    let mut gaps = Vec::new();
    let mut met = 0usize;
    let mut tracked = 0usize;

    for (name, _) in weights.entries() {
        let Some(current) = metric_value(core, name) else {
            continue;
        };
        let Some(required) = thresholds.get(name) else {
            continue;
        };
        tracked += 1;
        let gap = (required - current).max(0.0);
        if gap <= 0.0 {
            met += 1;
        }
        let gap_pct = if required <= 0.0 {
            0.0
        } else {
            gap / required * 100.0
        };
        gaps.push(MetricGap {
            metric: name,
            current,
            required,
            gap,
            gap_pct,
        });
    }

    let mut focus: Vec<(&'static str, f64)> = gaps
        .iter()
        .filter(|g| g.gap > 0.0)
        .map(|g| (g.metric, g.gap_pct))
        .collect();
    focus.sort_by(|a, b| b.1.total_cmp(&a.1));

    SkillGap {
        target_rank,
        gaps,
        focus_areas: focus.into_iter().map(|(name, _)| name).collect(),
        readiness: if tracked == 0 {
            0.0
        } else {
            met as f64 / tracked as f64
        },
    }
}
