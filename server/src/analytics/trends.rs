//! Trend analysis between the recent and older slice of a match set.

use rift_common::MatchRecord;

use super::config::metric;
use super::metrics::compute_core_metrics;
use super::{AnalyticsConfig, CoreMetrics, MetricTrend, TrendAnalysis, TrendLabel};

/// Absolute threshold for rate metrics (five percentage points).
const RATE_DELTA: f64 = 0.05;
/// Relative threshold for value metrics (five percent).
const RELATIVE_DELTA: f64 = 0.05;

/// Classifies a rate (win rate) by absolute difference.
#[must_use]
pub fn rate_trend(older: f64, recent: f64) -> TrendLabel {
    let delta = recent - older;
    if delta > RATE_DELTA {
        TrendLabel::Improving
    } else if delta < -RATE_DELTA {
        TrendLabel::Declining
    } else {
        TrendLabel::Stable
    }
}

/// Classifies a value metric by relative change against the older value.
#[must_use]
pub fn metric_trend(older: f64, recent: f64) -> TrendLabel {
    let base = older.abs().max(f64::EPSILON);
    let change = (recent - older) / base;
    if change > RELATIVE_DELTA {
        TrendLabel::Improving
    } else if change < -RELATIVE_DELTA {
        TrendLabel::Declining
    } else {
        TrendLabel::Stable
    }
}

fn trend_entry(
    name: &'static str,
    older: f64,
    recent: f64,
    is_rate: bool,
) -> MetricTrend {
    MetricTrend {
        metric: name,
        previous: older,
        current: recent,
        label: if is_rate {
            rate_trend(older, recent)
        } else {
            metric_trend(older, recent)
        },
    }
}

/// Splits the participated matches into a recent and an older slice and
/// classifies each tracked metric. Below the minimum match count the result
/// carries zero confidence and the `insufficient_data` period label.
#[must_use]
pub fn analyze_trend(
    matches: &[MatchRecord],
    puuid: &str,
    config: &AnalyticsConfig,
) -> TrendAnalysis {
    let mut participated: Vec<&MatchRecord> = matches
        .iter()
        .filter(|m| m.participant(puuid).is_some())
        .collect();

    if participated.len() < config.min_matches_required {
        return TrendAnalysis {
            period: "insufficient_data".to_string(),
            recent_games: participated.len(),
            older_games: 0,
            metrics: Vec::new(),
            direction: TrendLabel::Stable,
            confidence: 0.0,
        };
    }

    // Newest first; the recent slice is the head.
    participated.sort_by(|a, b| b.game_start.cmp(&a.game_start));
    let recent_len = config.recent_window.min(participated.len() / 2);
    let recent_matches: Vec<MatchRecord> = participated[..recent_len]
        .iter()
        .map(|m| (*m).clone())
        .collect();
    let older_matches: Vec<MatchRecord> = participated[recent_len..]
        .iter()
        .map(|m| (*m).clone())
        .collect();

    let (Some(recent), Some(older)) = (
        compute_core_metrics(&recent_matches, puuid),
        compute_core_metrics(&older_matches, puuid),
    ) else {
        return TrendAnalysis {
            period: "insufficient_data".to_string(),
            recent_games: recent_matches.len(),
            older_games: older_matches.len(),
            metrics: Vec::new(),
            direction: TrendLabel::Stable,
            confidence: 0.0,
        };
    };

    let metrics = tracked_metrics(&older, &recent);
    let improving = metrics
        .iter()
        .filter(|t| t.label == TrendLabel::Improving)
        .count();
    let direction = if improving >= 3 {
        TrendLabel::Improving
    } else if improving <= 1 {
        TrendLabel::Declining
    } else {
        TrendLabel::Stable
    };

    TrendAnalysis {
        period: format!(
            "recent_{}_vs_previous_{}",
            recent_matches.len(),
            older_matches.len()
        ),
        recent_games: recent_matches.len(),
        older_games: older_matches.len(),
        metrics,
        direction,
        confidence: (recent_matches.len() as f64 / 20.0).min(1.0),
    }
}

/// The five metrics the overall direction is derived from.
fn tracked_metrics(older: &CoreMetrics, recent: &CoreMetrics) -> Vec<MetricTrend> {
    vec![
        trend_entry(metric::WIN_RATE, older.win_rate, recent.win_rate, true),
        trend_entry(metric::KDA, older.avg_kda, recent.avg_kda, false),
        trend_entry(
            metric::CS_PER_MINUTE,
            older.cs_per_minute,
            recent.cs_per_minute,
            false,
        ),
        trend_entry(metric::VISION, older.avg_vision, recent.avg_vision, false),
        trend_entry("damage", older.avg_damage, recent.avg_damage, false),
    ]
}
