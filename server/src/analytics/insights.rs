//! Insight generation: strengths, improvement areas, coaching tips,
//! playstyle, and skill band.

use super::config::metric;
use super::metrics::metric_value;
use super::{
    CoreMetrics, Insight, MetricThresholds, MetricWeights, Playstyle, PlayerInsights, SkillLevel,
};

/// Multiplier above the threshold for a metric to count as a strength.
const STRENGTH_MARGIN: f64 = 1.15;

/// Coaching template for a deficient metric.
fn coaching_tip(name: &str) -> Option<&'static str> {
    match name {
        metric::KDA => Some(
            "Look for safer trade windows and respawn timers before fighting; deaths cost more than kills earn.",
        ),
        metric::CS_PER_MINUTE => Some(
            "Practice last-hitting under tower and catch side waves between objectives to raise CS per minute.",
        ),
        metric::WIN_RATE => Some(
            "Review your recent losses for repeated mistakes in the first ten minutes; early deficits decide most games.",
        ),
        metric::DAMAGE_SHARE => Some(
            "Position to hit the frontline consistently in teamfights instead of waiting for a perfect flank.",
        ),
        metric::VISION => Some(
            "Buy control wards on every back and trade lane wards toward the side of the next objective.",
        ),
        metric::GOLD_EFFICIENCY => Some(
            "Convert leads into objectives and item spikes faster; idle gold is wasted tempo.",
        ),
        _ => None,
    }
}

/// Playstyle from the aggression ratio `(kills + assists) / max(deaths, 0.1)`.
#[must_use]
pub fn playstyle(core: &CoreMetrics) -> Playstyle {
    let ratio = (core.avg_kills + core.avg_assists) / core.avg_deaths.max(0.1);
    if ratio >= 4.0 {
        Playstyle::Aggressive
    } else if ratio <= 2.0 {
        Playstyle::Passive
    } else {
        Playstyle::Balanced
    }
}

/// Step function over the performance score.
#[must_use]
pub fn skill_level(performance_score: f64) -> SkillLevel {
    if performance_score >= 90.0 {
        SkillLevel::Elite
    } else if performance_score >= 75.0 {
        SkillLevel::Expert
    } else if performance_score >= 60.0 {
        SkillLevel::Advanced
    } else if performance_score >= 40.0 {
        SkillLevel::Intermediate
    } else {
        SkillLevel::Beginner
    }
}

/// Builds the coaching insights for a full-depth analysis.
#[must_use]
pub fn build_insights(
    core: &CoreMetrics,
    thresholds: &MetricThresholds,
    weights: &MetricWeights,
    performance_score: f64,
) -> PlayerInsights {
    let mut strengths = Vec::new();
    let mut improvement_areas = Vec::new();
    let mut coaching_tips = Vec::new();

    for (name, _) in weights.entries() {
        let Some(observed) = metric_value(core, name) else {
            continue;
        };
        let Some(expected) = thresholds.get(name) else {
            continue;
        };

        if expected > 0.0 && observed >= expected * STRENGTH_MARGIN {
            strengths.push(Insight {
                metric: name,
                observed,
                expected,
                message: format!("{name} is well above the expected {expected:.2}"),
            });
        } else if observed < expected {
            improvement_areas.push(Insight {
                metric: name,
                observed,
                expected,
                message: format!("{name} is below the expected {expected:.2}"),
            });
            if let Some(tip) = coaching_tip(name) {
                coaching_tips.push(tip.to_string());
            }
        }
    }

    PlayerInsights {
        strengths,
        improvement_areas,
        coaching_tips,
        playstyle: playstyle(core),
        skill_level: skill_level(performance_score),
    }
}

#[cfg(test)]
mod tests {
    use super::super::AnalyticsConfig;
    use super::*;

    fn core(kda: f64, deaths: f64, kills: f64, assists: f64) -> CoreMetrics {
        CoreMetrics {
            games: 10,
            avg_kills: kills,
            avg_deaths: deaths,
            avg_assists: assists,
            avg_kda: kda,
            avg_cs: 180.0,
            cs_per_minute: 6.0,
            avg_gold: 12_000.0,
            gold_efficiency: 1.0,
            avg_damage: 18_000.0,
            damage_share: 0.22,
            avg_vision: 18.0,
            win_rate: 0.55,
            }
    }

    #[test]
    fn test_playstyle_bands() {
        assert_eq!(playstyle(&core(5.0, 2.0, 6.0, 6.0)), Playstyle::Aggressive);
        assert_eq!(playstyle(&core(1.0, 8.0, 4.0, 4.0)), Playstyle::Passive);
        assert_eq!(playstyle(&core(3.0, 4.0, 6.0, 6.0)), Playstyle::Balanced);
    }

    #[test]
    fn test_playstyle_low_deaths_floor() {
        // Deaths floored at 0.1 keeps the ratio finite.
        assert_eq!(playstyle(&core(20.0, 0.0, 5.0, 5.0)), Playstyle::Aggressive);
    }

    #[test]
    fn test_skill_level_steps() {
        assert_eq!(skill_level(95.0), SkillLevel::Elite);
        assert_eq!(skill_level(80.0), SkillLevel::Expert);
        assert_eq!(skill_level(65.0), SkillLevel::Advanced);
        assert_eq!(skill_level(45.0), SkillLevel::Intermediate);
        assert_eq!(skill_level(20.0), SkillLevel::Beginner);
    }

    #[test]
    fn test_deficits_produce_tips() {
        let config = AnalyticsConfig::default();
        let thresholds = config.thresholds_for(Some(rift_common::RankTier::Diamond));
        let weak = CoreMetrics {
            cs_per_minute: 3.0,
            avg_vision: 5.0,
            ..core(1.0, 8.0, 3.0, 4.0)
        };
        let insights = build_insights(&weak, &thresholds, &config.weights, 35.0);

        assert!(!insights.improvement_areas.is_empty());
        assert!(!insights.coaching_tips.is_empty());
        assert_eq!(insights.skill_level, SkillLevel::Beginner);
        // One tip per deficient metric.
        assert_eq!(
            insights.coaching_tips.len(),
            insights.improvement_areas.len()
        );
    }

    #[test]
    fn test_strengths_require_margin() {
        let config = AnalyticsConfig::default();
        let thresholds = config.thresholds_for(Some(rift_common::RankTier::Silver));
        // KDA exactly at threshold: neither strength nor weakness.
        let at_threshold = CoreMetrics {
            avg_kda: thresholds.kda,
            ..core(thresholds.kda, 3.0, 5.0, 5.0)
        };
        let insights = build_insights(&at_threshold, &thresholds, &config.weights, 70.0);
        assert!(!insights.strengths.iter().any(|s| s.metric == "kda"));
        assert!(!insights
            .improvement_areas
            .iter()
            .any(|s| s.metric == "kda"));
    }
}
