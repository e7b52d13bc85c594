//! Two-match comparison.

use rift_common::MatchRecord;

use super::analyzer::{match_performance, match_rating};
use super::{
    ComparisonDirection, ComparisonLabel, ComparisonSignificance, MatchAnalysisError,
    MatchComparisonResult, MatchPerformance, MetricComparison,
};

/// Rating delta below which two matches read as similar overall.
const OVERALL_DELTA: f64 = 5.0;

/// Compares one player's performance between two matches, metric by metric.
pub fn compare_matches(
    first: &MatchRecord,
    second: &MatchRecord,
    puuid: &str,
) -> Result<MatchComparisonResult, MatchAnalysisError> {
    if puuid.trim().is_empty() {
        return Err(MatchAnalysisError::missing_field("puuid"));
    }
    let locate = |record: &MatchRecord| {
        record
            .participant(puuid)
            .cloned()
            .ok_or_else(|| MatchAnalysisError::ParticipantNotFound {
                match_id: record.match_id.clone(),
                puuid: puuid.to_string(),
            })
    };
    let first_participant = locate(first)?;
    let second_participant = locate(second)?;

    let before = match_performance(first, &first_participant);
    let after = match_performance(second, &second_participant);

    let metrics = compared_metrics(&before, &after);
    let rating_delta = match_rating(&after) - match_rating(&before);
    let overall = if rating_delta > OVERALL_DELTA {
        ComparisonLabel::Improved
    } else if rating_delta < -OVERALL_DELTA {
        ComparisonLabel::Declined
    } else {
        ComparisonLabel::Similar
    };

    Ok(MatchComparisonResult {
        puuid: puuid.to_string(),
        first_match_id: first.match_id.clone(),
        second_match_id: second.match_id.clone(),
        metrics,
        rating_delta,
        overall,
    })
}

fn compared_metrics(before: &MatchPerformance, after: &MatchPerformance) -> Vec<MetricComparison> {
    // (name, before, after, lower_is_better)
    let rows: [(&'static str, f64, f64, bool); 8] = [
        ("kills", f64::from(before.kills), f64::from(after.kills), false),
        ("deaths", f64::from(before.deaths), f64::from(after.deaths), true),
        (
            "assists",
            f64::from(before.assists),
            f64::from(after.assists),
            false,
        ),
        ("kda", before.kda, after.kda, false),
        (
            "cs_per_minute",
            before.cs_per_minute,
            after.cs_per_minute,
            false,
        ),
        (
            "damage_share",
            before.damage_share,
            after.damage_share,
            false,
        ),
        (
            "vision",
            f64::from(before.vision),
            f64::from(after.vision),
            false,
        ),
        ("gold", f64::from(before.gold), f64::from(after.gold), false),
    ];

    rows.into_iter()
        .map(|(metric, before, after, lower_is_better)| {
            let change = after - before;
            let change_pct = if before.abs() > f64::EPSILON {
                change / before.abs() * 100.0
            } else if change.abs() > f64::EPSILON {
                100.0
            } else {
                0.0
            };

            let direction = if change_pct.abs() < 5.0 {
                ComparisonDirection::Same
            } else if (change > 0.0) != lower_is_better {
                ComparisonDirection::Improved
            } else {
                ComparisonDirection::Declined
            };
            let significance = if change_pct.abs() >= 20.0 {
                ComparisonSignificance::Major
            } else if change_pct.abs() >= 10.0 {
                ComparisonSignificance::Moderate
            } else {
                ComparisonSignificance::Minor
            };

            MetricComparison {
                metric,
                before,
                after,
                change,
                change_pct,
                direction,
                significance,
            }
        })
        .collect()
}
