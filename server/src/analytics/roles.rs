//! Role performance breakdown.

use std::collections::HashMap;

use rift_common::{MatchRecord, Role};

use super::metrics::{compute_core_metrics, metric_value};
use super::{AnalyticsConfig, RolePerformance};

/// Per-metric ratio cap before averaging into the role rating.
const RATIO_CAP: f64 = 200.0;

/// Groups the match set by the player's normalized role and computes
/// per-role aggregates. Roles with fewer than the configured minimum games
/// are omitted, as is `UNKNOWN` (it has no expectation row to rate against).
#[must_use]
pub fn compute_role_performance(
    matches: &[MatchRecord],
    puuid: &str,
    config: &AnalyticsConfig,
) -> Vec<RolePerformance> {
    let mut by_role: HashMap<Role, Vec<MatchRecord>> = HashMap::new();
    for record in matches {
        let Some(p) = record.participant(puuid) else {
            continue;
        };
        by_role.entry(p.role()).or_default().push(record.clone());
    }

    let mut performances: Vec<RolePerformance> = Role::canonical()
        .into_iter()
        .filter_map(|role| {
            let group = by_role.get(&role)?;
            if group.len() < config.role_min_games {
                return None;
            }
            let metrics = compute_core_metrics(group, puuid)?;
            let expectation = config.expectation_for(role)?;

            let mut ratio_sum = 0.0;
            let mut ratio_count = 0usize;
            for name in &expectation.priority {
                let Some(observed) = metric_value(&metrics, name) else {
                    continue;
                };
                let Some(expected) = expectation.expected.get(name) else {
                    continue;
                };
                if expected <= 0.0 {
                    continue;
                }
                ratio_sum += (observed / expected * 100.0).min(RATIO_CAP);
                ratio_count += 1;
            }
            let rating = if ratio_count == 0 {
                0.0
            } else {
                (ratio_sum / ratio_count as f64).clamp(0.0, 100.0)
            };

            Some(RolePerformance {
                role,
                metrics,
                rating,
            })
        })
        .collect();

    // Most-played roles first.
    performances.sort_by(|a, b| b.metrics.games.cmp(&a.metrics.games));
    performances
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rift_common::{ParticipantRecord, QueueId};

    use super::*;

    fn match_with_role(id: &str, role_tag: &str, kills: u32) -> MatchRecord {
        MatchRecord {
            match_id: id.to_string(),
            game_duration_secs: 1_800,
            game_start: Utc::now(),
            queue_id: QueueId::RANKED_SOLO,
            participants: vec![ParticipantRecord {
                puuid: "p1".to_string(),
                team_id: 100,
                role_tag: role_tag.to_string(),
                champion: "Ahri".to_string(),
                kills,
                deaths: 2,
                assists: 6,
                minions_killed: 180,
                neutral_minions_killed: 10,
                gold_earned: 12_000,
                gold_spent: 11_000,
                damage_to_champions: 18_000,
                vision_score: 18,
                dragon_takedowns: 0,
                baron_takedowns: 0,
                turret_takedowns: 1,
                inhibitor_takedowns: 0,
                double_kills: 0,
                triple_kills: 0,
                quadra_kills: 0,
                penta_kills: 0,
                first_blood_kill: false,
                first_blood_assist: false,
                win: true,
            }],
        }
    }

    #[test]
    fn test_groups_by_normalized_role() {
        let matches: Vec<MatchRecord> = vec![
            match_with_role("m1", "MID", 5),
            match_with_role("m2", "MIDDLE", 6),
            match_with_role("m3", "mid", 7),
            match_with_role("m4", "TOP", 4),
        ];
        let config = AnalyticsConfig::default();
        let roles = compute_role_performance(&matches, "p1", &config);

        // MID synonyms coalesce into one group of 3; TOP has only 1 game.
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].role, Role::Middle);
        assert_eq!(roles[0].metrics.games, 3);
    }

    #[test]
    fn test_rating_clamped_to_hundred() {
        // Absurdly strong games should still cap at 100.
        let matches: Vec<MatchRecord> = (0..3)
            .map(|i| match_with_role(&format!("m{i}"), "MID", 30))
            .collect();
        let config = AnalyticsConfig::default();
        let roles = compute_role_performance(&matches, "p1", &config);
        assert_eq!(roles.len(), 1);
        assert!(roles[0].rating >= 0.0);
        assert!(roles[0].rating <= 100.0);
    }

    #[test]
    fn test_unknown_role_is_omitted() {
        let matches: Vec<MatchRecord> = (0..5)
            .map(|i| match_with_role(&format!("m{i}"), "FILL", 5))
            .collect();
        let config = AnalyticsConfig::default();
        assert!(compute_role_performance(&matches, "p1", &config).is_empty());
    }
}
