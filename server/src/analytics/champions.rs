//! Champion performance breakdown.

use std::collections::HashMap;

use rift_common::MatchRecord;

use super::metrics::compute_core_metrics;
use super::trends::rate_trend;
use super::{AnalyticsConfig, ChampionPerformance, TrendLabel};

/// Groups the match set by champion and computes per-champion aggregates,
/// a mastery estimate, and the older-versus-recent win-rate trend.
/// Champions with fewer than the configured minimum games are omitted.
#[must_use]
pub fn compute_champion_performance(
    matches: &[MatchRecord],
    puuid: &str,
    config: &AnalyticsConfig,
) -> Vec<ChampionPerformance> {
    let mut by_champion: HashMap<String, Vec<MatchRecord>> = HashMap::new();
    for record in matches {
        let Some(p) = record.participant(puuid) else {
            continue;
        };
        by_champion
            .entry(p.champion.clone())
            .or_default()
            .push(record.clone());
    }

    let mut performances: Vec<ChampionPerformance> = by_champion
        .into_iter()
        .filter_map(|(champion, mut group)| {
            if group.len() < config.champion_min_games {
                return None;
            }
            // Oldest first so the halves split chronologically.
            group.sort_by_key(|m| m.game_start);
            let metrics = compute_core_metrics(&group, puuid)?;
            let mastery_level = estimate_mastery(group.len(), metrics.win_rate, metrics.avg_kda);
            let trend = champion_trend(&group, puuid);

            Some(ChampionPerformance {
                champion,
                metrics,
                mastery_level,
                trend,
            })
        })
        .collect();

    performances.sort_by(|a, b| b.metrics.games.cmp(&a.metrics.games));
    performances
}

/// Mastery estimate: one step per five games, with bonuses for a strong win
/// rate and KDA, clamped to 1..=7.
fn estimate_mastery(games: usize, win_rate: f64, kda: f64) -> u8 {
    let base = (games / 5) as i64;
    let win_bonus = if win_rate >= 0.65 {
        2
    } else if win_rate >= 0.55 {
        1
    } else {
        0
    };
    let kda_bonus = if kda >= 4.0 {
        2
    } else if kda >= 2.5 {
        1
    } else {
        0
    };
    (base + win_bonus + kda_bonus).clamp(1, 7) as u8
}

/// Win-rate trend between the older and recent half of one champion's games
/// (input sorted oldest first).
fn champion_trend(group: &[MatchRecord], puuid: &str) -> TrendLabel {
    if group.len() < 2 {
        return TrendLabel::Stable;
    }
    let mid = group.len() / 2;
    let win_rate = |slice: &[MatchRecord]| {
        let played: Vec<bool> = slice
            .iter()
            .filter_map(|m| m.participant(puuid).map(|p| p.win))
            .collect();
        if played.is_empty() {
            0.0
        } else {
            played.iter().filter(|w| **w).count() as f64 / played.len() as f64
        }
    };
    rate_trend(win_rate(&group[..mid]), win_rate(&group[mid..]))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use rift_common::{ParticipantRecord, QueueId};

    use super::*;

    fn match_on(champion: &str, day: i64, win: bool, kills: u32) -> MatchRecord {
        MatchRecord {
            match_id: format!("{champion}-{day}"),
            game_duration_secs: 1_800,
            game_start: Utc::now() - Duration::days(30 - day),
            queue_id: QueueId::RANKED_SOLO,
            participants: vec![ParticipantRecord {
                puuid: "p1".to_string(),
                team_id: 100,
                role_tag: "MID".to_string(),
                champion: champion.to_string(),
                kills,
                deaths: 3,
                assists: 5,
                minions_killed: 170,
                neutral_minions_killed: 10,
                gold_earned: 11_500,
                gold_spent: 11_000,
                damage_to_champions: 17_000,
                vision_score: 15,
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
                win,
            }],
        }
    }

    #[test]
    fn test_minimum_games_filter() {
        let matches = vec![
            match_on("Ahri", 1, true, 5),
            match_on("Ahri", 2, false, 4),
            match_on("Zed", 3, true, 6),
        ];
        let config = AnalyticsConfig::default();
        let champions = compute_champion_performance(&matches, "p1", &config);

        assert_eq!(champions.len(), 1);
        assert_eq!(champions[0].champion, "Ahri");
        assert_eq!(champions[0].metrics.games, 2);
    }

    #[test]
    fn test_improving_trend_from_recent_wins() {
        // Older half all losses, recent half all wins.
        let matches: Vec<MatchRecord> = (0..8)
            .map(|day| match_on("Ahri", day, day >= 4, 5))
            .collect();
        let config = AnalyticsConfig::default();
        let champions = compute_champion_performance(&matches, "p1", &config);
        assert_eq!(champions[0].trend, TrendLabel::Improving);
    }

    #[test]
    fn test_stable_trend_from_flat_results() {
        let matches: Vec<MatchRecord> = (0..8)
            .map(|day| match_on("Ahri", day, day % 2 == 0, 5))
            .collect();
        let config = AnalyticsConfig::default();
        let champions = compute_champion_performance(&matches, "p1", &config);
        assert_eq!(champions[0].trend, TrendLabel::Stable);
    }

    #[test]
    fn test_mastery_bounds() {
        assert_eq!(estimate_mastery(1, 0.0, 0.5), 1);
        assert_eq!(estimate_mastery(100, 0.8, 6.0), 7);
        // 10 games, decent win rate and KDA.
        assert_eq!(estimate_mastery(10, 0.6, 3.0), 4);
    }
}
