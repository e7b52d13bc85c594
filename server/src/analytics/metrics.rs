//! Core metric computation.
//!
//! Pure accumulation over the participant's lines. Ratio metrics (damage
//! share, gold efficiency, CS per minute) average the per-match ratios
//! rather than dividing the totals, so one very long game cannot dominate.

use rift_common::MatchRecord;

use super::CoreMetrics;

/// Gold-per-minute considered fully efficient.
const GOLD_EFFICIENCY_BASELINE: f64 = 400.0;

/// Computes core metrics for a player over a match set. Matches the player
/// did not appear in are skipped. Returns `None` when the player appears in
/// no match at all.
#[must_use]
pub fn compute_core_metrics(matches: &[MatchRecord], puuid: &str) -> Option<CoreMetrics> {
    let mut games = 0usize;
    let mut wins = 0usize;
    let mut kills = 0u64;
    let mut deaths = 0u64;
    let mut assists = 0u64;
    let mut cs = 0u64;
    let mut gold = 0u64;
    let mut damage = 0u64;
    let mut vision = 0u64;

    let mut cs_per_min_sum = 0.0;
    let mut cs_per_min_count = 0usize;
    let mut gold_eff_sum = 0.0;
    let mut gold_eff_count = 0usize;
    let mut damage_share_sum = 0.0;
    let mut damage_share_count = 0usize;

    for record in matches {
        let Some(p) = record.participant(puuid) else {
            continue;
        };
        games += 1;
        if p.win {
            wins += 1;
        }
        kills += u64::from(p.kills);
        deaths += u64::from(p.deaths);
        assists += u64::from(p.assists);
        cs += u64::from(p.total_cs());
        gold += u64::from(p.gold_earned);
        damage += p.damage_to_champions;
        vision += u64::from(p.vision_score);

        let minutes = record.duration_minutes();
        if minutes > 0.0 {
            cs_per_min_sum += f64::from(p.total_cs()) / minutes;
            cs_per_min_count += 1;

            let gpm = f64::from(p.gold_earned) / minutes;
            gold_eff_sum += (gpm / GOLD_EFFICIENCY_BASELINE).min(2.0);
            gold_eff_count += 1;
        }

        let team_damage = record.team_damage(p.team_id);
        if team_damage > 0 {
            damage_share_sum += p.damage_to_champions as f64 / team_damage as f64;
            damage_share_count += 1;
        }
    }

    if games == 0 {
        return None;
    }

    let games_f = games as f64;
    let avg = |total: u64| total as f64 / games_f;
    let ratio_avg = |sum: f64, count: usize| if count == 0 { 0.0 } else { sum / count as f64 };

    Some(CoreMetrics {
        games,
        avg_kills: avg(kills),
        avg_deaths: avg(deaths),
        avg_assists: avg(assists),
        avg_kda: (kills + assists) as f64 / deaths.max(1) as f64,
        avg_cs: avg(cs),
        cs_per_minute: ratio_avg(cs_per_min_sum, cs_per_min_count),
        avg_gold: avg(gold),
        gold_efficiency: ratio_avg(gold_eff_sum, gold_eff_count),
        avg_damage: avg(damage),
        damage_share: ratio_avg(damage_share_sum, damage_share_count),
        avg_vision: avg(vision),
        win_rate: wins as f64 / games_f,
    })
}

/// Reads a core metric by canonical name, for ratio computations against
/// thresholds and expectations.
#[must_use]
pub fn metric_value(core: &CoreMetrics, name: &str) -> Option<f64> {
    use super::config::metric;
    match name {
        metric::KDA => Some(core.avg_kda),
        metric::CS_PER_MINUTE => Some(core.cs_per_minute),
        metric::WIN_RATE => Some(core.win_rate),
        metric::DAMAGE_SHARE => Some(core.damage_share),
        metric::VISION => Some(core.avg_vision),
        metric::GOLD_EFFICIENCY => Some(core.gold_efficiency),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rift_common::{ParticipantRecord, QueueId};

    use super::*;

    fn participant(puuid: &str, team_id: u32, win: bool) -> ParticipantRecord {
        ParticipantRecord {
            puuid: puuid.to_string(),
            team_id,
            role_tag: "MID".to_string(),
            champion: "Ahri".to_string(),
            kills: 10,
            deaths: 2,
            assists: 10,
            minions_killed: 200,
            neutral_minions_killed: 40,
            gold_earned: 15_000,
            gold_spent: 14_000,
            damage_to_champions: 20_000,
            vision_score: 20,
            dragon_takedowns: 1,
            baron_takedowns: 0,
            turret_takedowns: 2,
            inhibitor_takedowns: 1,
            double_kills: 1,
            triple_kills: 0,
            quadra_kills: 0,
            penta_kills: 0,
            first_blood_kill: false,
            first_blood_assist: false,
            win,
        }
    }

    fn teammate(puuid: &str, team_id: u32, damage: u64) -> ParticipantRecord {
        ParticipantRecord {
            damage_to_champions: damage,
            ..participant(puuid, team_id, true)
        }
    }

    fn standard_match(id: &str, player: &str) -> MatchRecord {
        MatchRecord {
            match_id: id.to_string(),
            game_duration_secs: 1_800,
            game_start: Utc::now(),
            queue_id: QueueId::RANKED_SOLO,
            participants: vec![
                participant(player, 100, true),
                teammate("ally-1", 100, 20_000),
                teammate("ally-2", 100, 20_000),
                teammate("ally-3", 100, 20_000),
                teammate("enemy-1", 200, 30_000),
            ],
        }
    }

    #[test]
    fn test_baseline_aggregates() {
        let matches: Vec<MatchRecord> =
            (0..10).map(|i| standard_match(&format!("m{i}"), "p1")).collect();
        let core = compute_core_metrics(&matches, "p1").unwrap();

        assert_eq!(core.games, 10);
        assert!((core.win_rate - 1.0).abs() < 1e-9);
        assert!((core.avg_kda - 10.0).abs() < 1e-9);
        assert!((core.cs_per_minute - 8.0).abs() < 1e-9);
        // 20k of the team's 80k.
        assert!((core.damage_share - 0.25).abs() < 1e-9);
        // 15000 gold over 30 minutes = 500 gpm.
        assert!((core.gold_efficiency - 1.25).abs() < 1e-9);
        assert!((core.avg_vision - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_deaths_kda_is_kills_plus_assists() {
        let mut m = standard_match("m1", "p1");
        m.participants[0].deaths = 0;
        let core = compute_core_metrics(&[m], "p1").unwrap();
        assert!((core.avg_kda - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_matches_without_player_are_skipped() {
        let with_player = standard_match("m1", "p1");
        let without = standard_match("m2", "someone-else");
        let core = compute_core_metrics(&[with_player, without], "p1").unwrap();
        assert_eq!(core.games, 1);
    }

    #[test]
    fn test_absent_everywhere_returns_none() {
        let m = standard_match("m1", "someone-else");
        assert!(compute_core_metrics(&[m], "p1").is_none());
    }

    #[test]
    fn test_team_damage_shares_sum_to_one() {
        let m = standard_match("m1", "p1");
        let team: Vec<&ParticipantRecord> =
            m.participants.iter().filter(|p| p.team_id == 100).collect();
        let team_damage = m.team_damage(100);
        let share_sum: f64 = team
            .iter()
            .map(|p| p.damage_to_champions as f64 / team_damage as f64)
            .sum();
        assert!((share_sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_gold_efficiency_capped_at_two() {
        let mut m = standard_match("m1", "p1");
        m.participants[0].gold_earned = 60_000;
        let core = compute_core_metrics(&[m], "p1").unwrap();
        assert!((core.gold_efficiency - 2.0).abs() < 1e-9);
    }
}
