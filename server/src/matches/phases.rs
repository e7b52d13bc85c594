//! Phase decomposition.
//!
//! Splits a game at the 15- and 25-minute boundaries and attributes the
//! whole-game stat line to phases by fixed coefficients. Phases the game
//! never reached are omitted and the remaining shares renormalized.

use rift_common::ParticipantRecord;

use super::config::{MatchAnalyzerConfig, PhaseShare};
use super::{GamePhase, PhaseAnalysis, PhasePerformance};

/// Per-minute benchmarks a phase rating is measured against.
const BENCH_KDA: f64 = 4.0;
const BENCH_CS_PER_MIN: f64 = 8.0;
const BENCH_DAMAGE_PER_MIN: f64 = 600.0;

/// Decomposes a participant's game into phases. Returns `None` for
/// zero-duration games.
#[must_use]
pub fn decompose(
    participant: &ParticipantRecord,
    game_duration_secs: u32,
    config: &MatchAnalyzerConfig,
) -> Option<PhaseAnalysis> {
    if game_duration_secs == 0 {
        return None;
    }

    let lane_secs = game_duration_secs.min(config.lane_phase_end_secs);
    let mid_secs = game_duration_secs
        .min(config.mid_phase_end_secs)
        .saturating_sub(config.lane_phase_end_secs);
    let late_secs = game_duration_secs.saturating_sub(config.mid_phase_end_secs);

    let d = &config.phase_distribution;
    let reached: Vec<(GamePhase, u32, PhaseShare)> = [
        (GamePhase::Lane, lane_secs, d.lane),
        (GamePhase::Mid, mid_secs, d.mid),
        (GamePhase::Late, late_secs, d.late),
    ]
    .into_iter()
    .filter(|(_, secs, _)| *secs > 0)
    .collect();

    // Renormalize the shares over the phases that actually happened.
    let share_sum = |f: fn(&PhaseShare) -> f64| -> f64 {
        reached.iter().map(|(_, _, s)| f(s)).sum::<f64>().max(f64::EPSILON)
    };
    let kills_total = share_sum(|s| s.kills);
    let deaths_total = share_sum(|s| s.deaths);
    let assists_total = share_sum(|s| s.assists);
    let cs_total = share_sum(|s| s.cs);
    let gold_total = share_sum(|s| s.gold);
    let damage_total = share_sum(|s| s.damage);

    let phases: Vec<PhasePerformance> = reached
        .iter()
        .map(|(phase, secs, share)| {
            let kills = f64::from(participant.kills) * share.kills / kills_total;
            let deaths = f64::from(participant.deaths) * share.deaths / deaths_total;
            let assists = f64::from(participant.assists) * share.assists / assists_total;
            let cs = f64::from(participant.total_cs()) * share.cs / cs_total;
            let gold = f64::from(participant.gold_earned) * share.gold / gold_total;
            let damage = participant.damage_to_champions as f64 * share.damage / damage_total;

            let minutes = f64::from(*secs) / 60.0;
            let rating = phase_rating(kills, deaths, assists, cs, damage, minutes);

            PhasePerformance {
                phase: *phase,
                duration_secs: *secs,
                kills,
                deaths,
                assists,
                cs,
                gold,
                damage,
                rating,
            }
        })
        .collect();

    let strongest = phases
        .iter()
        .max_by(|a, b| a.rating.total_cmp(&b.rating))?
        .phase;
    let weakest = phases
        .iter()
        .min_by(|a, b| a.rating.total_cmp(&b.rating))?
        .phase;

    let ratings: Vec<f64> = phases.iter().map(|p| p.rating).collect();
    let consistency = (100.0 - 2.0 * stddev(&ratings)).max(0.0);

    Some(PhaseAnalysis {
        phases,
        strongest,
        weakest,
        consistency,
    })
}

/// Phase rating on [0, 100]: attainment against per-minute benchmarks,
/// weighted 40/40/20 across KDA, CS, and damage.
fn phase_rating(kills: f64, deaths: f64, assists: f64, cs: f64, damage: f64, minutes: f64) -> f64 {
    if minutes <= 0.0 {
        return 0.0;
    }
    let kda = (kills + assists) / deaths.max(1.0);
    let cs_per_min = cs / minutes;
    let damage_per_min = damage / minutes;

    let kda_part = (kda / BENCH_KDA).min(1.0) * 40.0;
    let cs_part = (cs_per_min / BENCH_CS_PER_MIN).min(1.0) * 40.0;
    let damage_part = (damage_per_min / BENCH_DAMAGE_PER_MIN).min(1.0) * 20.0;

    (kda_part + cs_part + damage_part).clamp(0.0, 100.0)
}

/// Population standard deviation.
#[must_use]
pub fn stddev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant() -> ParticipantRecord {
        ParticipantRecord {
            puuid: "p1".to_string(),
            team_id: 100,
            role_tag: "MID".to_string(),
            champion: "Ahri".to_string(),
            kills: 10,
            deaths: 4,
            assists: 8,
            minions_killed: 220,
            neutral_minions_killed: 20,
            gold_earned: 14_000,
            gold_spent: 13_000,
            damage_to_champions: 22_000,
            vision_score: 18,
            dragon_takedowns: 1,
            baron_takedowns: 1,
            turret_takedowns: 2,
            inhibitor_takedowns: 0,
            double_kills: 1,
            triple_kills: 0,
            quadra_kills: 0,
            penta_kills: 0,
            first_blood_kill: true,
            first_blood_assist: false,
            win: true,
        }
    }

    #[test]
    fn test_full_game_has_three_phases() {
        let config = MatchAnalyzerConfig::default();
        let analysis = decompose(&participant(), 2_100, &config).unwrap();
        assert_eq!(analysis.phases.len(), 3);

        // Stats across phases reassemble the whole game.
        let kills: f64 = analysis.phases.iter().map(|p| p.kills).sum();
        let cs: f64 = analysis.phases.iter().map(|p| p.cs).sum();
        assert!((kills - 10.0).abs() < 1e-9);
        assert!((cs - 240.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_game_skips_unreached_phases() {
        let config = MatchAnalyzerConfig::default();
        // 12-minute game never leaves the lane phase.
        let analysis = decompose(&participant(), 720, &config).unwrap();
        assert_eq!(analysis.phases.len(), 1);
        assert_eq!(analysis.phases[0].phase, GamePhase::Lane);
        // All stats land in the only phase.
        assert!((analysis.phases[0].kills - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_twenty_minute_game_has_two_phases() {
        let config = MatchAnalyzerConfig::default();
        let analysis = decompose(&participant(), 1_200, &config).unwrap();
        assert_eq!(analysis.phases.len(), 2);
        assert_eq!(analysis.phases[0].phase, GamePhase::Lane);
        assert_eq!(analysis.phases[1].phase, GamePhase::Mid);
    }

    #[test]
    fn test_ratings_bounded_and_consistency_floored() {
        let config = MatchAnalyzerConfig::default();
        let analysis = decompose(&participant(), 2_100, &config).unwrap();
        for phase in &analysis.phases {
            assert!((0.0..=100.0).contains(&phase.rating));
        }
        assert!(analysis.consistency >= 0.0);
        assert!(analysis.consistency <= 100.0);
    }

    #[test]
    fn test_zero_duration_returns_none() {
        let config = MatchAnalyzerConfig::default();
        assert!(decompose(&participant(), 0, &config).is_none());
    }

    #[test]
    fn test_stddev() {
        assert!((stddev(&[]) - 0.0).abs() < f64::EPSILON);
        assert!((stddev(&[5.0, 5.0, 5.0]) - 0.0).abs() < f64::EPSILON);
        assert!((stddev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 2.0).abs() < 1e-9);
    }
}
