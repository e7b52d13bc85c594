//! Match analyzer end-to-end tests over the full per-match pipeline and
//! the series view.

mod helpers;

use std::sync::Arc;

use chrono::Utc;

use helpers::{baseline_match, baseline_matches};
use rift_server::clock::ManualClock;
use rift_server::matches::{
    compare_matches, AnalysisOptions, ComparisonLabel, GamePhase, MatchAnalysisRequest,
    MatchAnalyzer, MatchAnalyzerConfig,
};

fn analyzer() -> MatchAnalyzer {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    MatchAnalyzer::new(MatchAnalyzerConfig::default(), clock)
}

#[test]
fn test_full_pipeline_on_baseline_match() {
    let record = baseline_match("RIFT_1", "player-1", Utc::now());
    let result = analyzer()
        .analyze_match(&MatchAnalysisRequest {
            puuid: "player-1".to_string(),
            record,
            options: AnalysisOptions::default(),
        })
        .unwrap();

    // 30-minute game decomposes into all three phases.
    let phases = result.phases.unwrap();
    assert_eq!(phases.phases.len(), 3);
    assert!(phases.consistency <= 100.0);
    assert!(matches!(
        phases.strongest,
        GamePhase::Lane | GamePhase::Mid | GamePhase::Late
    ));

    // Dragon and turret takedowns surface as an objective moment.
    assert!(result
        .key_moments
        .iter()
        .any(|m| m.moment_type == "objective_control"));

    let contribution = result.team_contribution.unwrap();
    assert!((contribution.damage_share - 0.25).abs() < 1e-9);
    assert!(contribution.kill_participation > 0.0);

    assert!((0.0..=100.0).contains(&result.rating));
    assert!(result.rating > 70.0, "baseline win rated {}", result.rating);
}

#[test]
fn test_first_blood_outranks_everything() {
    let mut record = baseline_match("RIFT_2", "player-1", Utc::now());
    record.participants[0].first_blood_kill = true;
    record.participants[0].double_kills = 1;
    record.participants[0].deaths = 6;

    let result = analyzer()
        .analyze_match(&MatchAnalysisRequest {
            puuid: "player-1".to_string(),
            record,
            options: AnalysisOptions::default(),
        })
        .unwrap();

    assert_eq!(result.key_moments[0].moment_type, "first_blood");
    assert_eq!(result.key_moments[0].importance, 9);
    // The six deaths register as a negative moment.
    assert!(result
        .key_moments
        .iter()
        .any(|m| m.moment_type == "high_deaths" && !m.positive));
}

#[test]
fn test_series_over_identical_games_is_flat() {
    let matches = baseline_matches("player-1", 6);
    let series = analyzer().analyze_series("player-1", &matches).unwrap();

    assert_eq!(series.matches_analyzed, 6);
    assert!(series.volatility.abs() < 1e-9);
    let streak = series.streak.unwrap();
    assert!(streak.winning);
    assert_eq!(streak.length, 6);

    // Identical ratings: consistency is perfect for every metric.
    for consistency in &series.consistency {
        assert!(
            consistency.consistency > 99.0,
            "{} at {}",
            consistency.metric,
            consistency.consistency
        );
    }
}

#[test]
fn test_comparison_of_identical_matches_is_similar() {
    let first = baseline_match("RIFT_3", "player-1", Utc::now());
    let second = baseline_match("RIFT_4", "player-1", Utc::now());
    let result = compare_matches(&first, &second, "player-1").unwrap();

    assert_eq!(result.overall, ComparisonLabel::Similar);
    assert!(result.rating_delta.abs() < f64::EPSILON);
}

#[test]
fn test_comparison_detects_collapse() {
    let strong = baseline_match("RIFT_5", "player-1", Utc::now());
    let mut weak = baseline_match("RIFT_6", "player-1", Utc::now());
    {
        let p = &mut weak.participants[0];
        p.kills = 1;
        p.deaths = 9;
        p.assists = 2;
        p.minions_killed = 90;
        p.neutral_minions_killed = 0;
        p.damage_to_champions = 6_000;
        p.vision_score = 6;
        p.win = false;
    }

    let result = compare_matches(&strong, &weak, "player-1").unwrap();
    assert_eq!(result.overall, ComparisonLabel::Declined);
    assert!(result.rating_delta < -5.0);
}
