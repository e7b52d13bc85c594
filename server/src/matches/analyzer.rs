//! Per-match and series analysis.

use std::collections::HashMap;
use std::sync::Arc;

use rift_common::{MatchRecord, ParticipantRecord};

use crate::analytics::TrendLabel;
use crate::clock::SharedClock;

use super::config::MatchAnalyzerConfig;
use super::moments::detect_key_moments;
use super::phases::{decompose, stddev};
use super::{
    AnalysisOptions, KeyMoment, MatchAnalysisError, MatchAnalysisRequest, MatchAnalysisResult,
    MatchPerformance, MatchSeriesAnalysis, MetricConsistency, PlayPattern, StreakInfo,
    TeamContribution,
};

/// Gold-per-minute considered fully efficient.
const GOLD_EFFICIENCY_BASELINE: f64 = 400.0;

/// Match analyzer over a config snapshot.
#[derive(Clone)]
pub struct MatchAnalyzer {
    config: Arc<MatchAnalyzerConfig>,
    clock: SharedClock,
}

impl MatchAnalyzer {
    /// Creates an analyzer.
    #[must_use]
    pub fn new(config: MatchAnalyzerConfig, clock: SharedClock) -> Self {
        Self {
            config: Arc::new(config),
            clock,
        }
    }

    /// Returns the configuration for this analyzer.
    #[must_use]
    pub fn config(&self) -> &MatchAnalyzerConfig {
        &self.config
    }

    /// Runs the per-match pipeline: validate, locate, per-match performance,
    /// optional decompositions, insights, learning opportunities, rating.
    #[tracing::instrument(skip(self, request), fields(match_id = %request.record.match_id, puuid = %request.puuid))]
    pub fn analyze_match(
        &self,
        request: &MatchAnalysisRequest,
    ) -> Result<MatchAnalysisResult, MatchAnalysisError> {
        if request.puuid.trim().is_empty() {
            return Err(MatchAnalysisError::missing_field("puuid"));
        }
        if request.record.match_id.trim().is_empty() {
            return Err(MatchAnalysisError::missing_field("match_id"));
        }
        if request.record.participants.is_empty() {
            return Err(MatchAnalysisError::InvalidRequest(
                "match has no participants".to_string(),
            ));
        }

        let participant = request
            .record
            .participant(&request.puuid)
            .ok_or_else(|| MatchAnalysisError::ParticipantNotFound {
                match_id: request.record.match_id.clone(),
                puuid: request.puuid.clone(),
            })?;

        let performance = match_performance(&request.record, participant);
        let phases = request
            .options
            .phases
            .then(|| decompose(participant, request.record.game_duration_secs, &self.config))
            .flatten();
        let key_moments = if request.options.key_moments {
            detect_key_moments(participant, &self.config)
        } else {
            Vec::new()
        };
        let team_contribution = request
            .options
            .team_contribution
            .then(|| team_contribution(&request.record, participant));

        let insights = build_insights(&performance);
        let learning_opportunities = learning_opportunities(&performance, &key_moments);
        let rating = match_rating(&performance);

        Ok(MatchAnalysisResult {
            match_id: request.record.match_id.clone(),
            puuid: request.puuid.clone(),
            analyzed_at: self.clock.now(),
            performance,
            phases,
            key_moments,
            team_contribution,
            insights,
            learning_opportunities,
            rating,
        })
    }

    /// Runs per-match analysis on every match in the series and derives the
    /// series-level view: trend, streak, volatility, patterns, priorities.
    #[tracing::instrument(skip(self, matches), fields(puuid = %puuid, matches = matches.len()))]
    pub fn analyze_series(
        &self,
        puuid: &str,
        matches: &[MatchRecord],
    ) -> Result<MatchSeriesAnalysis, MatchAnalysisError> {
        if puuid.trim().is_empty() {
            return Err(MatchAnalysisError::missing_field("puuid"));
        }
        if matches.is_empty() {
            return Err(MatchAnalysisError::missing_field("matches"));
        }

        let mut ordered: Vec<&MatchRecord> = matches
            .iter()
            .filter(|m| m.participant(puuid).is_some())
            .collect();
        if ordered.is_empty() {
            return Err(MatchAnalysisError::InvalidRequest(format!(
                "player {puuid} appears in none of the provided matches"
            )));
        }
        ordered.sort_by_key(|m| m.game_start);

        let results: Vec<MatchAnalysisResult> = ordered
            .iter()
            .filter_map(|record| {
                self.analyze_match(&MatchAnalysisRequest {
                    puuid: puuid.to_string(),
                    record: (*record).clone(),
                    options: AnalysisOptions::default(),
                })
                .ok()
            })
            .collect();

        let ratings: Vec<f64> = results.iter().map(|r| r.rating).collect();
        let trend = series_trend(&ratings, self.config.trend_recent);

        let best = results
            .iter()
            .max_by(|a, b| a.rating.total_cmp(&b.rating))
            .map(|r| r.match_id.clone());
        let worst = results
            .iter()
            .min_by(|a, b| a.rating.total_cmp(&b.rating))
            .map(|r| r.match_id.clone());

        let streak = current_streak(&results);
        let volatility = stddev(&ratings);

        let champion_patterns = patterns(
            &results,
            self.config.champion_pattern_min,
            |r| r.performance.champion.clone(),
        );
        let role_patterns = patterns(&results, self.config.role_pattern_min, |r| {
            r.performance.role.as_str().to_string()
        });

        let consistency = metric_consistency(&results);
        let priorities = recurring_priorities(&results, self.config.recurring_min);

        Ok(MatchSeriesAnalysis {
            puuid: puuid.to_string(),
            matches_analyzed: results.len(),
            ratings,
            trend,
            best_match_id: best,
            worst_match_id: worst,
            streak,
            volatility,
            champion_patterns,
            role_patterns,
            consistency,
            priorities,
        })
    }
}

/// Single-match performance line (same formulas as the aggregate engine, at
/// single-match granularity).
#[must_use]
pub fn match_performance(
    record: &MatchRecord,
    participant: &ParticipantRecord,
) -> MatchPerformance {
    let minutes = record.duration_minutes();
    let cs = participant.total_cs();
    let cs_per_minute = if minutes > 0.0 {
        f64::from(cs) / minutes
    } else {
        0.0
    };
    let gold_efficiency = if minutes > 0.0 {
        (f64::from(participant.gold_earned) / minutes / GOLD_EFFICIENCY_BASELINE).min(2.0)
    } else {
        0.0
    };
    let team_damage = record.team_damage(participant.team_id);
    let damage_share = if team_damage > 0 {
        participant.damage_to_champions as f64 / team_damage as f64
    } else {
        0.0
    };

    MatchPerformance {
        kills: participant.kills,
        deaths: participant.deaths,
        assists: participant.assists,
        kda: participant.kda(),
        cs,
        cs_per_minute,
        gold: participant.gold_earned,
        gold_efficiency,
        damage: participant.damage_to_champions,
        damage_share,
        vision: participant.vision_score,
        role: participant.role(),
        champion: participant.champion.clone(),
        win: participant.win,
    }
}

/// Overall match rating on [0, 100]: attainment against fixed benchmarks,
/// weighted win 15 / KDA 30 / CS 20 / damage share 20 / vision 15.
#[must_use]
pub fn match_rating(performance: &MatchPerformance) -> f64 {
    let win_part = if performance.win { 15.0 } else { 0.0 };
    let kda_part = (performance.kda / 4.0).min(1.0) * 30.0;
    let cs_part = (performance.cs_per_minute / 8.0).min(1.0) * 20.0;
    let damage_part = (performance.damage_share / 0.25).min(1.0) * 20.0;
    let vision_part = (f64::from(performance.vision) / 25.0).min(1.0) * 15.0;

    (win_part + kda_part + cs_part + damage_part + vision_part).clamp(0.0, 100.0)
}

fn team_contribution(record: &MatchRecord, participant: &ParticipantRecord) -> TeamContribution {
    let team: Vec<&ParticipantRecord> = record
        .participants
        .iter()
        .filter(|p| p.team_id == participant.team_id)
        .collect();
    let team_kills: u32 = team.iter().map(|p| p.kills).sum();
    let team_damage = record.team_damage(participant.team_id);
    let team_objectives: u32 = team.iter().map(|p| p.objective_takedowns()).sum();
    let team_vision: u32 = team.iter().map(|p| p.vision_score).sum();

    let share = |part: f64, whole: f64| if whole > 0.0 { part / whole } else { 0.0 };
    TeamContribution {
        damage_share: share(participant.damage_to_champions as f64, team_damage as f64),
        kill_participation: share(
            f64::from(participant.kills + participant.assists),
            f64::from(team_kills),
        ),
        objective_participation: share(
            f64::from(participant.objective_takedowns()),
            f64::from(team_objectives),
        ),
        vision_share: share(f64::from(participant.vision_score), f64::from(team_vision)),
    }
}

fn build_insights(performance: &MatchPerformance) -> Vec<String> {
    let mut insights = Vec::new();
    if performance.kda >= 4.0 {
        insights.push(format!("Excellent KDA of {:.1}", performance.kda));
    }
    if performance.damage_share >= 0.28 {
        insights.push(format!(
            "Carried {:.0}% of the team's damage",
            performance.damage_share * 100.0
        ));
    }
    if performance.cs_per_minute >= 8.0 {
        insights.push(format!(
            "Strong farming pace at {:.1} CS/min",
            performance.cs_per_minute
        ));
    }
    if performance.win && performance.kda < 1.0 {
        insights.push("Won despite a rough personal game; the team carried this one".to_string());
    }
    insights
}

fn learning_opportunities(
    performance: &MatchPerformance,
    key_moments: &[KeyMoment],
) -> Vec<String> {
    let mut opportunities: Vec<String> = key_moments
        .iter()
        .filter(|m| !m.positive)
        .map(|m| m.learning_point.clone())
        .collect();

    if performance.cs_per_minute < 5.0 {
        opportunities.push("Raise CS per minute; farm is the steadiest income".to_string());
    }
    if performance.vision < 10 {
        opportunities.push("Increase vision score; wards decide objective fights".to_string());
    }
    if performance.damage_share < 0.15 && !matches!(performance.role, rift_common::Role::Support) {
        opportunities.push("Look for more damage windows in fights".to_string());
    }
    opportunities
}

/// Trend over the last `recent` ratings: first-versus-last with a ±5 band.
fn series_trend(ratings: &[f64], recent: usize) -> TrendLabel {
    if ratings.len() < 2 {
        return TrendLabel::Stable;
    }
    let tail = &ratings[ratings.len().saturating_sub(recent)..];
    let delta = tail[tail.len() - 1] - tail[0];
    if delta > 5.0 {
        TrendLabel::Improving
    } else if delta < -5.0 {
        TrendLabel::Declining
    } else {
        TrendLabel::Stable
    }
}

/// Win/loss streak at the end of the series.
fn current_streak(results: &[MatchAnalysisResult]) -> Option<StreakInfo> {
    let last = results.last()?;
    let winning = last.performance.win;
    let length = results
        .iter()
        .rev()
        .take_while(|r| r.performance.win == winning)
        .count();
    Some(StreakInfo { winning, length })
}

fn patterns(
    results: &[MatchAnalysisResult],
    min_games: usize,
    key: impl Fn(&MatchAnalysisResult) -> String,
) -> Vec<PlayPattern> {
    let mut groups: HashMap<String, Vec<&MatchAnalysisResult>> = HashMap::new();
    for result in results {
        groups.entry(key(result)).or_default().push(result);
    }

    let mut patterns: Vec<PlayPattern> = groups
        .into_iter()
        .filter(|(_, group)| group.len() >= min_games)
        .map(|(label, group)| {
            let games = group.len();
            let wins = group.iter().filter(|r| r.performance.win).count();
            let avg_rating = group.iter().map(|r| r.rating).sum::<f64>() / games as f64;
            PlayPattern {
                label,
                games,
                win_rate: wins as f64 / games as f64,
                avg_rating,
            }
        })
        .collect();
    patterns.sort_by(|a, b| b.games.cmp(&a.games));
    patterns
}

fn metric_consistency(results: &[MatchAnalysisResult]) -> Vec<MetricConsistency> {
    let series = |name: &'static str, values: Vec<f64>| {
        let mean = values.iter().sum::<f64>() / values.len().max(1) as f64;
        let sd = stddev(&values);
        MetricConsistency {
            metric: name,
            mean,
            stddev: sd,
            consistency: (100.0 - sd / mean.max(f64::EPSILON) * 100.0).clamp(0.0, 100.0),
        }
    };

    vec![
        series(
            "kda",
            results.iter().map(|r| r.performance.kda).collect(),
        ),
        series(
            "cs_per_minute",
            results.iter().map(|r| r.performance.cs_per_minute).collect(),
        ),
        series(
            "damage_share",
            results.iter().map(|r| r.performance.damage_share).collect(),
        ),
        series(
            "vision",
            results
                .iter()
                .map(|r| f64::from(r.performance.vision))
                .collect(),
        ),
    ]
}

/// Learning opportunities recurring across the series become priorities.
fn recurring_priorities(results: &[MatchAnalysisResult], min_recurrence: usize) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for result in results {
        for opportunity in &result.learning_opportunities {
            *counts.entry(opportunity.as_str()).or_default() += 1;
        }
    }
    let mut priorities: Vec<(String, usize)> = counts
        .into_iter()
        .filter(|(_, count)| *count >= min_recurrence)
        .map(|(text, count)| (text.to_string(), count))
        .collect();
    priorities.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    priorities.into_iter().map(|(text, _)| text).collect()
}
