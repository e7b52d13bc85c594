//! Key-moment detection from participant flags.

use rift_common::ParticipantRecord;

use super::config::MatchAnalyzerConfig;
use super::KeyMoment;

/// Reconstructs notable moments from the participant's flags and counters,
/// sorted by importance descending.
#[must_use]
pub fn detect_key_moments(
    participant: &ParticipantRecord,
    config: &MatchAnalyzerConfig,
) -> Vec<KeyMoment> {
    let mut moments = Vec::new();

    if participant.first_blood_kill {
        moments.push(KeyMoment {
            moment_type: "first_blood",
            positive: true,
            importance: 9,
            description: "Secured first blood".to_string(),
            learning_point: "Early aggression converted into a lane lead; look to repeat the setup."
                .to_string(),
        });
    } else if participant.first_blood_assist {
        moments.push(KeyMoment {
            moment_type: "first_blood_assist",
            positive: true,
            importance: 8,
            description: "Assisted the first blood".to_string(),
            learning_point: "Good early roam timing; keep tracking lane states for repeats."
                .to_string(),
        });
    }

    if participant.penta_kills > 0 {
        moments.push(multi_kill(5, participant.penta_kills, 9));
    }
    if participant.quadra_kills > 0 {
        moments.push(multi_kill(4, participant.quadra_kills, 9));
    }
    if participant.triple_kills > 0 {
        moments.push(multi_kill(3, participant.triple_kills, 8));
    }
    if participant.double_kills > 0 {
        moments.push(multi_kill(2, participant.double_kills, 7));
    }

    if participant.deaths > config.high_death_threshold {
        moments.push(KeyMoment {
            moment_type: "high_deaths",
            positive: false,
            importance: 6,
            description: format!("Died {} times", participant.deaths),
            learning_point:
                "Review the death locations; repeated deaths usually share a map position or timer."
                    .to_string(),
        });
    }

    let objectives = participant.objective_takedowns();
    if objectives > 0 {
        moments.push(KeyMoment {
            moment_type: "objective_control",
            positive: true,
            importance: 7,
            description: format!("Participated in {objectives} objective takedowns"),
            learning_point: "Objective presence wins maps; keep rotating on spawn timers."
                .to_string(),
        });
    }

    moments.sort_by(|a, b| b.importance.cmp(&a.importance));
    moments
}

fn multi_kill(size: u32, count: u32, importance: u8) -> KeyMoment {
    let name = match size {
        5 => "penta kill",
        4 => "quadra kill",
        3 => "triple kill",
        _ => "double kill",
    };
    KeyMoment {
        moment_type: match size {
            5 => "penta_kill",
            4 => "quadra_kill",
            3 => "triple_kill",
            _ => "double_kill",
        },
        positive: true,
        importance,
        description: if count == 1 {
            format!("Scored a {name}")
        } else {
            format!("Scored {count} {name}s")
        },
        learning_point: "Multi-kills come from cleanup discipline; note what made the window."
            .to_string(),
    }
}
