//! Match and Participant Records
//!
//! Input records for the analytics engines. Records are immutable once read;
//! the backend derives aggregates from them but never mutates or persists
//! them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Role;

/// Well-known queue identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueId(pub u32);

impl QueueId {
    /// Ranked solo/duo.
    pub const RANKED_SOLO: Self = Self(420);
    /// Ranked flex.
    pub const RANKED_FLEX: Self = Self(440);
    /// Normal draft.
    pub const NORMAL_DRAFT: Self = Self(400);
    /// ARAM.
    pub const ARAM: Self = Self(450);

    /// Human-readable queue name for display and logs.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self.0 {
            420 => "Ranked Solo/Duo",
            440 => "Ranked Flex",
            400 => "Normal Draft",
            450 => "ARAM",
            _ => "Other",
        }
    }

    /// Whether this queue counts toward ranked statistics.
    #[must_use]
    pub const fn is_ranked(self) -> bool {
        matches!(self.0, 420 | 440)
    }
}

/// Per-player line of a match record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    /// Player identifier (PUUID).
    pub puuid: String,
    /// Team identifier (100 = blue side, 200 = red side).
    pub team_id: u32,
    /// Raw role tag as emitted by the data source. Normalize with
    /// [`ParticipantRecord::role`].
    pub role_tag: String,
    /// Champion name.
    pub champion: String,
    /// Kills.
    pub kills: u32,
    /// Deaths.
    pub deaths: u32,
    /// Assists.
    pub assists: u32,
    /// Lane minions killed.
    pub minions_killed: u32,
    /// Neutral (jungle) monsters killed.
    pub neutral_minions_killed: u32,
    /// Gold earned.
    pub gold_earned: u32,
    /// Gold spent.
    pub gold_spent: u32,
    /// Damage dealt to enemy champions.
    pub damage_to_champions: u64,
    /// Vision score.
    pub vision_score: u32,
    /// Dragon takedowns participated in.
    pub dragon_takedowns: u32,
    /// Baron takedowns participated in.
    pub baron_takedowns: u32,
    /// Turret takedowns participated in.
    pub turret_takedowns: u32,
    /// Inhibitor takedowns participated in.
    pub inhibitor_takedowns: u32,
    /// Double kills.
    pub double_kills: u32,
    /// Triple kills.
    pub triple_kills: u32,
    /// Quadra kills.
    pub quadra_kills: u32,
    /// Penta kills.
    pub penta_kills: u32,
    /// Scored the first blood kill.
    pub first_blood_kill: bool,
    /// Assisted the first blood kill.
    pub first_blood_assist: bool,
    /// Whether this participant's team won.
    pub win: bool,
}

impl ParticipantRecord {
    /// Normalized canonical role.
    #[must_use]
    pub fn role(&self) -> Role {
        Role::normalize(&self.role_tag)
    }

    /// Total creep score (lane plus neutral).
    #[must_use]
    pub const fn total_cs(&self) -> u32 {
        self.minions_killed + self.neutral_minions_killed
    }

    /// KDA for this single match. With zero deaths the value is kills plus
    /// assists, undivided.
    #[must_use]
    pub fn kda(&self) -> f64 {
        let ka = f64::from(self.kills) + f64::from(self.assists);
        if self.deaths == 0 {
            ka
        } else {
            ka / f64::from(self.deaths)
        }
    }

    /// Largest multi-kill achieved (2..=5), or 0 when none.
    #[must_use]
    pub const fn largest_multi_kill(&self) -> u32 {
        if self.penta_kills > 0 {
            5
        } else if self.quadra_kills > 0 {
            4
        } else if self.triple_kills > 0 {
            3
        } else if self.double_kills > 0 {
            2
        } else {
            0
        }
    }

    /// Total objective takedowns participated in.
    #[must_use]
    pub const fn objective_takedowns(&self) -> u32 {
        self.dragon_takedowns
            + self.baron_takedowns
            + self.turret_takedowns
            + self.inhibitor_takedowns
    }
}

/// A single match with exactly one participant entry per player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Match identifier.
    pub match_id: String,
    /// Game duration in seconds.
    pub game_duration_secs: u32,
    /// Game start timestamp.
    pub game_start: DateTime<Utc>,
    /// Queue the match was played in.
    pub queue_id: QueueId,
    /// Ordered participant entries.
    pub participants: Vec<ParticipantRecord>,
}

impl MatchRecord {
    /// Finds the participant entry for a player, if present.
    #[must_use]
    pub fn participant(&self, puuid: &str) -> Option<&ParticipantRecord> {
        self.participants.iter().find(|p| p.puuid == puuid)
    }

    /// Sums champion damage across one team.
    #[must_use]
    pub fn team_damage(&self, team_id: u32) -> u64 {
        self.participants
            .iter()
            .filter(|p| p.team_id == team_id)
            .map(|p| p.damage_to_champions)
            .sum()
    }

    /// Game duration in minutes.
    #[must_use]
    pub fn duration_minutes(&self) -> f64 {
        f64::from(self.game_duration_secs) / 60.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(puuid: &str, team_id: u32) -> ParticipantRecord {
        ParticipantRecord {
            puuid: puuid.to_string(),
            team_id,
            role_tag: "MID".to_string(),
            champion: "Ahri".to_string(),
            kills: 5,
            deaths: 2,
            assists: 7,
            minions_killed: 180,
            neutral_minions_killed: 20,
            gold_earned: 12_000,
            gold_spent: 11_000,
            damage_to_champions: 18_000,
            vision_score: 22,
            dragon_takedowns: 1,
            baron_takedowns: 0,
            turret_takedowns: 2,
            inhibitor_takedowns: 0,
            double_kills: 1,
            triple_kills: 0,
            quadra_kills: 0,
            penta_kills: 0,
            first_blood_kill: false,
            first_blood_assist: false,
            win: true,
        }
    }

    #[test]
    fn test_kda_with_deaths() {
        let p = participant("a", 100);
        assert!((p.kda() - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_kda_zero_deaths_returns_kills_plus_assists() {
        let mut p = participant("a", 100);
        p.deaths = 0;
        assert!((p.kda() - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_total_cs() {
        let p = participant("a", 100);
        assert_eq!(p.total_cs(), 200);
    }

    #[test]
    fn test_largest_multi_kill() {
        let mut p = participant("a", 100);
        assert_eq!(p.largest_multi_kill(), 2);
        p.double_kills = 0;
        assert_eq!(p.largest_multi_kill(), 0);
        p.penta_kills = 1;
        assert_eq!(p.largest_multi_kill(), 5);
    }

    #[test]
    fn test_team_damage_sums_one_team() {
        let m = MatchRecord {
            match_id: "NA1_1".to_string(),
            game_duration_secs: 1800,
            game_start: Utc::now(),
            queue_id: QueueId::RANKED_SOLO,
            participants: vec![
                participant("a", 100),
                participant("b", 100),
                participant("c", 200),
            ],
        };
        assert_eq!(m.team_damage(100), 36_000);
        assert_eq!(m.team_damage(200), 18_000);
    }

    #[test]
    fn test_participant_lookup() {
        let m = MatchRecord {
            match_id: "NA1_1".to_string(),
            game_duration_secs: 1800,
            game_start: Utc::now(),
            queue_id: QueueId::RANKED_SOLO,
            participants: vec![participant("a", 100)],
        };
        assert!(m.participant("a").is_some());
        assert!(m.participant("missing").is_none());
    }

    #[test]
    fn test_queue_names() {
        assert_eq!(QueueId::RANKED_SOLO.display_name(), "Ranked Solo/Duo");
        assert!(QueueId::RANKED_SOLO.is_ranked());
        assert!(!QueueId::ARAM.is_ranked());
    }
}
