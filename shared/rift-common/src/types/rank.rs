//! Rank Tiers

use serde::{Deserialize, Serialize};

/// Competitive rank tier. Performance scores are normalized against the
/// threshold row for the requested rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RankTier {
    Iron,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Emerald,
    Diamond,
    Master,
    Grandmaster,
    Challenger,
}

impl RankTier {
    /// Returns the canonical uppercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Iron => "IRON",
            Self::Bronze => "BRONZE",
            Self::Silver => "SILVER",
            Self::Gold => "GOLD",
            Self::Platinum => "PLATINUM",
            Self::Emerald => "EMERALD",
            Self::Diamond => "DIAMOND",
            Self::Master => "MASTER",
            Self::Grandmaster => "GRANDMASTER",
            Self::Challenger => "CHALLENGER",
        }
    }

    /// Parses a rank name case-insensitively. Unknown names return `None`;
    /// callers fall back to the `SILVER` threshold row.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "IRON" => Some(Self::Iron),
            "BRONZE" => Some(Self::Bronze),
            "SILVER" => Some(Self::Silver),
            "GOLD" => Some(Self::Gold),
            "PLATINUM" => Some(Self::Platinum),
            "EMERALD" => Some(Self::Emerald),
            "DIAMOND" => Some(Self::Diamond),
            "MASTER" => Some(Self::Master),
            "GRANDMASTER" => Some(Self::Grandmaster),
            "CHALLENGER" => Some(Self::Challenger),
            _ => None,
        }
    }
}

impl std::fmt::Display for RankTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips() {
        for rank in [
            RankTier::Iron,
            RankTier::Silver,
            RankTier::Gold,
            RankTier::Challenger,
        ] {
            assert_eq!(RankTier::parse(rank.as_str()), Some(rank));
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(RankTier::parse("gold"), Some(RankTier::Gold));
        assert_eq!(RankTier::parse(" Emerald "), Some(RankTier::Emerald));
    }

    #[test]
    fn test_unknown_rank() {
        assert_eq!(RankTier::parse("WOOD"), None);
    }

    #[test]
    fn test_ordering() {
        assert!(RankTier::Iron < RankTier::Gold);
        assert!(RankTier::Gold < RankTier::Challenger);
    }
}
