//! Role Normalization
//!
//! Participant records arrive with whatever role tag the data source emitted.
//! Everything downstream (role breakdowns, expectations, insights) works on
//! the five canonical positions, so tags are normalized exactly once at the
//! point of use.

use serde::{Deserialize, Serialize};

/// Canonical position played by a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Top lane.
    Top,
    /// Jungle.
    Jungle,
    /// Mid lane.
    Middle,
    /// Bot lane carry.
    Bottom,
    /// Support.
    Support,
    /// Tag could not be mapped to a canonical position.
    Unknown,
}

impl Role {
    /// Normalizes a raw role tag to a canonical position.
    ///
    /// Known synonyms (`MID`, `ADC`, `UTILITY`, ...) are mapped; anything
    /// else becomes [`Role::Unknown`].
    #[must_use]
    pub fn normalize(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "TOP" => Self::Top,
            "JUNGLE" | "JGL" | "JUNG" => Self::Jungle,
            "MIDDLE" | "MID" => Self::Middle,
            "BOTTOM" | "BOT" | "ADC" | "CARRY" => Self::Bottom,
            "SUPPORT" | "UTILITY" | "SUPP" | "SUP" => Self::Support,
            _ => Self::Unknown,
        }
    }

    /// Returns the canonical string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "TOP",
            Self::Jungle => "JUNGLE",
            Self::Middle => "MIDDLE",
            Self::Bottom => "BOTTOM",
            Self::Support => "SUPPORT",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// The five canonical positions, excluding [`Role::Unknown`].
    #[must_use]
    pub const fn canonical() -> [Self; 5] {
        [
            Self::Top,
            Self::Jungle,
            Self::Middle,
            Self::Bottom,
            Self::Support,
        ]
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
