//! Client Tiers

use serde::{Deserialize, Serialize};

/// Subscription tier of an API client, sourced from the authenticated
/// context. Unauthenticated and unrecognized clients default to `Free`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Anonymous or free-plan clients.
    #[default]
    Free,
    /// Paid individual plan.
    Premium,
    /// Power-user plan.
    Pro,
    /// Organization plan.
    Enterprise,
}

impl Tier {
    /// Returns the string identifier for this tier (used in cache keys and
    /// response headers).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Premium => "premium",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }

    /// Parses a tier claim, defaulting to `Free` for unknown values.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "premium" => Self::Premium,
            "pro" => Self::Pro,
            "enterprise" => Self::Enterprise,
            _ => Self::Free,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
