//! Per-operation health reporting.

use std::collections::BTreeMap;

use dashmap::DashMap;

/// Canonical operation names reported by the health surface.
pub const OPERATIONS: &[&str] = &[
    "GetPlayerAnalytics",
    "GetMatchAnalytics",
    "GetChampionAnalytics",
    "StreamAnalytics",
    "BatchProcessAnalytics",
    "CalculateSkillGap",
    "ProcessMatch",
    "BatchProcessMatches",
    "GetMatch",
    "SearchMatches",
    "ExportMatches",
    "StreamLiveMatch",
    "GetMatchTimeline",
    "GetSummoner",
    "GetMatchHistory",
    "GetRankedStats",
    "GetChampionMastery",
    "GetCurrentGame",
    "SyncPlayer",
    "GetRateLimitInfo",
];

/// Serving status per operation. Everything initializes as serving and
/// flips to not-serving at shutdown so load balancers drain before the
/// listener closes.
pub struct HealthRegistry {
    serving: DashMap<&'static str, bool>,
}

impl HealthRegistry {
    /// Creates a registry with every operation serving.
    #[must_use]
    pub fn new() -> Self {
        let serving = DashMap::new();
        for op in OPERATIONS {
            serving.insert(*op, true);
        }
        Self { serving }
    }

    /// Marks one operation serving or not.
    pub fn set_serving(&self, operation: &'static str, is_serving: bool) {
        self.serving.insert(operation, is_serving);
    }

    /// Flips every operation to not-serving (shutdown).
    pub fn set_shutting_down(&self) {
        for mut entry in self.serving.iter_mut() {
            *entry.value_mut() = false;
        }
    }

    /// Whether every operation is serving.
    #[must_use]
    pub fn all_serving(&self) -> bool {
        self.serving.iter().all(|entry| *entry.value())
    }

    /// Snapshot of all statuses.
    #[must_use]
    pub fn statuses(&self) -> BTreeMap<&'static str, &'static str> {
        self.serving
            .iter()
            .map(|entry| {
                (
                    *entry.key(),
                    if *entry.value() { "SERVING" } else { "NOT_SERVING" },
                )
            })
            .collect()
    }
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initializes_serving() {
        let registry = HealthRegistry::new();
        assert!(registry.all_serving());
        assert_eq!(registry.statuses().len(), OPERATIONS.len());
    }

    #[test]
    fn test_shutdown_flips_everything() {
        let registry = HealthRegistry::new();
        registry.set_shutting_down();
        assert!(!registry.all_serving());
        assert!(registry
            .statuses()
            .values()
            .all(|status| *status == "NOT_SERVING"));
    }

    #[test]
    fn test_single_operation_flip() {
        let registry = HealthRegistry::new();
        registry.set_serving("GetPlayerAnalytics", false);
        assert!(!registry.all_serving());
        assert_eq!(
            registry.statuses().get("GetPlayerAnalytics"),
            Some(&"NOT_SERVING")
        );
    }
}
