//! Match analyzer configuration.

/// Share of a whole-game stat attributed to one phase. The per-phase K/D/A
/// split is a fixed approximation; per-event timeline data would replace it
/// if it were added to the input.
#[derive(Debug, Clone, Copy)]
pub struct PhaseShare {
    pub kills: f64,
    pub deaths: f64,
    pub assists: f64,
    pub cs: f64,
    pub gold: f64,
    pub damage: f64,
}

/// Distribution coefficients per phase. Each stat's shares sum to 1 across
/// the three phases.
#[derive(Debug, Clone, Copy)]
pub struct PhaseDistribution {
    pub lane: PhaseShare,
    pub mid: PhaseShare,
    pub late: PhaseShare,
}

impl Default for PhaseDistribution {
    fn default() -> Self {
        Self {
            lane: PhaseShare {
                kills: 0.20,
                deaths: 0.25,
                assists: 0.15,
                cs: 0.35,
                gold: 0.30,
                damage: 0.20,
            },
            mid: PhaseShare {
                kills: 0.35,
                deaths: 0.35,
                assists: 0.35,
                cs: 0.35,
                gold: 0.35,
                damage: 0.35,
            },
            late: PhaseShare {
                kills: 0.45,
                deaths: 0.40,
                assists: 0.50,
                cs: 0.30,
                gold: 0.35,
                damage: 0.45,
            },
        }
    }
}

/// Immutable match-analyzer tunables.
#[derive(Debug, Clone)]
pub struct MatchAnalyzerConfig {
    /// Lane phase ends at this game time.
    pub lane_phase_end_secs: u32,
    /// Mid phase ends at this game time; everything after is late game.
    pub mid_phase_end_secs: u32,
    /// Fixed per-phase stat distribution.
    pub phase_distribution: PhaseDistribution,
    /// Deaths above this count produce a negative key moment.
    pub high_death_threshold: u32,
    /// Matches a learning opportunity must recur in to become a series
    /// priority.
    pub recurring_min: usize,
    /// Games required for a champion pattern.
    pub champion_pattern_min: usize,
    /// Games required for a role pattern.
    pub role_pattern_min: usize,
    /// Ratings considered for the series trend.
    pub trend_recent: usize,
}

impl Default for MatchAnalyzerConfig {
    fn default() -> Self {
        Self {
            lane_phase_end_secs: 15 * 60,
            mid_phase_end_secs: 25 * 60,
            phase_distribution: PhaseDistribution::default(),
            high_death_threshold: 3,
            recurring_min: 3,
            champion_pattern_min: 3,
            role_pattern_min: 2,
            trend_recent: 3,
        }
    }
}
