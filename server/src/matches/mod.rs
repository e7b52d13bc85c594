//! Match analyzer.
//!
//! Per-match and series analyses: single-match performance lines, phase
//! decomposition, key moments, team contribution, series patterns, and
//! two-match comparisons. Pure computation, like the analytics engine.

pub mod analyzer;
pub mod compare;
pub mod config;
pub mod error;
pub mod moments;
pub mod phases;
pub mod types;

pub use analyzer::MatchAnalyzer;
pub use compare::compare_matches;
pub use config::{MatchAnalyzerConfig, PhaseDistribution, PhaseShare};
pub use error::MatchAnalysisError;
pub use types::*;
