//! Match analysis error types.

/// Errors from the match analyzer. Propagated to the caller; participant
/// lookups map to the not-found taxonomy at the API boundary.
#[derive(Debug, thiserror::Error)]
pub enum MatchAnalysisError {
    /// A required field is missing or malformed. Never retried.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The player has no participant entry in the match.
    #[error("player {puuid} not found in match {match_id}")]
    ParticipantNotFound { match_id: String, puuid: String },
}

impl MatchAnalysisError {
    /// Missing-field constructor used by request validation.
    #[must_use]
    pub fn missing_field(field: &str) -> Self {
        Self::InvalidRequest(format!("missing required field `{field}`"))
    }
}
