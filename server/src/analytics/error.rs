//! Analytics error types.

/// Errors from the analytics engine. Always propagated to the caller and
/// recorded as failures against the analytics circuit, except for client
/// errors which only reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    /// A required field is missing or malformed. Never retried.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Fewer participated matches than the configured minimum.
    #[error("insufficient data: {0}")]
    InsufficientData(String),
}

impl AnalyticsError {
    /// Missing-field constructor used by request validation.
    #[must_use]
    pub fn missing_field(field: &str) -> Self {
        Self::InvalidRequest(format!("missing required field `{field}`"))
    }
}
