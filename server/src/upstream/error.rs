//! Upstream provider error types.

/// Errors from the upstream game-data provider. Timeouts and 5xx map to the
/// unavailable taxonomy and feed the upstream circuit.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The entity does not exist upstream.
    #[error("upstream entity not found")]
    NotFound,

    /// The provider throttled us.
    #[error("upstream rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The provider timed out or answered 5xx.
    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    /// The response body did not match the expected shape.
    #[error("upstream response malformed: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// Status code this error represents for circuit accounting.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::RateLimited { .. } => 429,
            Self::Unavailable(_) => 503,
            Self::Decode(_) => 502,
        }
    }
}
