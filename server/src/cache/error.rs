//! Cache error types.

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors surfaced by a cache backend. Callers treat any variant as "cache
/// unavailable" and apply their safe default.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The backend could not be reached or the connection failed mid-call.
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with something the caller cannot interpret.
    #[error("cache protocol error: {0}")]
    Protocol(String),
}
