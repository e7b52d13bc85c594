//! Per-service circuit breaking.
//!
//! Closed circuits forward and count; open circuits fail fast and serve
//! cached fallbacks; half-open circuits admit one trial at a time through a
//! distributed lock. A background probe forces open circuits to half-open
//! once the downstream looks healthy again.

pub mod breaker;
pub mod config;
pub mod fallback;
pub mod probe;
pub mod types;

pub use breaker::CircuitBreaker;
pub use config::{services, CircuitConfig};
pub use fallback::{FallbackCache, FallbackResponse};
pub use probe::{HealthProbe, ANALYTICS_QUEUE_DEPTH_KEY};
pub use types::*;
