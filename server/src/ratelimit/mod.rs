//! Rate limiting module.
//!
//! Sliding-window admission control over the shared cache. Every request is
//! checked against the global ceiling, the client's tier budget, the
//! endpoint-class budget, and the region ceiling; analytics, upstream-proxy,
//! and export operations carry an additional dedicated scope. An adaptive
//! background task scales all budgets with system load and traffic shape.

pub mod adaptive;
pub mod config;
pub mod constants;
pub mod error;
pub mod ip;
pub mod limiter;
pub mod middleware;
pub mod types;

pub use adaptive::{AdaptiveLimiter, LoadMetrics, LoadSampler, ProcessLoadSampler, SystemLoad, TrafficSignal};
pub use config::*;
pub use constants::*;
pub use error::*;
pub use ip::*;
pub use limiter::*;
pub use middleware::{admission, with_class};
pub use types::*;
