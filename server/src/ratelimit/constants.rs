//! Rate limiting constants.

/// Extra seconds of TTL on window keys beyond the window itself, so a key
/// never expires while its newest member is still countable.
pub const WINDOW_TTL_SLACK_SECS: u64 = 10;

/// IPv6 prefix segments used for normalization (/64).
pub const IPV6_PREFIX_SEGMENTS: usize = 4;

/// Bounds on the adaptive limit ratio.
pub const ADAPTIVE_RATIO_MIN: f64 = 0.1;
pub const ADAPTIVE_RATIO_MAX: f64 = 3.0;

/// Adaptive recomputation interval in seconds.
pub const ADAPTIVE_INTERVAL_SECS: u64 = 30;

/// Time-of-day multipliers: evening peak and early-morning lull.
pub const PEAK_HOURS_MULTIPLIER: f64 = 1.3;
pub const OFF_HOURS_MULTIPLIER: f64 = 0.7;
