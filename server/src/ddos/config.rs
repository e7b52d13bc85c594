//! DDoS protection configuration.

/// Tunables for the detectors and the mitigator. All thresholds are
/// snapshot at construction.
#[derive(Debug, Clone)]
pub struct DdosConfig {
    /// Whether detection and mitigation are enabled.
    pub enabled: bool,
    /// Prefix for cache keys (e.g., "ddos").
    pub key_prefix: String,
    /// Trace retention in seconds.
    pub trace_ttl_secs: u64,

    /// Volumetric: requests in the last minute before the detector fires.
    pub volumetric_threshold: u64,
    /// Volumetric: confidence divisor (`count / divisor`, capped at 1).
    pub volumetric_confidence_divisor: f64,

    /// Burst: seconds per sub-window (twelve windows cover the minute).
    pub burst_window_secs: u64,
    /// Burst: requests that make a sub-window high-volume.
    pub burst_high_volume: u64,
    /// Burst: high-volume windows required to fire.
    pub burst_min_high_windows: u64,
    /// Burst: minimum total requests across the minute.
    pub burst_min_total: u64,

    /// Slowloris: connections over the trace window before firing.
    pub slowloris_connections: u64,
    /// Slowloris: fixed confidence assigned to the signature.
    pub slowloris_confidence: f64,

    /// Distributed: active attacking IPs in one /24 before firing.
    pub distributed_subnet_ips: u64,
    /// Distributed: confidence divisor (`ips / divisor`, capped at 1).
    pub distributed_confidence_divisor: f64,

    /// Gaming abuse: summed endpoint counters before firing.
    pub abuse_threshold: i64,
    /// Gaming abuse: confidence divisor (`total / divisor`, capped at 1).
    pub abuse_confidence_divisor: f64,

    /// Minimum confidence for mitigation (distributed attacks bypass this;
    /// their per-client confidence is inherently low).
    pub confidence_gate: f64,
    /// Base block duration in seconds.
    pub base_block_secs: u64,
    /// Extra TTL on block records beyond the block itself.
    pub block_ttl_slack_secs: u64,

    /// Global request volume (RPM) considered anomalous for the traffic
    /// pattern score.
    pub volume_alert_rpm: u64,
}

impl Default for DdosConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            key_prefix: "ddos".to_string(),
            trace_ttl_secs: 600,
            volumetric_threshold: 1_000,
            volumetric_confidence_divisor: 3_000.0,
            burst_window_secs: 5,
            burst_high_volume: 100,
            burst_min_high_windows: 3,
            burst_min_total: 500,
            slowloris_connections: 100,
            slowloris_confidence: 0.6,
            distributed_subnet_ips: 10,
            distributed_confidence_divisor: 50.0,
            abuse_threshold: 100,
            abuse_confidence_divisor: 500.0,
            confidence_gate: 0.7,
            base_block_secs: 900,
            block_ttl_slack_secs: 60,
            volume_alert_rpm: 50_000,
        }
    }
}

impl DdosConfig {
    /// Creates configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DDOS_ENABLED`: enable/disable protection (default: true)
    /// - `DDOS_PREFIX`: cache key prefix (default: "ddos")
    /// - `DDOS_BASE_BLOCK_SECS`: base block duration (default: 900)
    /// - `DDOS_VOLUMETRIC_THRESHOLD`: volumetric trigger (default: 1000)
    /// - `DDOS_CONFIDENCE_GATE`: mitigation gate (default: 0.7)
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("DDOS_ENABLED") {
            config.enabled = val.parse().unwrap_or(true);
        }
        if let Ok(val) = std::env::var("DDOS_PREFIX") {
            config.key_prefix = val;
        }
        if let Ok(val) = std::env::var("DDOS_BASE_BLOCK_SECS") {
            if let Ok(secs) = val.parse() {
                config.base_block_secs = secs;
            }
        }
        if let Ok(val) = std::env::var("DDOS_VOLUMETRIC_THRESHOLD") {
            if let Ok(n) = val.parse() {
                config.volumetric_threshold = n;
            }
        }
        if let Ok(val) = std::env::var("DDOS_CONFIDENCE_GATE") {
            if let Ok(gate) = val.parse() {
                config.confidence_gate = gate;
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_detection_table() {
        let config = DdosConfig::default();
        assert_eq!(config.volumetric_threshold, 1_000);
        assert!((config.volumetric_confidence_divisor - 3_000.0).abs() < f64::EPSILON);
        assert_eq!(config.slowloris_connections, 100);
        assert_eq!(config.distributed_subnet_ips, 10);
        assert_eq!(config.abuse_threshold, 100);
        assert_eq!(config.base_block_secs, 900);
    }
}
