//! Circuit breaker types.

use std::collections::HashMap;

use serde::Serialize;

/// Per-service circuit state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitState {
    /// Forwarding every request, counting outcomes.
    Closed,
    /// Failing fast; fallbacks served until the open timeout elapses.
    Open,
    /// One trial request at a time decides recovery.
    HalfOpen,
}

impl CircuitState {
    /// String form stored in the circuit document and emitted in headers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half-open",
        }
    }

    /// Parses the stored form.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "closed" => Some(Self::Closed),
            "open" => Some(Self::Open),
            "half-open" => Some(Self::HalfOpen),
            _ => None,
        }
    }
}

/// One service's circuit document, mirrored to a cache hash.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitRecord {
    /// Service name.
    pub service: String,
    /// Current state.
    pub state: CircuitState,
    /// Total recorded failures.
    pub failure_count: i64,
    /// Total recorded successes.
    pub success_count: i64,
    /// Failures since the last success.
    pub consecutive_failures: i64,
    /// Unix timestamp of the last failure.
    pub last_failure_at: Option<i64>,
    /// Unix timestamp of the last success.
    pub last_success_at: Option<i64>,
    /// Unix timestamp of the last state transition.
    pub state_changed_at: i64,
    /// When an open circuit may try again. Always set while open.
    pub next_retry_at: Option<i64>,
    /// Error rate over the configured window at last evaluation.
    pub error_rate: f64,
}

impl CircuitRecord {
    /// Fresh closed record for a service.
    #[must_use]
    pub fn new_closed(service: &str, now: i64) -> Self {
        Self {
            service: service.to_string(),
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            consecutive_failures: 0,
            last_failure_at: None,
            last_success_at: None,
            state_changed_at: now,
            next_retry_at: None,
            error_rate: 0.0,
        }
    }

    /// Decodes the cache hash form; missing or unparsable fields fall back
    /// to the fresh-closed defaults.
    #[must_use]
    pub fn from_fields(service: &str, fields: &HashMap<String, String>, now: i64) -> Self {
        let get_i64 = |name: &str| fields.get(name).and_then(|v| v.parse::<i64>().ok());
        Self {
            service: service.to_string(),
            state: fields
                .get("state")
                .and_then(|v| CircuitState::parse(v))
                .unwrap_or(CircuitState::Closed),
            failure_count: get_i64("failure_count").unwrap_or(0),
            success_count: get_i64("success_count").unwrap_or(0),
            consecutive_failures: get_i64("consecutive_failures").unwrap_or(0),
            last_failure_at: get_i64("last_failure_at"),
            last_success_at: get_i64("last_success_at"),
            state_changed_at: get_i64("state_changed_at").unwrap_or(now),
            next_retry_at: get_i64("next_retry_at"),
            error_rate: fields
                .get("error_rate")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.0),
        }
    }

    /// Encodes into cache hash fields.
    #[must_use]
    pub fn to_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("state", self.state.as_str().to_string()),
            ("failure_count", self.failure_count.to_string()),
            ("success_count", self.success_count.to_string()),
            (
                "consecutive_failures",
                self.consecutive_failures.to_string(),
            ),
            ("state_changed_at", self.state_changed_at.to_string()),
            ("error_rate", format!("{:.6}", self.error_rate)),
            ("health", if self.state == CircuitState::Closed && self.consecutive_failures == 0 {
                "healthy".to_string()
            } else {
                "degraded".to_string()
            }),
        ];
        if let Some(at) = self.last_failure_at {
            fields.push(("last_failure_at", at.to_string()));
        }
        if let Some(at) = self.last_success_at {
            fields.push(("last_success_at", at.to_string()));
        }
        fields.push((
            "next_retry_at",
            self.next_retry_at.map_or_else(String::new, |at| at.to_string()),
        ));
        fields
    }
}

/// Admission decision from the circuit gate.
#[derive(Debug, Clone)]
pub enum CircuitGate {
    /// Circuit closed; forward the request.
    Allow,
    /// Circuit half-open and this worker holds the trial slot; forward the
    /// request and record the outcome.
    AllowTrial,
    /// Circuit open (or the trial slot is taken); fail fast with a fallback.
    Deny(CircuitRecord),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_roundtrip() {
        for state in [
            CircuitState::Closed,
            CircuitState::Open,
            CircuitState::HalfOpen,
        ] {
            assert_eq!(CircuitState::parse(state.as_str()), Some(state));
        }
        assert_eq!(CircuitState::parse("ajar"), None);
    }

    #[test]
    fn test_record_field_roundtrip() {
        let mut record = CircuitRecord::new_closed("upstream", 1_000);
        record.state = CircuitState::Open;
        record.failure_count = 7;
        record.consecutive_failures = 5;
        record.next_retry_at = Some(1_060);

        let fields: HashMap<String, String> = record
            .to_fields()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let decoded = CircuitRecord::from_fields("upstream", &fields, 2_000);

        assert_eq!(decoded.state, CircuitState::Open);
        assert_eq!(decoded.failure_count, 7);
        assert_eq!(decoded.consecutive_failures, 5);
        assert_eq!(decoded.next_retry_at, Some(1_060));
        assert_eq!(decoded.state_changed_at, 1_000);
    }

    #[test]
    fn test_missing_fields_default_closed() {
        let decoded = CircuitRecord::from_fields("analytics", &HashMap::new(), 500);
        assert_eq!(decoded.state, CircuitState::Closed);
        assert_eq!(decoded.consecutive_failures, 0);
        assert_eq!(decoded.state_changed_at, 500);
    }
}
