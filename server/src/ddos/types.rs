//! DDoS detection types.

use serde::{Deserialize, Serialize};

/// Attack patterns the detectors look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackType {
    /// Raw request volume from one client.
    Volumetric,
    /// Short high-volume spikes inside the minute.
    Burst,
    /// Many connections held over a long window.
    Slowloris,
    /// Coordinated traffic from one /24 allocation.
    Distributed,
    /// Abuse of expensive gaming endpoints.
    GamingAbuse,
}

impl AttackType {
    /// String identifier used in cache keys and responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Volumetric => "volumetric",
            Self::Burst => "burst",
            Self::Slowloris => "slowloris",
            Self::Distributed => "distributed",
            Self::GamingAbuse => "gaming_abuse",
        }
    }

    /// Parses the cache-key form back into the enum.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "volumetric" => Some(Self::Volumetric),
            "burst" => Some(Self::Burst),
            "slowloris" => Some(Self::Slowloris),
            "distributed" => Some(Self::Distributed),
            "gaming_abuse" => Some(Self::GamingAbuse),
            _ => None,
        }
    }
}

/// How serious a detected pattern is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// String identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Parses the cache-key form back into the enum.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Default severity band for a confidence value.
    #[must_use]
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.95 {
            Self::Critical
        } else if confidence >= 0.8 {
            Self::High
        } else if confidence >= 0.6 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Output of one detector run.
#[derive(Debug, Clone, Serialize)]
pub struct AttackSignature {
    /// Detected pattern.
    pub attack_type: AttackType,
    /// Severity band.
    pub severity: Severity,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f64,
    /// Observed request count behind the signature.
    pub request_count: u64,
    /// Short human-readable description for logs and block records.
    pub detail: String,
}

/// Abuse counters for expensive gaming endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbuseKind {
    /// Analytics recomputation spam.
    AnalyticsSpam,
    /// Upstream-proxy hammering.
    ProxyAbuse,
    /// Bulk-export spam.
    ExportSpam,
}

impl AbuseKind {
    /// Hash field name for the counter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AnalyticsSpam => "analytics_spam",
            Self::ProxyAbuse => "proxy_abuse",
            Self::ExportSpam => "export_spam",
        }
    }

    /// All counter fields.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::AnalyticsSpam, Self::ProxyAbuse, Self::ExportSpam]
    }
}

/// A standing block decision for one client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Blocked client identifier.
    pub client_id: String,
    /// Why the block was placed.
    pub reason: String,
    /// Detected attack pattern.
    pub attack_type: AttackType,
    /// Severity at detection time.
    pub severity: Severity,
    /// Unix timestamp the block expires at.
    pub blocked_until: i64,
    /// Originating IP at detection time.
    pub source_ip: String,
    /// Request count snapshot from the signature.
    pub request_count: u64,
}
