//! Rate limiting types.

use rift_common::Tier;
use serde::Serialize;

/// Named admission contexts. Every scope keeps its own sliding window; a
/// request must pass all applicable scopes and the most restrictive result
/// wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateLimitScope {
    /// Whole-deployment ceiling.
    Global,
    /// Per-client budget by subscription tier.
    Tier,
    /// Per-client budget on a sensitive endpoint class.
    Endpoint,
    /// Per-region ceiling.
    Region,
    /// Analytics computation budget (tier-multiplied baseline).
    Analytics,
    /// Upstream-proxy budget (tier bonuses).
    Proxy,
    /// Data-export budget.
    Export,
}

impl RateLimitScope {
    /// String identifier used in cache keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Tier => "tier",
            Self::Endpoint => "endpoint",
            Self::Region => "region",
            Self::Analytics => "analytics",
            Self::Proxy => "proxy",
            Self::Export => "export",
        }
    }
}

/// Endpoint classes with dedicated budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointClass {
    /// Player/match/champion analytics computations.
    Analytics,
    /// Match reads and processing.
    Matches,
    /// Upstream game-data proxy calls.
    Proxy,
    /// Bulk data exports.
    Export,
    /// Streaming subscriptions.
    Stream,
    /// Everything else.
    Other,
}

impl EndpointClass {
    /// String identifier used in cache keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Analytics => "analytics",
            Self::Matches => "matches",
            Self::Proxy => "proxy",
            Self::Export => "export",
            Self::Stream => "stream",
            Self::Other => "other",
        }
    }
}

/// Result of a single admission check.
#[derive(Debug, Clone, Serialize)]
pub struct AdmissionDecision {
    /// Whether the request is admitted.
    pub allowed: bool,
    /// Scope that produced this decision.
    #[serde(skip)]
    pub scope: RateLimitScope,
    /// Effective limit for the window (after adaptive adjustment).
    pub limit: u32,
    /// Remaining requests in the current window.
    pub remaining: u32,
    /// Unix timestamp when the window resets.
    pub reset_at: u64,
    /// Seconds to wait before retrying (0 when allowed).
    pub retry_after: u64,
    /// True when the cache was unavailable and the check was best-effort.
    pub degraded: bool,
}

impl AdmissionDecision {
    /// Pass-through decision used when rate limiting is disabled or the
    /// client is allowlisted.
    #[must_use]
    pub const fn bypass(scope: RateLimitScope) -> Self {
        Self {
            allowed: true,
            scope,
            limit: 0,
            remaining: 0,
            reset_at: 0,
            retry_after: 0,
            degraded: false,
        }
    }
}

/// Identity of the requesting client, resolved once per request.
///
/// Identification priority: authenticated user id, then API key, then
/// normalized client IP.
#[derive(Debug, Clone)]
pub struct ClientContext {
    /// Stable client identifier (`user:{id}`, `api:{key}`, or the IP).
    pub client_id: String,
    /// Subscription tier; `free` when anonymous.
    pub tier: Tier,
    /// Normalized client IP.
    pub ip: String,
    /// Region label from the routing layer; `global` when absent.
    pub region: String,
}

/// Normalized IP address stored in request extensions.
///
/// IPv4 addresses are stored as-is; IPv6 addresses are collapsed to their
/// /64 prefix.
#[derive(Debug, Clone)]
pub struct NormalizedIp(pub String);
