//! Rate limiting configuration.

use std::collections::HashSet;

use rift_common::Tier;

use super::EndpointClass;

/// Configuration for the rate limiting system.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Whether rate limiting is enabled.
    pub enabled: bool,
    /// Prefix for cache keys (e.g., "rl").
    pub key_prefix: String,
    /// Whether to allow requests when the cache is unavailable.
    pub fail_open: bool,
    /// Whether to trust X-Forwarded-For headers.
    pub trust_proxy: bool,
    /// Client identifiers that bypass rate limiting.
    pub allowlist: HashSet<String>,
    /// Whole-deployment ceiling.
    pub global: LimitConfig,
    /// Per-region ceiling.
    pub region: LimitConfig,
    /// Per-tier client budgets.
    pub tiers: TierLimits,
    /// Sensitive endpoint budgets.
    pub endpoints: EndpointLimits,
    /// Analytics baseline RPM, multiplied per tier.
    pub analytics_base: LimitConfig,
    /// Upstream-proxy baseline RPM, plus per-tier bonuses.
    pub proxy_base: LimitConfig,
    /// Data-export budget.
    pub export: LimitConfig,
}

/// Configuration for a single rate limit.
#[derive(Debug, Clone, Copy)]
pub struct LimitConfig {
    /// Maximum requests allowed in the window.
    pub requests: u32,
    /// Window duration in seconds.
    pub window_secs: u64,
}

/// Per-tier request budgets.
#[derive(Debug, Clone)]
pub struct TierLimits {
    pub free: LimitConfig,
    pub premium: LimitConfig,
    pub pro: LimitConfig,
    pub enterprise: LimitConfig,
}

/// Budgets for sensitive endpoint classes. Analytics, proxy, and export
/// carry dedicated scopes instead (tier-multiplied baselines), so only the
/// remaining sensitive classes appear here.
#[derive(Debug, Clone)]
pub struct EndpointLimits {
    pub matches: LimitConfig,
    pub stream: LimitConfig,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            key_prefix: "rl".to_string(),
            fail_open: true,
            trust_proxy: false,
            allowlist: HashSet::new(),
            global: LimitConfig {
                requests: 100_000,
                window_secs: 60,
            },
            region: LimitConfig {
                requests: 25_000,
                window_secs: 60,
            },
            tiers: TierLimits::default(),
            endpoints: EndpointLimits::default(),
            analytics_base: LimitConfig {
                requests: 180,
                window_secs: 60,
            },
            proxy_base: LimitConfig {
                requests: 100,
                window_secs: 60,
            },
            export: LimitConfig {
                requests: 10,
                window_secs: 60,
            },
        }
    }
}

impl Default for TierLimits {
    fn default() -> Self {
        Self {
            free: LimitConfig {
                requests: 60,
                window_secs: 60,
            },
            premium: LimitConfig {
                requests: 300,
                window_secs: 60,
            },
            pro: LimitConfig {
                requests: 1_200,
                window_secs: 60,
            },
            enterprise: LimitConfig {
                requests: 6_000,
                window_secs: 60,
            },
        }
    }
}

impl Default for EndpointLimits {
    fn default() -> Self {
        Self {
            matches: LimitConfig {
                requests: 240,
                window_secs: 60,
            },
            stream: LimitConfig {
                requests: 20,
                window_secs: 60,
            },
        }
    }
}

impl RateLimitConfig {
    /// Budget for a client tier.
    #[must_use]
    pub const fn tier_limit(&self, tier: Tier) -> LimitConfig {
        match tier {
            Tier::Free => self.tiers.free,
            Tier::Premium => self.tiers.premium,
            Tier::Pro => self.tiers.pro,
            Tier::Enterprise => self.tiers.enterprise,
        }
    }

    /// Budget for a sensitive endpoint class. Classes with a dedicated
    /// scope (analytics, proxy, export) and plain traffic fall back to the
    /// tier budget alone.
    #[must_use]
    pub const fn endpoint_limit(&self, class: EndpointClass) -> Option<LimitConfig> {
        match class {
            EndpointClass::Matches => Some(self.endpoints.matches),
            EndpointClass::Stream => Some(self.endpoints.stream),
            _ => None,
        }
    }

    /// Analytics budget: baseline multiplied per tier (free ×1, premium ×2,
    /// pro ×5, enterprise ×10).
    #[must_use]
    pub const fn analytics_limit(&self, tier: Tier) -> LimitConfig {
        let factor = match tier {
            Tier::Free => 1,
            Tier::Premium => 2,
            Tier::Pro => 5,
            Tier::Enterprise => 10,
        };
        LimitConfig {
            requests: self.analytics_base.requests * factor,
            window_secs: self.analytics_base.window_secs,
        }
    }

    /// Upstream-proxy budget: baseline plus per-tier bonus (+0/+50/+200/+500).
    #[must_use]
    pub const fn proxy_limit(&self, tier: Tier) -> LimitConfig {
        let bonus = match tier {
            Tier::Free => 0,
            Tier::Premium => 50,
            Tier::Pro => 200,
            Tier::Enterprise => 500,
        };
        LimitConfig {
            requests: self.proxy_base.requests + bonus,
            window_secs: self.proxy_base.window_secs,
        }
    }

    /// Creates configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RATE_LIMIT_ENABLED`: enable/disable rate limiting (default: true)
    /// - `RATE_LIMIT_PREFIX`: cache key prefix (default: "rl")
    /// - `RATE_LIMIT_FAIL_OPEN`: allow requests when the cache is down (default: true)
    /// - `RATE_LIMIT_TRUST_PROXY`: trust X-Forwarded-For headers (default: false)
    /// - `RATE_LIMIT_ALLOWLIST`: comma-separated identifier allowlist
    /// - `RATE_LIMIT_GLOBAL`, `RATE_LIMIT_REGION`: "requests,window_secs"
    /// - `RATE_LIMIT_TIER_FREE` / `_PREMIUM` / `_PRO` / `_ENTERPRISE`
    /// - `RATE_LIMIT_ANALYTICS`, `RATE_LIMIT_PROXY`, `RATE_LIMIT_EXPORT`
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("RATE_LIMIT_ENABLED") {
            config.enabled = val.parse().unwrap_or(true);
        }
        if let Ok(val) = std::env::var("RATE_LIMIT_PREFIX") {
            config.key_prefix = val;
        }
        if let Ok(val) = std::env::var("RATE_LIMIT_FAIL_OPEN") {
            config.fail_open = val.parse().unwrap_or(true);
        }
        if let Ok(val) = std::env::var("RATE_LIMIT_TRUST_PROXY") {
            config.trust_proxy = val.parse().unwrap_or(false);
        }
        if let Ok(val) = std::env::var("RATE_LIMIT_ALLOWLIST") {
            config.allowlist = val.split(',').map(|s| s.trim().to_string()).collect();
        }

        for (var, slot) in [
            ("RATE_LIMIT_GLOBAL", &mut config.global),
            ("RATE_LIMIT_REGION", &mut config.region),
            ("RATE_LIMIT_TIER_FREE", &mut config.tiers.free),
            ("RATE_LIMIT_TIER_PREMIUM", &mut config.tiers.premium),
            ("RATE_LIMIT_TIER_PRO", &mut config.tiers.pro),
            ("RATE_LIMIT_TIER_ENTERPRISE", &mut config.tiers.enterprise),
            ("RATE_LIMIT_ANALYTICS", &mut config.analytics_base),
            ("RATE_LIMIT_PROXY", &mut config.proxy_base),
            ("RATE_LIMIT_EXPORT", &mut config.export),
        ] {
            if let Ok(val) = std::env::var(var) {
                if let Some(limit) = parse_limit_config(&val) {
                    *slot = limit;
                }
            }
        }

        config
    }
}

/// Parses a limit config from "requests,window_secs" format.
fn parse_limit_config(val: &str) -> Option<LimitConfig> {
    let parts: Vec<&str> = val.split(',').collect();
    if parts.len() == 2 {
        let requests = parts[0].trim().parse().ok()?;
        let window_secs = parts[1].trim().parse().ok()?;
        Some(LimitConfig {
            requests,
            window_secs,
        })
    } else {
        None
    }
}
