//! Attack-pattern detectors.
//!
//! Each detector reads the request traces and answers with a signature when
//! its threshold is crossed. Detectors are independent and side-effect free;
//! mitigation is the protector's job.

use crate::cache::{Cache, CacheResult};

use super::{AbuseKind, AttackSignature, AttackType, DdosConfig, Severity};

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Requests in the last minute from one client.
pub async fn volumetric(
    cache: &dyn Cache,
    config: &DdosConfig,
    client_key: &str,
    now_nanos: f64,
) -> CacheResult<Option<AttackSignature>> {
    let window_start = now_nanos - 60.0 * NANOS_PER_SEC;
    let count = cache.zcount(client_key, window_start, now_nanos).await?;

    if count <= config.volumetric_threshold {
        return Ok(None);
    }

    let confidence = (count as f64 / config.volumetric_confidence_divisor).min(1.0);
    Ok(Some(AttackSignature {
        attack_type: AttackType::Volumetric,
        severity: Severity::from_confidence(confidence),
        confidence,
        request_count: count,
        detail: format!("{count} requests in 60s"),
    }))
}

/// High-volume spikes inside the last minute: twelve 5-second windows,
/// counting how many exceed the per-window threshold.
pub async fn burst(
    cache: &dyn Cache,
    config: &DdosConfig,
    client_key: &str,
    now_nanos: f64,
) -> CacheResult<Option<AttackSignature>> {
    let window_nanos = config.burst_window_secs as f64 * NANOS_PER_SEC;
    let windows = (60 / config.burst_window_secs).max(1);
    let minute_start = now_nanos - windows as f64 * window_nanos;

    let mut high_windows = 0u64;
    let mut total = 0u64;
    for i in 0..windows {
        let start = minute_start + i as f64 * window_nanos;
        let count = cache
            .zcount(client_key, start, start + window_nanos)
            .await?;
        total += count;
        if count > config.burst_high_volume {
            high_windows += 1;
        }
    }

    if high_windows < config.burst_min_high_windows || total <= config.burst_min_total {
        return Ok(None);
    }

    let confidence = (high_windows as f64 / windows as f64 * 2.0).min(1.0);
    Ok(Some(AttackSignature {
        attack_type: AttackType::Burst,
        severity: Severity::from_confidence(confidence),
        confidence,
        request_count: total,
        detail: format!("{high_windows} high-volume windows, {total} requests in 60s"),
    }))
}

/// Connections held from one IP over the whole trace window.
pub async fn slowloris(
    cache: &dyn Cache,
    config: &DdosConfig,
    ip_key: &str,
    now_nanos: f64,
) -> CacheResult<Option<AttackSignature>> {
    let window_start = now_nanos - config.trace_ttl_secs as f64 * NANOS_PER_SEC;
    let count = cache.zcount(ip_key, window_start, now_nanos).await?;

    if count <= config.slowloris_connections {
        return Ok(None);
    }

    // Confidence is fixed; sustained hoarding at 5x the threshold raises the
    // severity so mitigation can engage.
    let severity = if count > config.slowloris_connections * 5 {
        Severity::High
    } else {
        Severity::Medium
    };
    Ok(Some(AttackSignature {
        attack_type: AttackType::Slowloris,
        severity,
        confidence: config.slowloris_confidence,
        request_count: count,
        detail: format!("{count} connections over {}s", config.trace_ttl_secs),
    }))
}

/// Distinct active IPs in the same /24 allocation.
pub async fn distributed(
    cache: &dyn Cache,
    config: &DdosConfig,
    subnet_key: &str,
    subnet: &str,
    now_nanos: f64,
) -> CacheResult<Option<AttackSignature>> {
    let window_start = now_nanos - config.trace_ttl_secs as f64 * NANOS_PER_SEC;
    let ips = cache.zcount(subnet_key, window_start, now_nanos).await?;

    if ips <= config.distributed_subnet_ips {
        return Ok(None);
    }

    let confidence = (ips as f64 / config.distributed_confidence_divisor).min(1.0);
    let severity = if ips > 60 {
        Severity::Critical
    } else if ips > 30 {
        Severity::High
    } else if ips > 20 {
        Severity::Medium
    } else {
        Severity::Low
    };
    Ok(Some(AttackSignature {
        attack_type: AttackType::Distributed,
        severity,
        confidence,
        request_count: ips,
        detail: format!("{ips} active IPs in {subnet}"),
    }))
}

/// Summed per-endpoint abuse counters.
pub async fn gaming_abuse(
    cache: &dyn Cache,
    config: &DdosConfig,
    abuse_key: &str,
) -> CacheResult<Option<AttackSignature>> {
    let counters = cache.hash_get_all(abuse_key).await?;
    let total: i64 = AbuseKind::all()
        .iter()
        .filter_map(|kind| counters.get(kind.as_str()))
        .filter_map(|v| v.parse::<i64>().ok())
        .sum();

    if total <= config.abuse_threshold {
        return Ok(None);
    }

    let confidence = (total as f64 / config.abuse_confidence_divisor).min(1.0);
    Ok(Some(AttackSignature {
        attack_type: AttackType::GamingAbuse,
        severity: Severity::from_confidence(confidence),
        confidence,
        request_count: total.max(0) as u64,
        detail: format!("{total} abusive endpoint calls"),
    }))
}
