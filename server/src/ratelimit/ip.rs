//! IP extraction and normalization.
//!
//! Admission keys and DDoS traces are keyed by a normalized client address:
//! IPv4 as-is, IPv6 collapsed to its /64 allocation so one allocation cannot
//! sidestep its budget by rotating interface identifiers.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use axum::extract::ConnectInfo;
use axum::http::HeaderMap;

use super::constants::IPV6_PREFIX_SEGMENTS;

/// Extract the client IP from request headers or connection info.
///
/// When `trust_proxy` is true, X-Forwarded-For (first hop) and X-Real-IP are
/// consulted before the socket address. Falls back to 127.0.0.1 when nothing
/// is available.
pub fn extract_client_ip(
    headers: &HeaderMap,
    connect_info: Option<&ConnectInfo<SocketAddr>>,
    trust_proxy: bool,
) -> IpAddr {
    if trust_proxy {
        if let Some(forwarded) = headers.get("X-Forwarded-For") {
            if let Ok(s) = forwarded.to_str() {
                if let Some(first_ip) = s.split(',').next() {
                    if let Ok(ip) = first_ip.trim().parse() {
                        return ip;
                    }
                }
            }
        }
        if let Some(real_ip) = headers.get("X-Real-IP") {
            if let Ok(s) = real_ip.to_str() {
                if let Ok(ip) = s.trim().parse() {
                    return ip;
                }
            }
        }
    }
    connect_info
        .map(|c| c.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

/// Normalize an IP address for keying.
pub fn normalize_ip(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => v4.to_string(),
        IpAddr::V6(v6) => {
            let seg = v6.segments();
            let prefix: Vec<String> = (0..IPV6_PREFIX_SEGMENTS)
                .map(|i| format!("{:x}", seg[i]))
                .collect();
            format!("{}::/64", prefix.join(":"))
        }
    }
}

/// The /24 subnet of a normalized address, used for distributed-attack
/// grouping and subnet blocks. Non-IPv4 inputs are grouped under their own
/// normalized form.
pub fn subnet24(normalized_ip: &str) -> String {
    normalized_ip.parse::<Ipv4Addr>().map_or_else(
        |_| normalized_ip.to_string(),
        |v4| {
            let o = v4.octets();
            format!("{}.{}.{}.0/24", o[0], o[1], o[2])
        },
    )
}
