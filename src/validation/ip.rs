use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

pub const UNSPECIFIED_IP: &str = "0.0.0.0";

/// Longest textual IP we accept from headers (IPv4-mapped IPv6).
pub const MAX_IP_TEXT_LEN: usize = 45;

fn is_reserved_v4(addr: &Ipv4Addr) -> bool {
    let [first, second, ..] = addr.octets();
    addr.is_private()
        || addr.is_loopback()
        || addr.is_link_local()
        || addr.is_broadcast()
        || first == 0
        || first >= 240
        // 100.64.0.0/10 carrier-grade NAT
        || (first == 100 && (second & 0xc0) == 64)
}

fn is_reserved_v6(addr: &Ipv6Addr) -> bool {
    if let Some(mapped) = addr.to_ipv4_mapped() {
        return is_reserved_v4(&mapped);
    }
    let first = addr.segments()[0];
    addr.is_loopback()
        || addr.is_unspecified()
        // fc00::/7 unique local
        || (first & 0xfe00) == 0xfc00
        // fe80::/10 link local
        || (first & 0xffc0) == 0xfe80
}

pub fn is_public(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(addr) => !is_reserved_v4(addr),
        IpAddr::V6(addr) => !is_reserved_v6(addr),
    }
}

/// Returns the trimmed input when it parses as a public, non-reserved address.
pub fn public_ip(raw: &str) -> Option<String> {
    let candidate = raw.trim();
    if candidate.is_empty() || candidate.len() > MAX_IP_TEXT_LEN {
        return None;
    }
    let parsed: IpAddr = candidate.parse().ok()?;
    is_public(&parsed).then(|| candidate.to_string())
}
