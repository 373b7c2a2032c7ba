use crate::validation::ip::{public_ip, MAX_IP_TEXT_LEN, UNSPECIFIED_IP};
use axum::http::HeaderMap;
use std::net::IpAddr;

/// Proxy headers in trust order; each may carry a comma separated chain.
const FORWARDING_HEADERS: [&str; 3] = ["cf-connecting-ip", "true-client-ip", "x-forwarded-for"];

/// First public address among the forwarding headers and then the peer, else `0.0.0.0`.
pub fn resolve_client_ip(headers: &HeaderMap, peer: Option<IpAddr>) -> String {
    let peer_text = peer.map(|ip| ip.to_string());
    let candidates = FORWARDING_HEADERS
        .iter()
        .filter_map(|name| headers.get(*name))
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .chain(peer_text.as_deref());

    for raw in candidates {
        let raw = raw.trim();
        if raw.is_empty() || raw.len() > MAX_IP_TEXT_LEN {
            continue;
        }
        if let Some(ip) = public_ip(raw) {
            return ip;
        }
    }
    UNSPECIFIED_IP.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn headers_are_checked_in_trust_order() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("8.8.8.8"));
        headers.insert("cf-connecting-ip", HeaderValue::from_static("1.1.1.1"));
        assert_eq!(resolve_client_ip(&headers, None), "1.1.1.1");
    }

    #[test]
    fn private_hops_in_a_chain_are_skipped() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.2, , 192.168.1.1, 93.184.216.34"));
        assert_eq!(resolve_client_ip(&headers, None), "93.184.216.34");
    }

    #[test]
    fn peer_address_is_the_last_resort() {
        let headers = HeaderMap::new();
        let peer: IpAddr = "93.184.216.34".parse().unwrap();
        assert_eq!(resolve_client_ip(&headers, Some(peer)), "93.184.216.34");

        let loopback: IpAddr = "127.0.0.1".parse().unwrap();
        assert_eq!(resolve_client_ip(&headers, Some(loopback)), "0.0.0.0");
        assert_eq!(resolve_client_ip(&headers, None), "0.0.0.0");
    }
}
