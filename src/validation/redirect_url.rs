use crate::validation::ip::is_public;
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;
use url::Url;

pub const MAX_REDIRECT_URL_LEN: usize = 2048;
pub const MAX_HOST_LEN: usize = 253;

static SCHEME_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[a-z][a-z0-9+.-]*://").expect("static regex"));

static HOSTNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?(\.[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?)*$")
        .expect("static regex")
});

/// Validates a campaign redirect target.
///
/// Returns the cleaned URL (scheme defaulted to `https://`, trailing slashes removed) or an
/// empty string when the input cannot be used as a redirect target. Invalid input is never an
/// error: the campaign simply ends up with no target.
pub fn validate_redirect_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_REDIRECT_URL_LEN {
        return String::new();
    }
    if trimmed.chars().any(|c| c.is_control() || c.is_whitespace()) {
        return String::new();
    }

    let candidate = if SCHEME_PREFIX.is_match(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };

    let Ok(parsed) = Url::parse(&candidate) else {
        return String::new();
    };
    if !matches!(parsed.scheme(), "http" | "https") {
        return String::new();
    }
    if !parsed.username().is_empty() || parsed.password().is_some() {
        return String::new();
    }
    let Some(host) = parsed.host_str() else {
        return String::new();
    };
    let host = host.to_ascii_lowercase();
    if host.is_empty() || host.len() > MAX_HOST_LEN || !HOSTNAME.is_match(&host) {
        return String::new();
    }
    if host == "localhost" || host.ends_with(".localhost") {
        return String::new();
    }
    if let Ok(ip) = host.parse::<IpAddr>() {
        if !is_public(&ip) {
            return String::new();
        }
    }

    candidate.trim_end_matches('/').to_string()
}
