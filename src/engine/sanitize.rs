use crate::engine::device::Device;

pub const MAX_IDENTIFIER_LEN: usize = 64;
pub const MAX_USER_AGENT_LEN: usize = 512;
pub const ANONYMOUS_CLICK: &str = "ANON";
pub const DEFAULT_LANDING_PAGE: &str = "DEFAULT";
pub const FALLBACK_PATH: &str = "/_meetups/";

/// Keeps `[A-Za-z0-9_-]`, caps the length and uppercases; `default` when nothing survives.
pub fn clean_identifier(raw: &str, default: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .take(MAX_IDENTIFIER_LEN)
        .collect::<String>()
        .to_ascii_uppercase();
    if cleaned.is_empty() {
        default.to_string()
    } else {
        cleaned
    }
}

pub fn clean_user_agent(raw: &str) -> String {
    raw.trim().chars().take(MAX_USER_AGENT_LEN).collect()
}

/// Variant B target. Values are lowercased and percent-encoded per RFC 3986.
pub fn fallback_target(click_id: &str, country_code: &str, device: Device, ip: &str, landing_page: &str) -> String {
    let params = [
        ("click_id", click_id.to_lowercase()),
        ("country_code", country_code.to_lowercase()),
        ("user_agent", device.as_str().to_lowercase()),
        ("ip_address", ip.to_string()),
        ("user_lp", landing_page.to_lowercase()),
    ];
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");
    format!("{FALLBACK_PATH}?{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_stripped_and_capped() {
        assert_eq!(clean_identifier("  ab<script>c-1_z ", ANONYMOUS_CLICK), "ABSCRIPTC-1_Z");
        assert_eq!(clean_identifier("%%%", ANONYMOUS_CLICK), "ANON");
        assert_eq!(clean_identifier("", DEFAULT_LANDING_PAGE), "DEFAULT");
        assert_eq!(clean_identifier(&"x".repeat(100), ANONYMOUS_CLICK).len(), 64);
    }

    #[test]
    fn user_agent_is_truncated_by_code_point() {
        let ua = "é".repeat(600);
        let cleaned = clean_user_agent(&format!("  {ua}  "));
        assert_eq!(cleaned.chars().count(), 512);
        assert_eq!(clean_user_agent("  Mozilla  "), "Mozilla");
    }

    #[test]
    fn fallback_uses_percent_twenty_for_spaces() {
        let target = fallback_target("AB", "ID", Device::Wap, "2001:db8::1", "LP 1");
        assert_eq!(
            target,
            "/_meetups/?click_id=ab&country_code=id&user_agent=wap&ip_address=2001%3Adb8%3A%3A1&user_lp=lp%201"
        );
    }
}
