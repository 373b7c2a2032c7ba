use serde_json::Value;

pub const UNKNOWN_COUNTRY: &str = "XX";

// ISO-3166-1 alpha-2, kept sorted for binary search.
const ISO_ALPHA2: [&str; 249] = [
    "AD", "AE", "AF", "AG", "AI", "AL", "AM", "AO", "AQ", "AR", "AS", "AT", "AU", "AW", "AX", "AZ",
    "BA", "BB", "BD", "BE", "BF", "BG", "BH", "BI", "BJ", "BL", "BM", "BN", "BO", "BQ", "BR", "BS",
    "BT", "BV", "BW", "BY", "BZ", "CA", "CC", "CD", "CF", "CG", "CH", "CI", "CK", "CL", "CM", "CN",
    "CO", "CR", "CU", "CV", "CW", "CX", "CY", "CZ", "DE", "DJ", "DK", "DM", "DO", "DZ", "EC", "EE",
    "EG", "EH", "ER", "ES", "ET", "FI", "FJ", "FK", "FM", "FO", "FR", "GA", "GB", "GD", "GE", "GF",
    "GG", "GH", "GI", "GL", "GM", "GN", "GP", "GQ", "GR", "GS", "GT", "GU", "GW", "GY", "HK", "HM",
    "HN", "HR", "HT", "HU", "ID", "IE", "IL", "IM", "IN", "IO", "IQ", "IR", "IS", "IT", "JE", "JM",
    "JO", "JP", "KE", "KG", "KH", "KI", "KM", "KN", "KP", "KR", "KW", "KY", "KZ", "LA", "LB", "LC",
    "LI", "LK", "LR", "LS", "LT", "LU", "LV", "LY", "MA", "MC", "MD", "ME", "MF", "MG", "MH", "MK",
    "ML", "MM", "MN", "MO", "MP", "MQ", "MR", "MS", "MT", "MU", "MV", "MW", "MX", "MY", "MZ", "NA",
    "NC", "NE", "NF", "NG", "NI", "NL", "NO", "NP", "NR", "NU", "NZ", "OM", "PA", "PE", "PF", "PG",
    "PH", "PK", "PL", "PM", "PN", "PR", "PS", "PT", "PW", "PY", "QA", "RE", "RO", "RS", "RU", "RW",
    "SA", "SB", "SC", "SD", "SE", "SG", "SH", "SI", "SJ", "SK", "SL", "SM", "SN", "SO", "SR", "SS",
    "ST", "SV", "SX", "SY", "SZ", "TC", "TD", "TF", "TG", "TH", "TJ", "TK", "TL", "TM", "TN", "TO",
    "TR", "TT", "TV", "TW", "TZ", "UA", "UG", "UM", "US", "UY", "UZ", "VA", "VC", "VE", "VG", "VI",
    "VN", "VU", "WF", "WS", "YE", "YT", "ZA", "ZM", "ZW",
];

pub fn normalize(code: &str) -> String {
    let normalized = code.trim().to_ascii_uppercase();
    if normalized.len() != 2 || !normalized.bytes().all(|b| b.is_ascii_alphabetic()) {
        return String::new();
    }
    normalized
}

fn is_tabulated(normalized: &str) -> bool {
    !normalized.is_empty() && ISO_ALPHA2.binary_search(&normalized).is_ok()
}

pub fn is_valid(code: &str) -> bool {
    is_tabulated(&normalize(code))
}

/// Keeps the valid codes of `items` in first-seen order, dropping duplicates.
pub fn sanitize_list<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let candidate = normalize(item.as_ref());
        if !is_tabulated(&candidate) || out.contains(&candidate) {
            continue;
        }
        out.push(candidate);
    }
    out
}

/// Splits free text such as `"us, ca; mx"` or one code per line.
pub fn sanitize_text(input: &str) -> Vec<String> {
    let unified = input.replace(['\r', '\n', ';'], ",");
    sanitize_list(unified.split(',').map(str::trim).filter(|part| !part.is_empty()))
}

/// Accepts either a JSON string or a JSON array; other shapes yield `None`.
pub fn sanitize_json(input: &Value) -> Option<Vec<String>> {
    match input {
        Value::String(text) => Some(sanitize_text(text)),
        Value::Array(items) => Some(sanitize_list(items.iter().filter_map(Value::as_str))),
        _ => None,
    }
}

pub fn ensure_or_fallback(code: &str, fallback: &str) -> String {
    let normalized = normalize(code);
    if is_tabulated(&normalized) {
        return normalized;
    }
    let fallback = normalize(fallback);
    if is_tabulated(&fallback) {
        return fallback;
    }
    UNKNOWN_COUNTRY.to_string()
}
