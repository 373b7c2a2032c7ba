use crate::engine::device::Device;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Untrusted decision input as received from the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionPayload {
    pub click_id: String,
    pub country_code: String,
    pub user_agent: String,
    pub ip_address: String,
    pub user_lp: String,
}

impl DecisionPayload {
    /// Scalars are stringified, anything else (missing, null, arrays, objects) becomes empty.
    pub fn from_json(body: &Value) -> Self {
        let field = |name: &str| body.get(name).map(scalar_text).unwrap_or_default();
        Self {
            click_id: field("click_id"),
            country_code: field("country_code"),
            user_agent: field("user_agent"),
            ip_address: field("ip_address"),
            user_lp: field("user_lp"),
        }
    }

    /// Like [`from_json`](Self::from_json), but a `user_agent` that is missing or null in the body
    /// is taken from the request's own `User-Agent` header.
    pub fn from_request(body: &Value, header_user_agent: Option<&str>) -> Self {
        let mut payload = Self::from_json(body);
        if body.get("user_agent").map_or(true, Value::is_null) {
            payload.user_agent = header_user_agent.unwrap_or_default().to_string();
        }
        payload
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(true) => "1".to_string(),
        _ => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    A,
    B,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::A => "A",
            Decision::B => "B",
        }
    }

    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("A") {
            Decision::A
        } else {
            Decision::B
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionMeta {
    pub device: Device,
    pub vpn: bool,
    pub client_ip: String,
    pub country_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionResult {
    pub decision: Decision,
    pub target: String,
    pub meta: DecisionMeta,
}

/// One decision as it is handed to the hit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitRecord {
    pub ip: String,
    pub ua: String,
    pub click_id: String,
    pub country_code: String,
    pub landing_page: String,
    pub decision: Decision,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionOutcome {
    pub result: DecisionResult,
    pub hit: HitRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn payload_coerces_scalars_and_drops_structures() {
        let payload = DecisionPayload::from_json(&json!({
            "click_id": 12345,
            "country_code": ["ID"],
            "user_agent": {"ua": "x"},
            "ip_address": null,
            "user_lp": true
        }));
        assert_eq!(payload.click_id, "12345");
        assert_eq!(payload.country_code, "");
        assert_eq!(payload.user_agent, "");
        assert_eq!(payload.ip_address, "");
        assert_eq!(payload.user_lp, "1");
    }

    #[test]
    fn header_user_agent_fills_a_missing_field() {
        let android = "Mozilla/5.0 (Linux; Android 14)";
        let missing = DecisionPayload::from_request(&json!({"click_id": "c1"}), Some(android));
        assert_eq!(missing.user_agent, android);
        let null = DecisionPayload::from_request(&json!({"user_agent": null}), Some(android));
        assert_eq!(null.user_agent, android);

        let given = DecisionPayload::from_request(&json!({"user_agent": "Desktop"}), Some(android));
        assert_eq!(given.user_agent, "Desktop");
        let structured = DecisionPayload::from_request(&json!({"user_agent": ["x"]}), Some(android));
        assert_eq!(structured.user_agent, "");
        assert_eq!(DecisionPayload::from_request(&json!({}), None).user_agent, "");
    }

    #[test]
    fn decision_serializes_as_letter() {
        assert_eq!(serde_json::to_value(Decision::A).unwrap(), json!("A"));
        assert_eq!(Decision::parse("b"), Decision::B);
        assert_eq!(Decision::parse(" a "), Decision::A);
    }
}
