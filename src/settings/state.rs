use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleMode {
    #[default]
    None,
    MuteCycle,
    RandomRoute,
    StaticRoute,
}

impl RuleMode {
    /// Unknown, empty and the legacy `normal` value all collapse to `None`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mute_cycle" => RuleMode::MuteCycle,
            "random_route" => RuleMode::RandomRoute,
            "static_route" => RuleMode::StaticRoute,
            _ => RuleMode::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleMode::None => "none",
            RuleMode::MuteCycle => "mute_cycle",
            RuleMode::RandomRoute => "random_route",
            RuleMode::StaticRoute => "static_route",
        }
    }
}

/// The singleton campaign configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    pub system_on: bool,
    pub redirect_url: String,
    pub is_active: bool,
    pub allowed_countries: Vec<String>,
    pub rule_mode: RuleMode,
    pub rule_started_at: Option<i64>,
    pub updated_at: i64,
}

impl Settings {
    pub fn new(now: i64) -> Self {
        Self {
            system_on: false,
            redirect_url: String::new(),
            is_active: false,
            allowed_countries: Vec::new(),
            rule_mode: RuleMode::None,
            rule_started_at: None,
            updated_at: now,
        }
    }

    pub fn allows_country(&self, country_code: &str) -> bool {
        self.allowed_countries.is_empty() || self.allowed_countries.iter().any(|c| c == country_code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountryListInput {
    Text(String),
    Codes(Vec<String>),
}

/// A partial update. Only present fields are merged; values are raw and get
/// validated when the patch is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub system_on: Option<bool>,
    pub redirect_url: Option<String>,
    pub is_active: Option<bool>,
    pub allowed_countries: Option<CountryListInput>,
    pub rule_mode: Option<String>,
}

impl SettingsPatch {
    /// Builds a patch from an admin JSON body. Fields of the wrong shape are ignored
    /// rather than rejected; flags follow loose truthiness.
    pub fn from_json(body: &Value) -> Self {
        let Some(map) = body.as_object() else {
            return Self::default();
        };

        let allowed_countries = match map.get("allowed_countries") {
            Some(Value::String(text)) => Some(CountryListInput::Text(text.clone())),
            Some(Value::Array(items)) => Some(CountryListInput::Codes(
                items.iter().filter_map(Value::as_str).map(str::to_string).collect(),
            )),
            _ => None,
        };

        Self {
            system_on: map.get("system_on").map(loose_bool),
            redirect_url: map.get("redirect_url").and_then(Value::as_str).map(str::to_string),
            is_active: map.get("is_active").map(loose_bool),
            allowed_countries,
            rule_mode: map.get("rule_mode").and_then(Value::as_str).map(str::to_string),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

pub fn loose_bool(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}
