use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static BOT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(bot|crawl|spider)\b").unwrap());
static TABLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(tablet|ipad)\b").unwrap());
static MOBILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(iphone|android|mobile|mobi|wap)\b").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Device {
    Bot,
    Tablet,
    Wap,
    Web,
}

impl Device {
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Bot => "BOT",
            Device::Tablet => "TABLET",
            Device::Wap => "WAP",
            Device::Web => "WEB",
        }
    }
}

/// A richer mobile detector that may be plugged in ahead of the keyword fallback.
/// Returning `None` defers to the keyword rules.
pub trait MobileClassifier: Send + Sync {
    fn classify(&self, user_agent: &str) -> Option<Device>;
}

pub fn detect_device(user_agent: &str, mobile: Option<&dyn MobileClassifier>) -> Device {
    if user_agent.is_empty() {
        return Device::Web;
    }
    if BOT.is_match(user_agent) {
        return Device::Bot;
    }
    if let Some(device) = mobile.and_then(|m| m.classify(user_agent)) {
        return device;
    }
    if TABLET.is_match(user_agent) {
        Device::Tablet
    } else if MOBILE.is_match(user_agent) {
        Device::Wap
    } else {
        Device::Web
    }
}
