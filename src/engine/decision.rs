use crate::domain::decision::{Decision, DecisionMeta, DecisionOutcome, DecisionPayload, DecisionResult, HitRecord};
use crate::engine::device::{detect_device, Device, MobileClassifier};
use crate::engine::sanitize::{
    clean_identifier, clean_user_agent, fallback_target, ANONYMOUS_CLICK, DEFAULT_LANDING_PAGE,
};
use crate::settings::state::{RuleMode, Settings};
use crate::sources::{Clock, RandomSource};
use crate::validation::country_code::{ensure_or_fallback, UNKNOWN_COUNTRY};
use crate::validation::ip::public_ip;
use crate::vpn::oracle::VpnOracle;
use std::sync::Arc;

pub const MUTE_CYCLE_PERIOD_SECS: i64 = 240;
pub const MUTE_CYCLE_OPEN_SECS: i64 = 120;

/// Decides between the campaign target (A) and the fallback (B) for one click.
///
/// The engine holds no mutable state. Every call works on the settings snapshot it is
/// given, and the VPN oracle is consulted only on the branch that can still end in A.
#[derive(Clone)]
pub struct DecisionEngine {
    pub vpn_oracle: Arc<dyn VpnOracle>,
    pub random: Arc<dyn RandomSource>,
    pub clock: Arc<dyn Clock>,
    pub mobile: Option<Arc<dyn MobileClassifier>>,
}

impl DecisionEngine {
    pub fn new(vpn_oracle: Arc<dyn VpnOracle>, random: Arc<dyn RandomSource>, clock: Arc<dyn Clock>) -> Self {
        Self {
            vpn_oracle,
            random,
            clock,
            mobile: None,
        }
    }

    pub fn with_mobile_classifier(mut self, mobile: Arc<dyn MobileClassifier>) -> Self {
        self.mobile = Some(mobile);
        self
    }

    pub async fn decide(&self, payload: &DecisionPayload, client_ip: &str, settings: &Settings) -> DecisionOutcome {
        let click_id = clean_identifier(&payload.click_id, ANONYMOUS_CLICK);
        let country_code = ensure_or_fallback(&payload.country_code, UNKNOWN_COUNTRY);
        let user_agent = clean_user_agent(&payload.user_agent);
        let landing_page = clean_identifier(&payload.user_lp, DEFAULT_LANDING_PAGE);
        let ip_input = public_ip(&payload.ip_address).unwrap_or_default();
        let device = detect_device(&user_agent, self.mobile.as_deref());

        let fallback_ip = if ip_input.is_empty() { client_ip } else { ip_input.as_str() };
        let mut target = fallback_target(&click_id, &country_code, device, fallback_ip, &landing_page);
        let mut decision = Decision::B;
        let mut vpn = false;

        let base_eligible = settings.system_on
            && !settings.redirect_url.is_empty()
            && settings.allows_country(&country_code)
            && device == Device::Wap;

        if base_eligible && settings.is_active && self.rule_allows(settings) {
            let redirect = settings.redirect_url.trim_end_matches('/').to_string();
            if settings.rule_mode == RuleMode::StaticRoute {
                decision = Decision::A;
                target = redirect;
            } else if self.vpn_oracle.is_vpn(client_ip).await {
                vpn = true;
            } else {
                decision = Decision::A;
                target = redirect;
            }
        }

        tracing::debug!(
            "decision={} device={} vpn={} cc={} mode={}",
            decision.as_str(),
            device.as_str(),
            vpn,
            country_code,
            settings.rule_mode.as_str()
        );

        DecisionOutcome {
            result: DecisionResult {
                decision,
                target,
                meta: DecisionMeta {
                    device,
                    vpn,
                    client_ip: client_ip.to_string(),
                    country_code: country_code.clone(),
                },
            },
            hit: HitRecord {
                ip: client_ip.to_string(),
                ua: user_agent,
                click_id,
                country_code,
                landing_page,
                decision,
            },
        }
    }

    fn rule_allows(&self, settings: &Settings) -> bool {
        match settings.rule_mode {
            RuleMode::None | RuleMode::StaticRoute => true,
            RuleMode::MuteCycle => mute_cycle_open(settings, self.clock.now()),
            RuleMode::RandomRoute => self.random.coin_flip(),
        }
    }
}

/// The cycle is phase-locked to `rule_started_at`, or `updated_at` for legacy rows that
/// never recorded a start.
pub fn mute_cycle_open(settings: &Settings, now: i64) -> bool {
    let reference = match settings.rule_started_at {
        Some(started) => started.max(0),
        None => settings.updated_at,
    };
    let elapsed = (now - reference).max(0);
    elapsed % MUTE_CYCLE_PERIOD_SECS < MUTE_CYCLE_OPEN_SECS
}
