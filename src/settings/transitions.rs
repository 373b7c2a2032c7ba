use crate::settings::state::{CountryListInput, RuleMode, Settings, SettingsPatch};
use crate::validation::country_code;
use crate::validation::redirect_url::validate_redirect_url;

/// Merges `patch` into `current` and settles the rule timer.
///
/// The timer restarts whenever the rule mode or the active flag changes, and is cleared
/// whenever the rule cannot run (inactive, or mode `none`).
pub fn apply_patch(current: Settings, patch: &SettingsPatch, now: i64) -> Settings {
    let mut next = current.clone();

    if let Some(system_on) = patch.system_on {
        next.system_on = system_on;
    }
    if let Some(is_active) = patch.is_active {
        next.is_active = is_active;
    }
    if let Some(raw) = &patch.redirect_url {
        next.redirect_url = validate_redirect_url(raw);
    }
    if let Some(input) = &patch.allowed_countries {
        next.allowed_countries = match input {
            CountryListInput::Text(text) => country_code::sanitize_text(text),
            CountryListInput::Codes(codes) => country_code::sanitize_list(codes),
        };
    }
    if let Some(raw) = &patch.rule_mode {
        next.rule_mode = RuleMode::parse(raw);
    }

    let changed = next.rule_mode != current.rule_mode || next.is_active != current.is_active;
    next.rule_started_at = if !next.is_active || next.rule_mode == RuleMode::None {
        None
    } else {
        match current.rule_started_at {
            Some(started) if !changed => Some(started.max(0)),
            _ => Some(now),
        }
    };

    next.updated_at = now;
    next
}
