use serde_json::json;
use smart_redirect::settings::state::{RuleMode, Settings, SettingsPatch};
use smart_redirect::settings::store::{InMemorySettingsStore, SettingsStore};
use smart_redirect::settings::transitions::apply_patch;
use smart_redirect::sources::ManualClock;
use std::sync::Arc;

const T: i64 = 1_700_000_000;

#[test]
fn activation_starts_timer_and_url_change_keeps_it() {
    let mut prior = Settings::new(T - 3600);
    prior.is_active = false;
    prior.rule_mode = RuleMode::None;

    let activate = SettingsPatch::from_json(&json!({"is_active": true, "rule_mode": "mute_cycle"}));
    let active = apply_patch(prior, &activate, T);
    assert_eq!(active.rule_started_at, Some(T));

    let retarget = SettingsPatch::from_json(&json!({"redirect_url": "https://offers.example.com/"}));
    let retargeted = apply_patch(active, &retarget, T + 45);
    assert_eq!(retargeted.rule_started_at, Some(T));
    assert_eq!(retargeted.redirect_url, "https://offers.example.com");
}

#[test]
fn legacy_normal_mode_clears_the_timer() {
    let mut prior = Settings::new(T);
    prior.is_active = true;
    prior.rule_mode = RuleMode::RandomRoute;
    prior.rule_started_at = Some(T - 10);

    let patch = SettingsPatch::from_json(&json!({"rule_mode": "normal"}));
    let out = apply_patch(prior, &patch, T);
    assert_eq!(out.rule_mode, RuleMode::None);
    assert_eq!(out.rule_started_at, None);
}

#[test]
fn reactivation_restarts_the_timer() {
    let mut prior = Settings::new(T);
    prior.rule_mode = RuleMode::StaticRoute;

    let on = SettingsPatch::from_json(&json!({"is_active": "1"}));
    let first = apply_patch(prior, &on, T);
    assert_eq!(first.rule_started_at, Some(T));

    let off = SettingsPatch::from_json(&json!({"is_active": 0}));
    let second = apply_patch(first, &off, T + 10);
    assert_eq!(second.rule_started_at, None);

    let third = apply_patch(second, &on, T + 20);
    assert_eq!(third.rule_started_at, Some(T + 20));
}

#[tokio::test]
async fn concurrent_updates_never_mix_mode_and_timer() {
    let clock = Arc::new(ManualClock::new(T));
    let store = Arc::new(InMemorySettingsStore::new(clock.clone()));

    let mut tasks = Vec::new();
    for i in 0..32 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            let body = if i % 2 == 0 {
                json!({"is_active": true, "rule_mode": "mute_cycle"})
            } else {
                json!({"is_active": false})
            };
            store.update(&SettingsPatch::from_json(&body)).await.unwrap();
            store.read().await.unwrap()
        }));
    }

    for task in tasks {
        let seen = task.await.unwrap();
        let runnable = seen.is_active && seen.rule_mode != RuleMode::None;
        assert_eq!(runnable, seen.rule_started_at.is_some());
    }
}

#[tokio::test]
async fn legacy_rows_are_readable_as_seeded() {
    let store = InMemorySettingsStore::new(Arc::new(ManualClock::new(T)));
    let mut legacy = Settings::new(T);
    legacy.is_active = true;
    legacy.rule_mode = RuleMode::MuteCycle;
    store.seed(legacy.clone()).await;

    let read = store.read().await.unwrap();
    assert_eq!(read.rule_started_at, None);

    let patched = store.update(&SettingsPatch::default()).await.unwrap();
    assert_eq!(patched.rule_started_at, Some(T));
}
