use crate::settings::state::{RuleMode, Settings, SettingsPatch};
use crate::settings::store::{SettingsStore, StoreError};
use crate::settings::transitions::apply_patch;
use crate::sources::Clock;
use crate::validation::country_code;
use crate::validation::redirect_url::validate_redirect_url;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;

const SELECT_SETTINGS: &str = r#"
    SELECT redirect_url, system_on, is_active, allowed_countries, rule_mode,
           rule_started_at, updated_at
    FROM settings WHERE id = 1
"#;

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::unavailable(e)
    }
}

#[derive(Clone)]
pub struct PgSettingsStore {
    pub pool: PgPool,
    pub clock: Arc<dyn Clock>,
}

fn to_datetime(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap_or_default()
}

/// Maps a stored row, re-sanitizing fields that may predate current validation rules.
fn settings_from_row(row: &PgRow) -> Settings {
    let countries: serde_json::Value = row.try_get("allowed_countries").unwrap_or_default();
    let redirect_url: String = row.try_get("redirect_url").unwrap_or_default();
    let rule_mode: String = row.try_get("rule_mode").unwrap_or_default();
    let rule_started_at: Option<DateTime<Utc>> = row.try_get("rule_started_at").unwrap_or(None);
    let updated_at: Option<DateTime<Utc>> = row.try_get("updated_at").ok();

    Settings {
        system_on: row.try_get("system_on").unwrap_or(false),
        redirect_url: validate_redirect_url(&redirect_url),
        is_active: row.try_get("is_active").unwrap_or(false),
        allowed_countries: country_code::sanitize_json(&countries).unwrap_or_default(),
        rule_mode: RuleMode::parse(&rule_mode),
        rule_started_at: rule_started_at.map(|t| t.timestamp()),
        updated_at: updated_at.map(|t| t.timestamp()).unwrap_or(0),
    }
}

#[async_trait::async_trait]
impl SettingsStore for PgSettingsStore {
    async fn read(&self) -> Result<Settings, StoreError> {
        let row = sqlx::query(SELECT_SETTINGS).fetch_optional(&self.pool).await?;
        Ok(row
            .as_ref()
            .map(settings_from_row)
            .unwrap_or_else(|| Settings::new(self.clock.now())))
    }

    async fn update(&self, patch: &SettingsPatch) -> Result<Settings, StoreError> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&format!("{SELECT_SETTINGS} FOR UPDATE"))
            .fetch_optional(tx.as_mut())
            .await?;

        let now = self.clock.now();
        let current = row
            .as_ref()
            .map(settings_from_row)
            .unwrap_or_else(|| Settings::new(now));
        let next = apply_patch(current, patch, now);
        let countries = serde_json::to_value(&next.allowed_countries)?;

        sqlx::query(
            r#"
            INSERT INTO settings (
                id, redirect_url, system_on, is_active, allowed_countries,
                rule_mode, rule_started_at, updated_at
            ) VALUES (1, $1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                redirect_url = EXCLUDED.redirect_url,
                system_on = EXCLUDED.system_on,
                is_active = EXCLUDED.is_active,
                allowed_countries = EXCLUDED.allowed_countries,
                rule_mode = EXCLUDED.rule_mode,
                rule_started_at = EXCLUDED.rule_started_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&next.redirect_url)
        .bind(next.system_on)
        .bind(next.is_active)
        .bind(countries)
        .bind(next.rule_mode.as_str())
        .bind(next.rule_started_at.map(to_datetime))
        .bind(to_datetime(next.updated_at))
        .execute(tx.as_mut())
        .await?;

        tx.commit().await?;
        tracing::info!(
            "settings updated system_on={} is_active={} rule_mode={} rule_started_at={:?}",
            next.system_on,
            next.is_active,
            next.rule_mode.as_str(),
            next.rule_started_at
        );
        Ok(next)
    }
}
