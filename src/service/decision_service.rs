use crate::domain::decision::{DecisionOutcome, DecisionPayload};
use crate::engine::decision::DecisionEngine;
use crate::hits::log::HitLog;
use crate::settings::store::{SettingsStore, StoreError};
use std::sync::Arc;

#[derive(Clone)]
pub struct DecisionService {
    pub settings_store: Arc<dyn SettingsStore>,
    pub hit_log: Arc<dyn HitLog>,
    pub engine: DecisionEngine,
}

impl DecisionService {
    /// Reads one settings snapshot, decides, and hands the hit to the log on a detached task.
    pub async fn decide(&self, payload: &DecisionPayload, client_ip: &str) -> Result<DecisionOutcome, StoreError> {
        let settings = self.settings_store.read().await?;
        let outcome = self.engine.decide(payload, client_ip, &settings).await;

        let hit_log = self.hit_log.clone();
        let hit = outcome.hit.clone();
        tokio::spawn(async move {
            if let Err(e) = hit_log.append(&hit).await {
                tracing::warn!("hit log append failed: {}", e);
            }
        });

        Ok(outcome)
    }
}
