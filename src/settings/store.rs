use crate::settings::state::{Settings, SettingsPatch};
use crate::settings::transitions::apply_patch;
use crate::sources::Clock;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("settings store unavailable: {0}")]
    Unavailable(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
    #[error("settings could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

impl StoreError {
    pub fn unavailable(cause: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        StoreError::Unavailable(cause.into())
    }
}

/// Holder of the singleton campaign configuration.
///
/// `update` must be atomic: a concurrent `read` observes either the old or the new
/// configuration, never a mix of both.
#[async_trait::async_trait]
pub trait SettingsStore: Send + Sync {
    async fn read(&self) -> Result<Settings, StoreError>;

    async fn update(&self, patch: &SettingsPatch) -> Result<Settings, StoreError>;
}

#[derive(Clone)]
pub struct InMemorySettingsStore {
    inner: Arc<RwLock<Option<Settings>>>,
    clock: Arc<dyn Clock>,
}

impl InMemorySettingsStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
            clock,
        }
    }

    /// Seeds a raw record, bypassing validation; used to replay legacy rows.
    pub async fn seed(&self, settings: Settings) {
        *self.inner.write().await = Some(settings);
    }
}

#[async_trait::async_trait]
impl SettingsStore for InMemorySettingsStore {
    async fn read(&self) -> Result<Settings, StoreError> {
        let read = self.inner.read().await;
        Ok(read.clone().unwrap_or_else(|| Settings::new(self.clock.now())))
    }

    async fn update(&self, patch: &SettingsPatch) -> Result<Settings, StoreError> {
        let mut write = self.inner.write().await;
        let now = self.clock.now();
        let current = write.clone().unwrap_or_else(|| Settings::new(now));
        let next = apply_patch(current, patch, now);
        *write = Some(next.clone());
        Ok(next)
    }
}
