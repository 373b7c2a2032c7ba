use crate::hits::log::{ClickBatch, HitLog};
use anyhow::Result;
use std::time::Duration;
use tokio::time::Instant;

pub const FEED_BATCH: i64 = 200;
pub const DEFAULT_FEED_TIMEOUT_SECS: u64 = 20;
const MAX_FEED_TIMEOUT_SECS: u64 = 25;
const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub fn clamp_timeout_secs(secs: i64) -> u64 {
    secs.clamp(1, MAX_FEED_TIMEOUT_SECS as i64) as u64
}

/// Waits for hits newer than `after_id`. Returns as soon as a fetch yields rows, or an
/// empty batch once `timeout` has passed.
pub async fn long_poll(log: &dyn HitLog, after_id: i64, timeout: Duration) -> Result<ClickBatch> {
    let after_id = after_id.max(0);
    let deadline = Instant::now() + timeout;

    let mut batch = log.fetch_after(after_id, FEED_BATCH).await?;
    while batch.hits.is_empty() && Instant::now() < deadline {
        tokio::time::sleep(POLL_INTERVAL).await;
        batch = log.fetch_after(after_id, FEED_BATCH).await?;
    }
    Ok(batch)
}
