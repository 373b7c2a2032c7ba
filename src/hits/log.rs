use crate::domain::decision::{Decision, HitRecord};
use crate::engine::device::{detect_device, Device};
use crate::engine::sanitize::{MAX_IDENTIFIER_LEN, MAX_USER_AGENT_LEN};
use crate::sources::Clock;
use crate::validation::ip::MAX_IP_TEXT_LEN;
use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

pub const DEFAULT_STATS_WINDOW_MINUTES: i64 = 15;
pub const MAX_STATS_WINDOW_MINUTES: i64 = 60;
pub const TOP_COUNTRIES: usize = 5;
pub const MAX_FETCH_LIMIT: i64 = 500;

/// Append-only decision log plus the aggregate reads the dashboard needs.
#[async_trait::async_trait]
pub trait HitLog: Send + Sync {
    async fn append(&self, hit: &HitRecord) -> Result<()>;

    async fn stats(&self, window_minutes: i64, now: i64) -> Result<StatsSnapshot>;

    async fn fetch_after(&self, after_id: i64, limit: i64) -> Result<ClickBatch>;
}

/// A hit as persisted, with every column already cut to its storage width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredHit {
    pub id: i64,
    pub created_at: i64,
    pub ip: String,
    pub ua: String,
    pub click_id: String,
    pub country_code: String,
    pub landing_page: String,
    pub decision: Decision,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClickRow {
    pub id: i64,
    pub ts: i64,
    pub cc: String,
    pub decision: Decision,
    pub cid: String,
    pub ua: String,
    pub ip: String,
    pub lp: String,
    pub device: Device,
}

impl From<StoredHit> for ClickRow {
    fn from(hit: StoredHit) -> Self {
        let device = detect_device(&hit.ua, None);
        Self {
            id: hit.id,
            ts: hit.created_at,
            cc: hit.country_code,
            decision: hit.decision,
            cid: hit.click_id,
            ua: hit.ua,
            ip: hit.ip,
            lp: hit.landing_page,
            device,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClickBatch {
    pub hits: Vec<ClickRow>,
    pub last_id: i64,
}

impl ClickBatch {
    pub fn from_hits(after_id: i64, hits: Vec<StoredHit>) -> Self {
        let last_id = hits.iter().map(|h| h.id).fold(after_id, i64::max);
        Self {
            hits: hits.into_iter().map(ClickRow::from).collect(),
            last_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryCount {
    pub cc: String,
    pub c: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub ts: i64,
    pub c: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub window: i64,
    pub total: i64,
    pub a: i64,
    pub b: i64,
    pub top_countries: Vec<CountryCount>,
    pub series: Vec<SeriesPoint>,
}

pub fn clamp_window(window_minutes: i64) -> i64 {
    window_minutes.clamp(1, MAX_STATS_WINDOW_MINUTES)
}

pub fn clamp_limit(limit: i64) -> i64 {
    limit.clamp(1, MAX_FETCH_LIMIT)
}

fn cut(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// Cuts a record to the widths of the `hits` columns.
pub fn storage_columns(hit: &HitRecord) -> (String, String, String, String, String) {
    let cc: String = hit.country_code.chars().take(2).collect::<String>().to_ascii_uppercase();
    (
        cut(&hit.ip, MAX_IP_TEXT_LEN),
        cut(&hit.ua, MAX_USER_AGENT_LEN),
        cut(&hit.click_id, MAX_IDENTIFIER_LEN),
        cc,
        cut(&hit.landing_page, MAX_IDENTIFIER_LEN),
    )
}

/// Process-local hit log for tests and single-instance runs without a database.
#[derive(Clone)]
pub struct InMemoryHitLog {
    rows: Arc<RwLock<Vec<StoredHit>>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryHitLog {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            rows: Arc::new(RwLock::new(Vec::new())),
            clock,
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn all(&self) -> Vec<StoredHit> {
        self.rows.read().await.clone()
    }
}

#[async_trait::async_trait]
impl HitLog for InMemoryHitLog {
    async fn append(&self, hit: &HitRecord) -> Result<()> {
        let (ip, ua, click_id, country_code, landing_page) = storage_columns(hit);
        let mut write = self.rows.write().await;
        let id = write.last().map(|h| h.id + 1).unwrap_or(1);
        write.push(StoredHit {
            id,
            created_at: self.clock.now(),
            ip,
            ua,
            click_id,
            country_code,
            landing_page,
            decision: hit.decision,
        });
        Ok(())
    }

    async fn stats(&self, window_minutes: i64, now: i64) -> Result<StatsSnapshot> {
        let window = clamp_window(window_minutes);
        let threshold = now - window * 60;
        let read = self.rows.read().await;
        let recent: Vec<&StoredHit> = read.iter().filter(|h| h.created_at >= threshold).collect();

        let a = recent.iter().filter(|h| h.decision == Decision::A).count() as i64;
        let total = recent.len() as i64;

        let mut by_country: HashMap<&str, i64> = HashMap::new();
        let mut by_minute: HashMap<i64, i64> = HashMap::new();
        for hit in &recent {
            *by_country.entry(hit.country_code.as_str()).or_default() += 1;
            *by_minute.entry(hit.created_at.div_euclid(60) * 60).or_default() += 1;
        }

        let mut top_countries: Vec<CountryCount> = by_country
            .into_iter()
            .map(|(cc, c)| CountryCount { cc: cc.to_string(), c })
            .collect();
        top_countries.sort_by(|l, r| r.c.cmp(&l.c).then_with(|| l.cc.cmp(&r.cc)));
        top_countries.truncate(TOP_COUNTRIES);

        let mut series: Vec<SeriesPoint> = by_minute.into_iter().map(|(ts, c)| SeriesPoint { ts, c }).collect();
        series.sort_by_key(|p| p.ts);
        series.truncate(window as usize);

        Ok(StatsSnapshot {
            window,
            total,
            a,
            b: total - a,
            top_countries,
            series,
        })
    }

    async fn fetch_after(&self, after_id: i64, limit: i64) -> Result<ClickBatch> {
        let limit = clamp_limit(limit) as usize;
        let read = self.rows.read().await;
        let hits: Vec<StoredHit> = read.iter().filter(|h| h.id > after_id).take(limit).cloned().collect();
        Ok(ClickBatch::from_hits(after_id, hits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::ManualClock;

    fn hit(cc: &str, decision: Decision) -> HitRecord {
        HitRecord {
            ip: "93.184.216.34".to_string(),
            ua: "Mozilla/5.0 (Linux; Android 13) Mobile".to_string(),
            click_id: "C1".to_string(),
            country_code: cc.to_string(),
            landing_page: "DEFAULT".to_string(),
            decision,
        }
    }

    #[test]
    fn storage_columns_are_cut_to_width() {
        let mut record = hit("idn", Decision::A);
        record.ua = "u".repeat(700);
        record.click_id = "c".repeat(80);
        let (_, ua, cid, cc, _) = storage_columns(&record);
        assert_eq!(ua.len(), 512);
        assert_eq!(cid.len(), 64);
        assert_eq!(cc, "ID");
    }

    #[tokio::test]
    async fn stats_cover_only_the_window() {
        let clock = Arc::new(ManualClock::new(10_000));
        let log = InMemoryHitLog::new(clock.clone());
        log.append(&hit("ID", Decision::A)).await.unwrap();
        clock.advance(600);
        log.append(&hit("ID", Decision::B)).await.unwrap();
        log.append(&hit("US", Decision::A)).await.unwrap();
        clock.advance(61);
        log.append(&hit("ID", Decision::B)).await.unwrap();

        let stats = log.stats(5, clock.now()).await.unwrap();
        assert_eq!(stats.window, 5);
        assert_eq!((stats.total, stats.a, stats.b), (3, 1, 2));
        assert_eq!(stats.top_countries[0], CountryCount { cc: "ID".into(), c: 2 });
        assert_eq!(stats.series.len(), 2);
        assert!(stats.series[0].ts < stats.series[1].ts);

        let all = log.stats(0, clock.now()).await.unwrap();
        assert_eq!(all.window, 1);
    }

    #[tokio::test]
    async fn fetch_after_pages_in_id_order() {
        let log = InMemoryHitLog::new(Arc::new(ManualClock::new(1)));
        for _ in 0..5 {
            log.append(&hit("ID", Decision::B)).await.unwrap();
        }
        let first = log.fetch_after(0, 2).await.unwrap();
        assert_eq!(first.hits.iter().map(|h| h.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(first.last_id, 2);
        assert_eq!(first.hits[0].device, Device::Wap);

        let empty = log.fetch_after(9, 10).await.unwrap();
        assert!(empty.hits.is_empty());
        assert_eq!(empty.last_id, 9);
    }
}
