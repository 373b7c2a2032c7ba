use crate::domain::decision::{Decision, HitRecord};
use crate::hits::log::{
    clamp_limit, clamp_window, storage_columns, ClickBatch, CountryCount, HitLog, SeriesPoint, StatsSnapshot,
    StoredHit, TOP_COUNTRIES,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

#[derive(Clone)]
pub struct PgHitLog {
    pub pool: PgPool,
}

#[async_trait::async_trait]
impl HitLog for PgHitLog {
    async fn append(&self, hit: &HitRecord) -> Result<()> {
        let (ip, ua, click_id, country_code, landing_page) = storage_columns(hit);
        sqlx::query(
            r#"
            INSERT INTO hits (ip, ua, cid, cc, lp, decision)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(ip)
        .bind(ua)
        .bind(click_id)
        .bind(country_code)
        .bind(landing_page)
        .bind(hit.decision.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn stats(&self, window_minutes: i64, now: i64) -> Result<StatsSnapshot> {
        let window = clamp_window(window_minutes);
        let threshold = DateTime::<Utc>::from_timestamp(now - window * 60, 0).unwrap_or_default();

        let totals = sqlx::query(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE decision = 'A') AS a,
                   COUNT(*) FILTER (WHERE decision = 'B') AS b
            FROM hits WHERE created_at >= $1
            "#,
        )
        .bind(threshold)
        .fetch_one(&self.pool)
        .await?;

        let top_rows = sqlx::query(
            r#"
            SELECT cc, COUNT(*) AS c FROM hits
            WHERE created_at >= $1
            GROUP BY cc ORDER BY c DESC, cc ASC LIMIT $2
            "#,
        )
        .bind(threshold)
        .bind(TOP_COUNTRIES as i64)
        .fetch_all(&self.pool)
        .await?;

        let series_rows = sqlx::query(
            r#"
            SELECT (FLOOR(EXTRACT(EPOCH FROM created_at) / 60) * 60)::BIGINT AS ts, COUNT(*) AS c
            FROM hits WHERE created_at >= $1
            GROUP BY ts ORDER BY ts ASC LIMIT $2
            "#,
        )
        .bind(threshold)
        .bind(window)
        .fetch_all(&self.pool)
        .await?;

        Ok(StatsSnapshot {
            window,
            total: totals.get("total"),
            a: totals.get("a"),
            b: totals.get("b"),
            top_countries: top_rows
                .iter()
                .map(|r| CountryCount {
                    cc: r.get::<String, _>("cc").trim().to_ascii_uppercase(),
                    c: r.get("c"),
                })
                .collect(),
            series: series_rows
                .iter()
                .map(|r| SeriesPoint {
                    ts: r.get("ts"),
                    c: r.get("c"),
                })
                .collect(),
        })
    }

    async fn fetch_after(&self, after_id: i64, limit: i64) -> Result<ClickBatch> {
        let rows = sqlx::query(
            r#"
            SELECT id, created_at, ip, ua, cid, cc, lp, decision
            FROM hits WHERE id > $1 ORDER BY id ASC LIMIT $2
            "#,
        )
        .bind(after_id)
        .bind(clamp_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        let hits = rows
            .iter()
            .map(|r| StoredHit {
                id: r.get("id"),
                created_at: r.get::<DateTime<Utc>, _>("created_at").timestamp(),
                ip: r.get("ip"),
                ua: r.get("ua"),
                click_id: r.get("cid"),
                country_code: r.get::<String, _>("cc").trim().to_ascii_uppercase(),
                landing_page: r.get("lp"),
                decision: Decision::parse(&r.get::<String, _>("decision")),
            })
            .collect();
        Ok(ClickBatch::from_hits(after_id, hits))
    }
}
