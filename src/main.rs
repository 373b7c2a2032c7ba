use smart_redirect::config::AppConfig;
use smart_redirect::engine::decision::DecisionEngine;
use smart_redirect::hits::store_pg::PgHitLog;
use smart_redirect::http::middleware::security_headers::CorsPolicy;
use smart_redirect::service::decision_service::DecisionService;
use smart_redirect::settings::store_pg::PgSettingsStore;
use smart_redirect::sources::{Clock, SystemClock, ThreadRandom};
use smart_redirect::vpn::cache::CachedVpnOracle;
use smart_redirect::vpn::oracle::HttpVpnOracle;
use smart_redirect::AppState;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();
    if cfg.api_key.is_empty() {
        tracing::warn!("SRP_API_KEY is empty, api routes will answer server_misconfigured");
    }

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&cfg.database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let redis_client = match &cfg.redis_url {
        Some(url) => Some(redis::Client::open(url.clone())?),
        None => None,
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let http_oracle = HttpVpnOracle::new(
        &cfg.vpn_lookup_base_url,
        Duration::from_millis(cfg.vpn_timeout_ms),
        Duration::from_millis(cfg.vpn_connect_timeout_ms),
    )?;
    let mut vpn_oracle = CachedVpnOracle::new(Arc::new(http_oracle), cfg.vpn_cache_ttl_secs);
    if let Some(client) = &redis_client {
        vpn_oracle = vpn_oracle.with_redis(client.clone());
    }

    let settings_store = Arc::new(PgSettingsStore {
        pool: pool.clone(),
        clock: clock.clone(),
    });
    let hit_log = Arc::new(PgHitLog { pool: pool.clone() });

    let decision_service = DecisionService {
        settings_store: settings_store.clone(),
        hit_log: hit_log.clone(),
        engine: DecisionEngine::new(Arc::new(vpn_oracle), Arc::new(ThreadRandom), clock.clone()),
    };

    let state = AppState {
        decision_service,
        settings_store,
        hit_log,
        clock,
        redis_client,
        api_key: cfg.api_key.clone(),
        cors: CorsPolicy::parse(&cfg.cors_allow_origin),
        max_payload_bytes: cfg.max_payload_bytes,
    };

    let app = smart_redirect::http::router::build(state);

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}
