use crate::http::handlers::{clicks, decision, ops, settings, stats};
use crate::http::middleware::{api_key, security_headers};
use crate::AppState;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;

/// The full application. API routes are served under both `/api/v1` and `/v1`.
pub fn build(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(ops::health))
        .route("/decision", post(decision::decide))
        .route("/config", get(settings::get_config).post(settings::update_config))
        .route("/stats", get(stats::get_stats))
        .route("/clicks", get(clicks::get_clicks))
        .layer(from_fn_with_state(state.api_key.clone(), api_key::require_api_key));

    Router::new()
        .nest("/api/v1", api.clone())
        .nest("/v1", api)
        .route("/ops/liveness", get(ops::liveness))
        .route("/ops/readiness", get(ops::readiness))
        .fallback(ops::not_found)
        .layer(from_fn_with_state(state.cors.clone(), security_headers::apply))
        .with_state(state)
}
