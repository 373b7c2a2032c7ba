use crate::hits::feed::{clamp_timeout_secs, long_poll, DEFAULT_FEED_TIMEOUT_SECS};
use crate::http::handlers::stats::parse_int_param;
use crate::http::respond::{error_response, ok_json};
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct ClicksQuery {
    pub after_id: Option<String>,
    pub timeout: Option<String>,
}

pub async fn get_clicks(State(state): State<AppState>, Query(query): Query<ClicksQuery>) -> Response {
    let after_id = parse_int_param(query.after_id.as_deref(), 0).max(0);
    let timeout = clamp_timeout_secs(parse_int_param(
        query.timeout.as_deref(),
        DEFAULT_FEED_TIMEOUT_SECS as i64,
    ));

    match long_poll(state.hit_log.as_ref(), after_id, Duration::from_secs(timeout)).await {
        Ok(batch) => ok_json(serde_json::json!({
            "server_time": state.clock.now(),
            "after_id": after_id,
            "last_id": batch.last_id,
            "hits": batch.hits,
        })),
        Err(e) => {
            tracing::error!("click feed query failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "clicks_failed")
        }
    }
}
