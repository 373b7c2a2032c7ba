use crate::hits::log::DEFAULT_STATS_WINDOW_MINUTES;
use crate::http::respond::{error_response, ok_json};
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub window: Option<String>,
}

/// Missing means the default window; anything unparsable counts as zero and is clamped up.
pub fn parse_int_param(raw: Option<&str>, default: i64) -> i64 {
    match raw {
        None => default,
        Some(v) => v.trim().parse::<i64>().unwrap_or(0),
    }
}

pub async fn get_stats(State(state): State<AppState>, Query(query): Query<StatsQuery>) -> Response {
    let window = parse_int_param(query.window.as_deref(), DEFAULT_STATS_WINDOW_MINUTES);
    match state.hit_log.stats(window, state.clock.now()).await {
        Ok(stats) => ok_json(stats),
        Err(e) => {
            tracing::error!("stats query failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "stats_failed")
        }
    }
}
