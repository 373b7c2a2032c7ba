use crate::http::body::read_json_body;
use crate::http::respond::{error_response, ok_json};
use crate::settings::state::SettingsPatch;
use crate::AppState;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;

pub async fn get_config(State(state): State<AppState>) -> Response {
    match state.settings_store.read().await {
        Ok(config) => ok_json(serde_json::json!({ "config": config })),
        Err(e) => {
            tracing::error!("settings read failed: {}", e);
            error_response(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
        }
    }
}

pub async fn update_config(State(state): State<AppState>, headers: HeaderMap, body: Body) -> Response {
    let body = match read_json_body(&headers, body, state.max_payload_bytes).await {
        Ok(body) => body,
        Err(rejection) => return rejection,
    };

    let patch = SettingsPatch::from_json(&body);
    match state.settings_store.update(&patch).await {
        Ok(config) => ok_json(serde_json::json!({ "config": config })),
        Err(e) => {
            tracing::error!("settings update failed: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "update_failed")
        }
    }
}
