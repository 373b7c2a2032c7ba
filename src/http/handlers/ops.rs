use crate::http::respond::{error_response, ok_json};
use crate::AppState;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;

pub const SERVICE_NAME: &str = "srp-api";

pub async fn health(State(state): State<AppState>) -> Response {
    ok_json(serde_json::json!({
        "name": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "time": state.clock.now(),
    }))
}

pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let store_ok = state.settings_store.read().await.is_ok();

    let redis_ok = match &state.redis_client {
        Some(client) => {
            if let Ok(mut conn) = client.get_multiplexed_async_connection().await {
                let pong: redis::RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
                pong.is_ok()
            } else {
                false
            }
        }
        None => true,
    };

    let ok = store_ok && redis_ok;
    let status = if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "ready": ok,
            "store": store_ok,
            "redis": redis_ok,
        })),
    )
        .into_response()
}

pub async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({"alive": true}))).into_response()
}

pub async fn not_found(uri: Uri) -> Response {
    tracing::debug!("no route for {}", uri.path());
    error_response(StatusCode::NOT_FOUND, "not_found")
}
