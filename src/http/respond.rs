use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
struct OkBody<T> {
    ok: bool,
    #[serde(flatten)]
    body: T,
}

/// `200` with `"ok": true` merged into the serialized body.
pub fn ok_json<T: Serialize>(body: T) -> Response {
    (StatusCode::OK, Json(OkBody { ok: true, body })).into_response()
}

pub fn error_response(status: StatusCode, code: &str) -> Response {
    (status, Json(serde_json::json!({"ok": false, "error": code}))).into_response()
}
