use crate::http::respond::error_response;
use axum::body::Body;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use serde_json::Value;

pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 8192;

/// Reads a JSON request body under the admin API's rules: `application/json` only, bounded
/// size. Any valid JSON document is accepted; shape checks belong to the caller.
pub async fn read_json_body(headers: &HeaderMap, body: Body, limit: usize) -> Result<Value, Response> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .trim_start()
        .to_ascii_lowercase();
    if !content_type.starts_with("application/json") {
        return Err(error_response(StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_media_type"));
    }

    let declared = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    if declared > limit {
        return Err(error_response(StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"));
    }

    let bytes = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!("request body rejected: {}", e);
            return Err(error_response(StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"));
        }
    };

    serde_json::from_slice::<Value>(&bytes)
        .map_err(|_| error_response(StatusCode::BAD_REQUEST, "invalid_json"))
}
