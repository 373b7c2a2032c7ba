use crate::http::respond::error_response;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use subtle::ConstantTimeEq;

pub const API_KEY_HEADER: &str = "X-API-Key";

pub async fn require_api_key(
    State(expected): State<String>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if expected.is_empty() {
        tracing::error!("SRP_API_KEY is not configured, refusing api request");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "server_misconfigured");
    }

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("");

    if provided.is_empty() || !bool::from(provided.as_bytes().ct_eq(expected.as_bytes())) {
        return error_response(StatusCode::UNAUTHORIZED, "unauthorized");
    }

    next.run(request).await
}
