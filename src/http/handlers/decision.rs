use crate::domain::decision::DecisionPayload;
use crate::http::body::read_json_body;
use crate::http::client_ip::resolve_client_ip;
use crate::http::respond::{error_response, ok_json};
use crate::AppState;
use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use std::net::SocketAddr;

pub async fn decide(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    let body = match read_json_body(&headers, body, state.max_payload_bytes).await {
        Ok(body) => body,
        Err(rejection) => return rejection,
    };

    let header_ua = headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok());
    let payload = DecisionPayload::from_request(&body, header_ua);
    let client_ip = resolve_client_ip(&headers, peer.map(|ConnectInfo(addr)| addr.ip()));

    match state.decision_service.decide(&payload, &client_ip).await {
        Ok(outcome) => ok_json(outcome.result),
        Err(e) => {
            tracing::error!("decision aborted, settings unavailable: {}", e);
            error_response(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable")
        }
    }
}
