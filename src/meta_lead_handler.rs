use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap},
    response::Json,
};
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::{
    errors::{AppError, ResultExt},
    handlers::AppState,
    meta_models::{MetaLeadRequest, MetaLeadResponse, RequestMeta, ServerEvent},
};

/// Conversion relay handler.
///
/// Flow:
/// 1. Validate the correlation id (eventID).
/// 2. Derive client IP (first `X-Forwarded-For` entry, else peer address) and user agent.
/// 3. Hash email/phone with the configured hash policy; drop absent fields.
/// 4. Forward one event to the Meta Conversions API (single attempt).
///
/// # Returns
///
/// * `200 { ok: true, meta: <upstream body> }` on success.
/// * `500 { ok: false, error: <upstream detail> }` when Meta rejects or is unreachable.
#[utoipa::path(
    post,
    path = "/api/meta/lead",
    request_body = MetaLeadRequest,
    responses(
        (status = 200, description = "Event accepted by the conversions API", body = MetaLeadResponse),
        (status = 400, description = "Missing eventID"),
        (status = 500, description = "Conversions API error, with upstream detail")
    )
)]
pub async fn meta_lead_handler(
    State(state): State<Arc<AppState>>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    Json(payload): Json<MetaLeadRequest>,
) -> Result<Json<MetaLeadResponse>, AppError> {
    if payload.event_id.trim().is_empty() {
        return Err(AppError::BadRequest("eventID is required".to_string()));
    }

    tracing::info!(
        "📨 Received lead conversion: event_id={}, email={}, phone={}",
        payload.event_id,
        payload.email.is_some(),
        payload.phone.is_some()
    );

    let meta = RequestMeta {
        client_ip: client_ip(&headers, peer.map(|ConnectInfo(addr)| addr)),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };

    let event = ServerEvent::from_request(
        &payload,
        &meta,
        &state.config.meta_event_name,
        Utc::now().timestamp(),
        state.hash_policy.as_ref(),
    );

    let upstream = state
        .meta_client
        .send_event(event)
        .await
        .with_context(|| format!("Meta relay for event {}", payload.event_id))?;

    Ok(Json(MetaLeadResponse {
        ok: true,
        meta: upstream,
    }))
}

/// First `X-Forwarded-For` entry, falling back to the peer address.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}
