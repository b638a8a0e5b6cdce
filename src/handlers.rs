use crate::config::Config;
use crate::hashing::HashPolicy;
use crate::meta_client::MetaConversionsClient;
use crate::meta_lead_handler;
use crate::meta_models::{MetaLeadRequest, MetaLeadResponse};
use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use utoipa::OpenApi;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Client for the Meta Conversions API.
    pub meta_client: MetaConversionsClient,
    /// One-way hash applied to email/phone before forwarding.
    pub hash_policy: Arc<dyn HashPolicy>,
    /// Process start, for the uptime reported by `/health`.
    pub started_at: Instant,
}

/// OpenAPI document for the relay surface.
#[derive(OpenApi)]
#[openapi(
    paths(meta_lead_handler::meta_lead_handler),
    components(schemas(MetaLeadRequest, MetaLeadResponse))
)]
pub struct ApiDoc;

/// Health check endpoint.
///
/// Returns the service status, version and uptime in seconds.
pub async fn health(
    axum::extract::State(state): axum::extract::State<Arc<AppState>>,
) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "ok": true,
            "uptime": state.started_at.elapsed().as_secs_f64(),
            "service": "lead-capture-api",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Fallback for unknown routes.
pub async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not Found" })))
}

/// Routes that never get rate limited.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}

/// Conversion relay routes.
pub fn relay_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/meta/lead", post(meta_lead_handler::meta_lead_handler))
}

/// Public + relay routes with the 404 fallback, without rate limiting or
/// transport layers (those are added by the binary).
pub fn router(state: Arc<AppState>) -> Router {
    public_routes()
        .merge(relay_routes())
        .fallback(not_found)
        .with_state(state)
}
