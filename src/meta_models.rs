use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::hashing::{hash_email, hash_phone, HashPolicy};

/// `action_source` for conversions captured on our own site
pub const ACTION_SOURCE_WEBSITE: &str = "website";

/// Body of `POST /api/meta/lead`, sent by the browser after a successful lead
/// submission. Contact fields arrive raw and are hashed by the relay.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, ToSchema)]
pub struct MetaLeadRequest {
    /// Correlation id shared with the pixel event (deduplication key)
    #[serde(rename = "eventID")]
    pub event_id: String,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    /// `_fbp` browser cookie
    #[serde(default)]
    pub fbp: Option<String>,

    /// Click id (`fb.1.<ts>.<fbclid>`) or `_fbc` cookie
    #[serde(default)]
    pub fbc: Option<String>,

    /// Page where the lead converted
    #[serde(default)]
    pub event_source_url: Option<String>,
}

/// Request metadata the relay reads from the HTTP layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestMeta {
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
}

/// `user_data` block of a server event. Absent fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_user_agent: Option<String>,
    /// Hashed email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub em: Option<String>,
    /// Hashed phone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ph: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fbp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fbc: Option<String>,
}

/// One server-side conversion event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEvent {
    pub event_name: String,
    /// Unix seconds
    pub event_time: i64,
    pub action_source: String,
    pub event_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_source_url: Option<String>,
    pub user_data: UserData,
}

impl ServerEvent {
    /// Builds the outbound event: PII hashed with `policy`, browser ids
    /// forwarded as-is, blank strings dropped.
    pub fn from_request(
        request: &MetaLeadRequest,
        meta: &RequestMeta,
        event_name: &str,
        event_time: i64,
        policy: &dyn HashPolicy,
    ) -> Self {
        ServerEvent {
            event_name: event_name.to_string(),
            event_time,
            action_source: ACTION_SOURCE_WEBSITE.to_string(),
            event_id: request.event_id.trim().to_string(),
            event_source_url: non_blank(request.event_source_url.as_deref()),
            user_data: UserData {
                client_ip_address: non_blank(meta.client_ip.as_deref()),
                client_user_agent: non_blank(meta.user_agent.as_deref()),
                em: hash_email(policy, request.email.as_deref()),
                ph: hash_phone(policy, request.phone.as_deref()),
                fbp: non_blank(request.fbp.as_deref()),
                fbc: non_blank(request.fbc.as_deref()),
            },
        }
    }
}

/// Envelope posted to `/{pixel_id}/events`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventsEnvelope {
    pub data: Vec<ServerEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_event_code: Option<String>,
}

/// Successful relay response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MetaLeadResponse {
    pub ok: bool,
    /// Upstream response body, passed through untouched
    #[schema(value_type = Object)]
    pub meta: serde_json::Value,
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
