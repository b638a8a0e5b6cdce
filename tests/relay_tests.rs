/// Relay endpoint tests against a mocked Meta Conversions API
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use lead_capture_api::config::Config;
use lead_capture_api::api::handlers::{router, AppState};
use lead_capture_api::integrations::hashing::{HashPolicy, Sha256Hex};
use lead_capture_api::integrations::meta_client::MetaConversionsClient;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PIXEL_ID: &str = "1234567890";

/// Helper function to create test config
fn create_test_config(graph_url: String, test_event_code: Option<&str>) -> Config {
    Config {
        port: 62143,
        meta_access_token: "test_token".to_string(),
        meta_pixel_id: PIXEL_ID.to_string(),
        meta_test_event_code: test_event_code.map(str::to_string),
        meta_graph_url: graph_url,
        meta_api_version: "v19.0".to_string(),
        meta_event_name: "Lead_FormularioJauPesca".to_string(),
        meta_timeout_secs: 5,
    }
}

fn create_app(config: Config) -> Router {
    let meta_client = MetaConversionsClient::from_config(&config).unwrap();
    router(Arc::new(AppState {
        config,
        meta_client,
        hash_policy: Arc::new(Sha256Hex),
        started_at: Instant::now(),
    }))
}

async fn mount_events(server: &MockServer, status: u16, body: Value) {
    Mock::given(method("POST"))
        .and(path(format!("/v19.0/{}/events", PIXEL_ID)))
        .and(query_param("access_token", "test_token"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .mount(server)
        .await;
}

fn lead_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/meta/lead")
        .header("content-type", "application/json")
        .header("user-agent", "Mozilla/5.0 (Test)")
        .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn forwarded_events(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|r| serde_json::from_slice(&r.body).unwrap())
        .collect()
}

#[tokio::test]
async fn test_relay_forwards_hashed_event() {
    let server = MockServer::start().await;
    let upstream = json!({"events_received": 1, "fbtrace_id": "AbCdEf"});
    mount_events(&server, 200, upstream.clone()).await;

    let app = create_app(create_test_config(server.uri(), None));
    let (status, body) = call(
        app,
        lead_request(json!({
            "eventID": "evt-123",
            "email": "  Ana@Ex.com ",
            "phone": "(11) 98765-4321",
            "fbp": "fb.1.1700000000.987",
            "fbc": "fb.1.1700000000.CLICK42",
            "event_source_url": "https://jaupesca.com.br/parceiros"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true, "meta": upstream}));

    let forwarded = forwarded_events(&server).await;
    assert_eq!(forwarded.len(), 1);
    assert!(forwarded[0].get("test_event_code").is_none());

    let event = &forwarded[0]["data"][0];
    assert_eq!(event["event_name"], "Lead_FormularioJauPesca");
    assert_eq!(event["event_id"], "evt-123");
    assert_eq!(event["action_source"], "website");
    assert_eq!(event["event_source_url"], "https://jaupesca.com.br/parceiros");
    assert!(event["event_time"].as_i64().unwrap() > 1_700_000_000);

    let user_data = &event["user_data"];
    assert_eq!(user_data["em"], Sha256Hex.hash("ana@ex.com").as_str());
    assert_eq!(user_data["ph"], Sha256Hex.hash("5511987654321").as_str());
    assert_eq!(user_data["client_ip_address"], "203.0.113.7");
    assert_eq!(user_data["client_user_agent"], "Mozilla/5.0 (Test)");
    assert_eq!(user_data["fbp"], "fb.1.1700000000.987");
    assert_eq!(user_data["fbc"], "fb.1.1700000000.CLICK42");
}

#[tokio::test]
async fn test_relay_omits_absent_contact_fields() {
    let server = MockServer::start().await;
    mount_events(&server, 200, json!({"events_received": 1})).await;

    let app = create_app(create_test_config(server.uri(), None));
    let (status, _) = call(app, lead_request(json!({"eventID": "evt-9", "email": null}))).await;
    assert_eq!(status, StatusCode::OK);

    let forwarded = forwarded_events(&server).await;
    let user_data = forwarded[0]["data"][0]["user_data"].as_object().unwrap();
    assert!(!user_data.contains_key("em"));
    assert!(!user_data.contains_key("ph"));
    assert!(!user_data.contains_key("fbp"));
    assert!(!user_data.contains_key("fbc"));
    assert!(forwarded[0]["data"][0].get("event_source_url").is_none());
}

#[tokio::test]
async fn test_relay_forwards_test_event_code() {
    let server = MockServer::start().await;
    mount_events(&server, 200, json!({"events_received": 1})).await;

    let app = create_app(create_test_config(server.uri(), Some("TEST4242")));
    let (status, _) = call(app, lead_request(json!({"eventID": "evt-1"}))).await;
    assert_eq!(status, StatusCode::OK);

    let forwarded = forwarded_events(&server).await;
    assert_eq!(forwarded[0]["test_event_code"], "TEST4242");
}

#[tokio::test]
async fn test_relay_upstream_rejection_is_500_with_detail() {
    let server = MockServer::start().await;
    let upstream_error = json!({
        "error": {
            "message": "Invalid OAuth access token.",
            "type": "OAuthException",
            "code": 190
        }
    });
    mount_events(&server, 400, upstream_error.clone()).await;

    let app = create_app(create_test_config(server.uri(), None));
    let (status, body) = call(app, lead_request(json!({"eventID": "evt-1"}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"ok": false, "error": upstream_error}));
}

#[tokio::test]
async fn test_relay_unreachable_upstream_is_500() {
    let server = MockServer::start().await;
    let uri = server.uri();
    // nothing listens on the address once the server is gone
    drop(server);

    let mut config = create_test_config(uri, None);
    config.meta_timeout_secs = 2;
    let app = create_app(config);
    let (status, body) = call(app, lead_request(json!({"eventID": "evt-1"}))).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["ok"], false);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_relay_requires_event_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = create_app(create_test_config(server.uri(), None));
    let (status, body) = call(app, lead_request(json!({"eventID": "   "}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
}

#[tokio::test]
async fn test_relay_rejects_malformed_body() {
    let server = MockServer::start().await;
    let app = create_app(create_test_config(server.uri(), None));

    let request = Request::builder()
        .method("POST")
        .uri("/api/meta/lead")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_health_reports_uptime() {
    let server = MockServer::start().await;
    let app = create_app(create_test_config(server.uri(), None));

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert!(body["uptime"].as_f64().unwrap() >= 0.0);
    assert_eq!(body["service"], "lead-capture-api");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let server = MockServer::start().await;
    let app = create_app(create_test_config(server.uri(), None));

    let request = Request::builder()
        .uri("/api/unknown")
        .body(Body::empty())
        .unwrap();
    let (status, body) = call(app, request).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Not Found"}));
}

#[tokio::test]
async fn test_client_timeout_is_bounded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let mut config = create_test_config(server.uri(), None);
    config.meta_timeout_secs = 1;
    let app = create_app(config);

    let started = Instant::now();
    let (status, _) = call(app, lead_request(json!({"eventID": "evt-1"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(started.elapsed() < Duration::from_secs(4));
}
