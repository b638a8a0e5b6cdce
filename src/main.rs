use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use lead_capture_api::config::Config;
use lead_capture_api::handlers::{self, ApiDoc, AppState};
use lead_capture_api::hashing::Sha256Hex;
use lead_capture_api::meta_client::MetaConversionsClient;

/// Relay request bodies are a handful of short strings.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Main entry point for the conversion relay.
///
/// This function initializes:
/// - Logging and tracing.
/// - Configuration loading.
/// - The Meta Conversions API client.
/// - HTTP routes and middleware (CORS, body limit, rate limiting).
///
/// It then starts the Axum server.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Ok if the server runs successfully, or an error if initialization fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lead_capture_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    let meta_client = MetaConversionsClient::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Failed to initialize Meta client: {}", e))?;
    tracing::info!(
        "✓ Meta Conversions client initialized: {} {}",
        config.meta_graph_url,
        config.meta_api_version
    );

    // Build application state
    let app_state = Arc::new(AppState {
        config: config.clone(),
        meta_client,
        hash_policy: Arc::new(Sha256Hex),
        started_at: Instant::now(),
    });

    // Configure rate limiter: 10 requests/second per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .context("Invalid rate limiter configuration")?,
    );

    let protected_routes = handlers::relay_routes().layer(
        ServiceBuilder::new()
            .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
            .layer(GovernorLayer {
                config: governor_conf,
            }),
    );

    // Health check bypasses rate limiting
    let app = handlers::public_routes()
        .merge(protected_routes)
        .fallback(handlers::not_found)
        .with_state(app_state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Conversion relay listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
