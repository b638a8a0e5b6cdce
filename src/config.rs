use std::time::Duration;

/// Event label shared by the pixel event and the server event so the ads
/// platform can deduplicate them.
pub const DEFAULT_EVENT_NAME: &str = "Lead_FormularioJauPesca";

pub const DEFAULT_PORT: u16 = 62143;
pub const DEFAULT_GRAPH_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_API_VERSION: &str = "v19.0";
pub const DEFAULT_META_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_WEBHOOK_URL: &str =
    "https://webhook.jaupesca.com.br/webhook/captura-de-lead-b2b-form-webhook";
pub const DEFAULT_RELAY_URL: &str = "http://localhost:62143/api/meta/lead";
pub const DEFAULT_SUBMIT_TIMEOUT_MS: u64 = 12_000;

/// Conversion relay (server) configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub meta_access_token: String,
    pub meta_pixel_id: String,
    pub meta_test_event_code: Option<String>,
    pub meta_graph_url: String,
    pub meta_api_version: String,
    pub meta_event_name: String,
    pub meta_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            meta_access_token: std::env::var("META_ACCESS_TOKEN")
                .map_err(|_| anyhow::anyhow!("META_ACCESS_TOKEN environment variable required"))
                .and_then(|token| {
                    if token.trim().is_empty() {
                        anyhow::bail!("META_ACCESS_TOKEN cannot be empty");
                    }
                    Ok(token)
                })?,
            meta_pixel_id: std::env::var("META_PIXEL_ID")
                .map_err(|_| anyhow::anyhow!("META_PIXEL_ID environment variable required"))
                .and_then(|id| {
                    if id.trim().is_empty() {
                        anyhow::bail!("META_PIXEL_ID cannot be empty");
                    }
                    Ok(id.trim().to_string())
                })?,
            meta_test_event_code: std::env::var("META_TEST_EVENT_CODE")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            meta_graph_url: std::env::var("META_GRAPH_URL")
                .unwrap_or_else(|_| DEFAULT_GRAPH_URL.to_string())
                .parse_http_url("META_GRAPH_URL")?,
            meta_api_version: std::env::var("META_API_VERSION")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            meta_event_name: std::env::var("META_EVENT_NAME")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_EVENT_NAME.to_string()),
            meta_timeout_secs: std::env::var("META_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_META_TIMEOUT_SECS.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("META_TIMEOUT_SECS must be a number of seconds"))?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Meta Graph URL: {}", config.meta_graph_url);
        tracing::debug!("Meta API version: {}", config.meta_api_version);
        tracing::debug!("Meta pixel id: {}", config.meta_pixel_id);
        if config.meta_test_event_code.is_some() {
            tracing::warn!("META_TEST_EVENT_CODE set: events go to the test events tool");
        }
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

/// Form-session side configuration: where leads and conversions are posted.
#[derive(Debug, Clone)]
pub struct SubmissionConfig {
    pub webhook_url: String,
    pub relay_url: String,
    pub submit_timeout: Duration,
    pub event_name: String,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            webhook_url: DEFAULT_WEBHOOK_URL.to_string(),
            relay_url: DEFAULT_RELAY_URL.to_string(),
            submit_timeout: Duration::from_millis(DEFAULT_SUBMIT_TIMEOUT_MS),
            event_name: DEFAULT_EVENT_NAME.to_string(),
        }
    }
}

impl SubmissionConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        Ok(Self {
            webhook_url: std::env::var("LEAD_WEBHOOK_URL")
                .unwrap_or(defaults.webhook_url)
                .parse_http_url("LEAD_WEBHOOK_URL")?,
            relay_url: std::env::var("LEAD_RELAY_URL")
                .unwrap_or(defaults.relay_url)
                .parse_http_url("LEAD_RELAY_URL")?,
            submit_timeout: match std::env::var("LEAD_SUBMIT_TIMEOUT_MS") {
                Ok(ms) => Duration::from_millis(ms.parse().map_err(|_| {
                    anyhow::anyhow!("LEAD_SUBMIT_TIMEOUT_MS must be a number of milliseconds")
                })?),
                Err(_) => defaults.submit_timeout,
            },
            event_name: std::env::var("META_EVENT_NAME")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.event_name),
        })
    }
}

trait HttpUrlExt {
    fn parse_http_url(self, name: &str) -> anyhow::Result<String>;
}

impl HttpUrlExt for String {
    fn parse_http_url(self, name: &str) -> anyhow::Result<String> {
        let url = self.trim().to_string();
        if url.is_empty() {
            anyhow::bail!("{} cannot be empty", name);
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            anyhow::bail!("{} must start with http:// or https://", name);
        }
        Ok(url)
    }
}
