/// Client-side conversion reporting
///
/// After a lead is accepted by the webhook, the same conversion goes out on
/// two channels tagged with one event id:
/// 1. The advertising pixel (synchronous, best-effort)
/// 2. The conversion relay (detached HTTP POST, best-effort)
///
/// Neither channel is retried and neither can fail the submission: errors are
/// logged and dropped. Retrying would risk counting the lead twice.
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::meta_models::MetaLeadRequest;

/// Error raised by a pixel implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelError(pub String);

impl fmt::Display for PixelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pixel error: {}", self.0)
    }
}

impl std::error::Error for PixelError {}

/// The advertising pixel's custom-event call (`fbq('trackCustom', …)`).
pub trait AdPixel: Send + Sync {
    fn track_custom(&self, event_name: &str, event_id: &str) -> Result<(), PixelError>;
}

/// Pixel for environments where none is loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPixel;

impl AdPixel for NoopPixel {
    fn track_custom(&self, event_name: &str, event_id: &str) -> Result<(), PixelError> {
        tracing::debug!("No pixel loaded, skipping {} ({})", event_name, event_id);
        Ok(())
    }
}

/// Browser identifiers read from the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowserContext {
    /// `_fbp` cookie
    pub fbp: Option<String>,
    /// Click id built from `fbclid`, else the `_fbc` cookie
    pub fbc: Option<String>,
    /// Current page URL
    pub source_url: String,
}

impl BrowserContext {
    /// Reads ids from the page URL and its `Cookie` header value.
    pub fn from_page(source_url: &str, cookie_header: &str) -> Self {
        Self::from_page_at(source_url, cookie_header, Utc::now().timestamp())
    }

    pub fn from_page_at(source_url: &str, cookie_header: &str, now_secs: i64) -> Self {
        let fbc = click_id_from_url(source_url, now_secs)
            .or_else(|| cookie_value(cookie_header, "_fbc"));

        Self {
            fbp: cookie_value(cookie_header, "_fbp"),
            fbc,
            source_url: source_url.to_string(),
        }
    }
}

/// Value of cookie `name` in a `Cookie` header (`a=1; b=2`).
pub fn cookie_value(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == name).then(|| value.to_string())
        })
        .filter(|v| !v.is_empty())
}

/// `fb.1.<unix seconds>.<fbclid>` when the landing URL carries `fbclid`.
pub fn click_id_from_url(source_url: &str, now_secs: i64) -> Option<String> {
    let url = url::Url::parse(source_url).ok()?;
    let fbclid = url
        .query_pairs()
        .find(|(k, _)| k == "fbclid")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())?;
    Some(format!("fb.1.{}.{}", now_secs, fbclid))
}

/// Random, practically collision-free correlation id.
pub fn generate_event_id() -> String {
    Uuid::new_v4().to_string()
}

/// Result of one conversion report.
#[derive(Debug)]
pub struct ConversionReceipt {
    /// Id shared by the pixel event and the relay call
    pub event_id: String,
    /// Detached relay POST; awaiting it is optional
    pub relay_task: JoinHandle<()>,
}

/// Fires the pixel event and the relay POST for a converted lead.
#[derive(Clone)]
pub struct ConversionReporter {
    pixel: Arc<dyn AdPixel>,
    client: reqwest::Client,
    relay_url: String,
    event_name: String,
    browser: BrowserContext,
}

impl ConversionReporter {
    pub fn new(
        pixel: Arc<dyn AdPixel>,
        client: reqwest::Client,
        relay_url: String,
        event_name: String,
        browser: BrowserContext,
    ) -> Self {
        Self {
            pixel,
            client,
            relay_url,
            event_name,
            browser,
        }
    }

    /// Reports one conversion. Must be called from within a Tokio runtime.
    ///
    /// Generates a fresh event id, fires the pixel synchronously and spawns
    /// the relay POST. Returns immediately; nothing here can fail the caller.
    pub fn report(&self, email: Option<&str>, phone: Option<&str>) -> ConversionReceipt {
        let event_id = generate_event_id();

        if let Err(e) = self.pixel.track_custom(&self.event_name, &event_id) {
            tracing::warn!("⚠️  Pixel event {} failed: {}", event_id, e);
        }

        let payload = MetaLeadRequest {
            event_id: event_id.clone(),
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
            fbp: self.browser.fbp.clone(),
            fbc: self.browser.fbc.clone(),
            event_source_url: Some(self.browser.source_url.clone()),
        };

        let client = self.client.clone();
        let relay_url = self.relay_url.clone();
        let relay_task = tokio::spawn(async move {
            post_to_relay(client, relay_url, payload).await;
        });

        ConversionReceipt {
            event_id,
            relay_task,
        }
    }
}

/// Fire-and-forget: failures are only logged.
async fn post_to_relay(client: reqwest::Client, relay_url: String, payload: MetaLeadRequest) {
    let result = client.post(&relay_url).json(&payload).send().await;

    match result {
        Ok(response) if response.status().is_success() => {
            tracing::debug!("✓ Relay accepted conversion {}", payload.event_id);
        }
        Ok(response) => {
            tracing::warn!(
                "⚠️  Relay returned {} for conversion {}",
                response.status(),
                payload.event_id
            );
        }
        Err(e) => {
            tracing::warn!("⚠️  Relay POST failed for {}: {}", payload.event_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_value() {
        let cookies = "theme=dark; _fbp=fb.1.1700000000.42; _fbc=";
        assert_eq!(
            cookie_value(cookies, "_fbp"),
            Some("fb.1.1700000000.42".to_string())
        );
        assert_eq!(cookie_value(cookies, "_fbc"), None);
        assert_eq!(cookie_value(cookies, "missing"), None);
        assert_eq!(cookie_value("", "_fbp"), None);
    }

    #[test]
    fn test_click_id_from_url() {
        assert_eq!(
            click_id_from_url("https://example.com/form?fbclid=AbC123", 1_700_000_000),
            Some("fb.1.1700000000.AbC123".to_string())
        );
        assert_eq!(click_id_from_url("https://example.com/form", 1), None);
        assert_eq!(click_id_from_url("not a url", 1), None);
    }

    #[test]
    fn test_browser_context_prefers_url_click_id() {
        let ctx = BrowserContext::from_page_at(
            "https://example.com/form?fbclid=XYZ",
            "_fbc=fb.1.1600000000.OLD; _fbp=fb.1.1.2",
            1_700_000_000,
        );
        assert_eq!(ctx.fbc.as_deref(), Some("fb.1.1700000000.XYZ"));
        assert_eq!(ctx.fbp.as_deref(), Some("fb.1.1.2"));

        let ctx = BrowserContext::from_page_at(
            "https://example.com/form",
            "_fbc=fb.1.1600000000.OLD",
            1_700_000_000,
        );
        assert_eq!(ctx.fbc.as_deref(), Some("fb.1.1600000000.OLD"));
    }

    #[tokio::test]
    async fn test_report_with_noop_pixel() {
        // relay URL points nowhere; the failure stays inside the task
        let reporter = ConversionReporter::new(
            Arc::new(NoopPixel),
            reqwest::Client::new(),
            "http://127.0.0.1:9/api/meta/lead".to_string(),
            "Lead".to_string(),
            BrowserContext::default(),
        );
        let receipt = reporter.report(Some("ana@ex.com"), None);
        assert_eq!(receipt.event_id.len(), 36);
        assert!(receipt.relay_task.await.is_ok());
    }

    #[test]
    fn test_event_ids_are_unique() {
        let a = generate_event_id();
        let b = generate_event_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }
}
