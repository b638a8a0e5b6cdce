use crate::config::Config;
use crate::errors::AppError;
use crate::meta_models::{EventsEnvelope, ServerEvent};
use serde_json::Value;
use std::time::Duration;

/// Client for the Meta Conversions API (server-to-server events).
///
/// One bounded attempt per event: no retry, no queue. A failed send is
/// reported back to the relay caller.
#[derive(Clone)]
pub struct MetaConversionsClient {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
    pixel_id: String,
    access_token: String,
    test_event_code: Option<String>,
}

impl MetaConversionsClient {
    /// Creates a new `MetaConversionsClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Graph API base URL (no trailing slash needed).
    /// * `api_version` - Graph API version segment, e.g. `v19.0`.
    /// * `pixel_id` - Destination pixel/dataset id.
    /// * `access_token` - Conversions API access token.
    /// * `test_event_code` - Optional code routing events to the test tool.
    /// * `timeout` - Upper bound for one request.
    pub fn new(
        base_url: String,
        api_version: String,
        pixel_id: String,
        access_token: String,
        test_event_code: Option<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::InternalError(format!("Failed to create Meta client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_version,
            pixel_id,
            access_token,
            test_event_code,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            config.meta_graph_url.clone(),
            config.meta_api_version.clone(),
            config.meta_pixel_id.clone(),
            config.meta_access_token.clone(),
            config.meta_test_event_code.clone(),
            Duration::from_secs(config.meta_timeout_secs),
        )
    }

    /// Sends one event.
    ///
    /// # Returns
    ///
    /// * `Result<Value, AppError>` - The upstream response body on 2xx, or
    ///   `ExternalApiError` with the upstream error body otherwise.
    pub async fn send_event(&self, event: ServerEvent) -> Result<Value, AppError> {
        let endpoint = format!(
            "{}/{}/{}/events",
            self.base_url, self.api_version, self.pixel_id
        );

        // Build URL with proper parameter encoding
        let url = reqwest::Url::parse_with_params(
            &endpoint,
            &[("access_token", self.access_token.as_str())],
        )
        .map_err(|e| AppError::InternalError(format!("Failed to build URL: {}", e)))?;

        tracing::info!("Sending conversion event {} to Meta", event.event_id);
        // Redact token from logs to prevent credential exposure
        tracing::debug!("Meta URL: {}?access_token=[REDACTED]", endpoint);

        let envelope = EventsEnvelope {
            data: vec![event],
            test_event_code: self.test_event_code.clone(),
        };

        let response = self
            .client
            .post(url)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| AppError::upstream(format!("Meta request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));

        if !status.is_success() {
            tracing::error!("Meta returned error {}: {}", status, body);
            return Err(AppError::ExternalApiError {
                status: Some(status.as_u16()),
                detail: body,
            });
        }

        tracing::info!("✓ Conversion event accepted by Meta");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = MetaConversionsClient::new(
            "https://graph.example.com/".to_string(),
            "v19.0".to_string(),
            "123".to_string(),
            "token".to_string(),
            None,
            Duration::from_secs(5),
        );
        assert!(client.is_ok());
        assert_eq!(client.unwrap().base_url, "https://graph.example.com");
    }
}
