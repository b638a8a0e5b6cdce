/// Lead submission pipeline
///
/// Flow of `submit`:
/// 1. Re-validate the whole active branch (even if the UI gate was bypassed)
/// 2. Build the `LeadRecord` for the branch
/// 3. Disable the submit control and show the pending label
/// 4. POST the record to the lead webhook, bounded by the submit timeout
/// 5. Failure: re-enable the control, restore its label, show a retry message
/// 6. Success: report the conversion and switch to the "submitted" view
///
/// The control's pending flag is the only guard against double submits: a
/// trigger while pending (or after success) is ignored.
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::config::SubmissionConfig;
use crate::conversion::{AdPixel, BrowserContext, ConversionReceipt, ConversionReporter};
use crate::lead_models::LeadRecord;
use crate::wizard::FormValues;
use crate::wizard_models::FieldIssue;

pub const SUBMIT_LABEL: &str = "Enviar";
pub const PENDING_LABEL: &str = "Enviando...";
pub const RETRY_MESSAGE: &str = "Falha ao enviar. Verifique sua conexão e tente novamente.";

/// Why the webhook call failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkFailure {
    /// No response within the submit timeout; the request was cancelled
    Timeout(Duration),
    /// Webhook answered with a non-2xx status
    Status { status: u16, body: String },
    /// Connection-level failure
    Transport(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    /// Required fields fail; nothing was sent
    Validation(Vec<FieldIssue>),
    /// Webhook call failed; the form is editable again
    Network(NetworkFailure),
}

impl fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionError::Validation(issues) => {
                write!(f, "Validation failed for {} field(s)", issues.len())
            }
            SubmissionError::Network(NetworkFailure::Timeout(after)) => {
                write!(f, "Webhook timed out after {:?}", after)
            }
            SubmissionError::Network(NetworkFailure::Status { status, body }) => {
                write!(f, "Webhook returned {}: {}", status, body)
            }
            SubmissionError::Network(NetworkFailure::Transport(msg)) => {
                write!(f, "Webhook request failed: {}", msg)
            }
        }
    }
}

impl std::error::Error for SubmissionError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormView {
    Editing,
    /// Terminal "thank you" view
    Submitted,
}

/// State of the submit button and its surroundings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitControl {
    pub enabled: bool,
    pub pending: bool,
    pub label: String,
    pub error: Option<String>,
    pub view: FormView,
}

impl Default for SubmitControl {
    fn default() -> Self {
        Self {
            enabled: true,
            pending: false,
            label: SUBMIT_LABEL.to_string(),
            error: None,
            view: FormView::Editing,
        }
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// Webhook accepted the lead; conversion reported
    Submitted(ConversionReceipt),
    /// Control was disabled (pending or already submitted); nothing happened
    Ignored,
}

/// One per form instance.
pub struct SubmissionPipeline {
    client: reqwest::Client,
    webhook_url: String,
    timeout: Duration,
    reporter: ConversionReporter,
    control: Mutex<SubmitControl>,
}

impl SubmissionPipeline {
    pub fn new(
        client: reqwest::Client,
        webhook_url: String,
        timeout: Duration,
        reporter: ConversionReporter,
    ) -> Self {
        Self {
            client,
            webhook_url,
            timeout,
            reporter,
            control: Mutex::new(SubmitControl::default()),
        }
    }

    /// Wires the pipeline and its reporter from configuration.
    pub fn from_config(
        config: &SubmissionConfig,
        pixel: Arc<dyn AdPixel>,
        browser: BrowserContext,
    ) -> Self {
        let client = reqwest::Client::new();
        let reporter = ConversionReporter::new(
            pixel,
            client.clone(),
            config.relay_url.clone(),
            config.event_name.clone(),
            browser,
        );
        Self::new(
            client,
            config.webhook_url.clone(),
            config.submit_timeout,
            reporter,
        )
    }

    /// Current state of the submit control.
    pub fn control(&self) -> SubmitControl {
        self.lock_control().clone()
    }

    pub async fn submit(&self, values: FormValues) -> Result<SubmitOutcome, SubmissionError> {
        if !self.lock_control().enabled {
            tracing::debug!("Submit ignored: control disabled");
            return Ok(SubmitOutcome::Ignored);
        }

        let record = LeadRecord::from_values(&values).map_err(|issues| {
            tracing::debug!("Submit blocked by {} validation issue(s)", issues.len());
            SubmissionError::Validation(issues)
        })?;

        let previous_label = {
            let mut control = self.lock_control();
            if !control.enabled {
                return Ok(SubmitOutcome::Ignored);
            }
            let label = std::mem::replace(&mut control.label, PENDING_LABEL.to_string());
            control.enabled = false;
            control.pending = true;
            control.error = None;
            label
        };

        tracing::info!("📨 Submitting {:?} lead to webhook", record.branch());

        match self.post_lead(&record).await {
            Ok(()) => {
                tracing::info!("✅ Lead accepted by webhook");
                let (email, phone) = record.contact();
                let receipt = self.reporter.report(email, Some(phone));

                let mut control = self.lock_control();
                control.pending = false;
                control.view = FormView::Submitted;
                Ok(SubmitOutcome::Submitted(receipt))
            }
            Err(failure) => {
                tracing::error!("Lead submission failed: {:?}", failure);
                let mut control = self.lock_control();
                control.enabled = true;
                control.pending = false;
                control.label = previous_label;
                control.error = Some(RETRY_MESSAGE.to_string());
                Err(SubmissionError::Network(failure))
            }
        }
    }

    /// One POST, cancelled when the timeout elapses.
    ///
    /// The deadline covers the whole exchange: connect, headers and body. A
    /// webhook that answers headers and then stalls still times out.
    async fn post_lead(&self, record: &LeadRecord) -> Result<(), NetworkFailure> {
        let exchange = async {
            let response = self
                .client
                .post(&self.webhook_url)
                .header("Accept", "application/json")
                .json(record)
                .send()
                .await
                .map_err(|e| NetworkFailure::Transport(e.to_string()))?;

            let status = response.status();
            let body = response.text().await;

            if !status.is_success() {
                return Err(NetworkFailure::Status {
                    status: status.as_u16(),
                    body: body.unwrap_or_default(),
                });
            }

            // body is informational; non-JSON or truncated replies are fine
            match body {
                Ok(body) => tracing::debug!("Webhook response: {}", body),
                Err(e) => tracing::debug!("Webhook response body unreadable: {}", e),
            }
            Ok::<(), NetworkFailure>(())
        };

        tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| NetworkFailure::Timeout(self.timeout))?
    }

    fn lock_control(&self) -> MutexGuard<'_, SubmitControl> {
        self.control
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
