use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::fmt;

/// Application-specific error types for the conversion relay.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Bad request error (invalid input).
    BadRequest(String),
    /// The conversions API failed or was unreachable.
    ExternalApiError {
        /// Upstream HTTP status, `None` when the request never got a response.
        status: Option<u16>,
        /// Upstream error body (JSON when parseable) or transport error text.
        detail: Value,
    },
    /// Internal server error.
    InternalError(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl AppError {
    /// Upstream failure carrying a plain message as its detail.
    pub fn upstream(message: impl Into<String>) -> Self {
        AppError::ExternalApiError {
            status: None,
            detail: Value::String(message.into()),
        }
    }
}

impl fmt::Display for AppError {
    /// Formats the error for display.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::ExternalApiError {
                status: Some(status),
                detail,
            } => write!(f, "External API error ({}): {}", status, detail),
            AppError::ExternalApiError { status: None, detail } => {
                write!(f, "External API error: {}", detail)
            }
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Converts the error into an HTTP response.
    ///
    /// Every body has the shape `{ "ok": false, "error": ... }`. Upstream
    /// failures are reported as 500 with the upstream detail so the caller can
    /// see why the conversions API refused the event.
    fn into_response(self) -> Response {
        let (status, error_detail) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, Value::String(msg)),
            AppError::ExternalApiError { status, detail } => {
                tracing::error!("External API error (status {:?}): {}", status, detail);
                (StatusCode::INTERNAL_SERVER_ERROR, detail)
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Value::String("Internal server error".to_string()),
                )
            }
            AppError::WithContext { source, context } => {
                // Log full context chain for debugging
                tracing::error!("Error with context: {} -> {}", context, source);
                // Delegate to underlying error's response
                return source.into_response();
            }
        };

        let body = Json(json!({
            "ok": false,
            "error": error_detail,
        }));

        (status, body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    /// Converts a `reqwest::Error` into an `AppError`.
    fn from(err: reqwest::Error) -> Self {
        AppError::ExternalApiError {
            status: err.status().map(|s| s.as_u16()),
            detail: Value::String(err.to_string()),
        }
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    ///
    /// # Arguments
    ///
    /// * `context` - The context message to add.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    ///
    /// # Arguments
    ///
    /// * `f` - A closure that produces the context message.
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T, AppError> {
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e),
            context: f(),
        })
    }
}
