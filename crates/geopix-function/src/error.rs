//! HTTP error response conversion
//!
//! Handlers return `Result<_, HttpAppError>`; anything convertible into `AppError` renders as
//! a JSON [`ErrorResponse`] with the status from [`ErrorMetadata`]. Details are withheld for
//! sensitive errors and, once [`HttpAppError::for_config`] is applied, in production.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use geopix_core::{AppError, Config, ErrorMetadata, LogLevel};
use geopix_processing::PipelineError;
use geopix_storage::StorageError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code
    pub code: String,
    /// Whether redelivering the notification may succeed
    pub recoverable: bool,
}

/// Wrapper type for AppError to implement IntoResponse
#[derive(Debug)]
pub struct HttpAppError {
    pub error: AppError,
    /// Omit `details` and `error_type` from the response body
    pub hide_details: bool,
}

impl HttpAppError {
    pub fn new(error: AppError) -> Self {
        Self {
            error,
            hide_details: false,
        }
    }

    /// Hide error details when the service runs in production.
    pub fn for_config(mut self, config: &Config) -> Self {
        self.hide_details = config.is_production();
        self
    }
}

impl From<AppError> for HttpAppError {
    fn from(err: AppError) -> Self {
        HttpAppError::new(err)
    }
}

impl From<anyhow::Error> for HttpAppError {
    fn from(err: anyhow::Error) -> Self {
        HttpAppError::new(AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        })
    }
}

impl From<PipelineError> for HttpAppError {
    fn from(err: PipelineError) -> Self {
        HttpAppError::new(err.into())
    }
}

impl From<StorageError> for HttpAppError {
    fn from(err: StorageError) -> Self {
        let app_error = match err {
            StorageError::ConfigError(msg) => AppError::Internal(msg),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            other => AppError::Storage(other.to_string()),
        };
        HttpAppError::new(app_error)
    }
}

impl From<serde_json::Error> for HttpAppError {
    fn from(err: serde_json::Error) -> Self {
        HttpAppError::new(err.into())
    }
}

fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Error occurred");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Error occurred");
        }
    }
}

impl IntoResponse for HttpAppError {
    fn into_response(self) -> Response {
        let app_error = &self.error;

        let status = StatusCode::from_u16(app_error.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        log_error(app_error);

        let show_details = !self.hide_details && !app_error.is_sensitive();
        let body = ErrorResponse {
            error: app_error.client_message(),
            details: show_details.then(|| app_error.detailed_message()),
            error_type: show_details.then(|| app_error.error_type().to_string()),
            code: app_error.error_code().to_string(),
            recoverable: app_error.is_recoverable(),
        };

        (status, Json(body)).into_response()
    }
}
