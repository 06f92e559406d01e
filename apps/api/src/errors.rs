use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// Only `Validation`, `Authentication` and `Interpretation` stop a tool call.
/// `SourceUnavailable` is absorbed by the orchestrator and reported as a warning.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forum authentication failed: {0}")]
    Authentication(String),

    #[error("Query interpretation failed: {message}")]
    Interpretation {
        message: String,
        /// Model output exactly as received, for diagnosis.
        raw_output: Option<String>,
    },

    #[error("Source {source_name} unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut raw = None;
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILURE", msg.clone()),
            AppError::Authentication(msg) => {
                tracing::error!("Forum authentication failed: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "AUTHENTICATION_FAILURE",
                    "Forum API credentials were rejected".to_string(),
                )
            }
            AppError::Interpretation {
                message,
                raw_output,
            } => {
                tracing::warn!("Interpretation failed: {message}");
                raw = raw_output.clone();
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "INTERPRETATION_FAILURE",
                    message.clone(),
                )
            }
            AppError::SourceUnavailable {
                source_name,
                reason,
            } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SOURCE_UNAVAILABLE",
                format!("{source_name}: {reason}"),
            ),
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(raw_output) = raw {
            error["raw_output"] = json!(raw_output);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
