use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::ExtractionError;
use crate::generation::request::ValidationError;
use crate::llm_client::GenerationError;
use crate::usage::UsageDenied;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    UsageDenied(#[from] UsageDenied),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ValidationError> for AppError {
    fn from(error: ValidationError) -> Self {
        AppError::Validation(error.to_string())
    }
}

impl AppError {
    /// HTTP status, stable machine code and a guidance hint for the caller.
    fn parts(&self) -> (StatusCode, &'static str, &'static str) {
        match self {
            AppError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                "Provide more complete input and try again.",
            ),
            AppError::Extraction(ExtractionError::UnsupportedType(_)) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_TYPE",
                "Upload a PDF or DOCX file.",
            ),
            AppError::Extraction(ExtractionError::CorruptOrEncrypted(_)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "CORRUPT_OR_ENCRYPTED",
                "Try a different file, or remove password protection and upload again.",
            ),
            AppError::Generation(e) => {
                let (status, hint) = match e {
                    GenerationError::MissingCredentials => (
                        StatusCode::SERVICE_UNAVAILABLE,
                        "Supply your own API key, or ask the operator to configure one.",
                    ),
                    GenerationError::RateLimited(_) => (
                        StatusCode::TOO_MANY_REQUESTS,
                        "The provider is rate limiting requests. Wait a moment and retry.",
                    ),
                    GenerationError::QuotaExceeded(_) => (
                        StatusCode::PAYMENT_REQUIRED,
                        "The provider quota is exhausted. Switch API keys or check billing.",
                    ),
                    GenerationError::Transport(_) => (
                        StatusCode::BAD_GATEWAY,
                        "Check connectivity and retry.",
                    ),
                    GenerationError::Unknown(_) => (
                        StatusCode::BAD_GATEWAY,
                        "Retry; if it keeps failing, report the message above.",
                    ),
                };
                (status, e.code(), hint)
            }
            AppError::UsageDenied(UsageDenied::DailyLimitReached { .. }) => (
                StatusCode::TOO_MANY_REQUESTS,
                "DAILY_LIMIT_REACHED",
                "Use your own API key or come back tomorrow.",
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Retry later.",
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, hint) = self.parts();

        let message = match &self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
            AppError::Generation(e) => {
                tracing::warn!("Generation failed ({}): {e}", e.code());
                e.to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message,
                "hint": hint
            }
        }));

        (status, body).into_response()
    }
}
