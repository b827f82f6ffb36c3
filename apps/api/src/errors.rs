use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::extraction::ExtractError;
use crate::session::models::StageGuardError;
use crate::session::store::StoreError;
use crate::suggestions::OrchestratorError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Missing session state: {0}")]
    MissingSessionState(#[from] StageGuardError),

    #[error("Generation failed: {0}")]
    GenerationFailure(String),

    #[error("Multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Session store error: {0}")]
    Store(#[from] StoreError),
}

impl From<OrchestratorError> for AppError {
    fn from(err: OrchestratorError) -> Self {
        match err {
            OrchestratorError::SectionNotFound(id) => {
                AppError::NotFound(format!("Section '{id}' not found"))
            }
            OrchestratorError::GenerationFailure(e) => AppError::GenerationFailure(e.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut redirect_to = None;
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Extraction(ExtractError::UnsupportedFormat(_)) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_FORMAT",
                "Please upload a PDF, Word document, or plain text file.".to_string(),
            ),
            AppError::Extraction(ExtractError::FileTooLarge { .. }) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "FILE_TOO_LARGE",
                "File size should be less than 5MB.".to_string(),
            ),
            AppError::Extraction(ExtractError::ExtractionFailure(reason)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "EXTRACTION_FAILURE",
                format!("Failed to process the resume: {reason}. Please try a different file."),
            ),
            AppError::MissingSessionState(guard) => {
                redirect_to = Some(guard.redirect_to);
                (
                    StatusCode::CONFLICT,
                    "MISSING_SESSION_STATE",
                    format!("The {} is missing. Please start again.", guard.missing),
                )
            }
            AppError::GenerationFailure(msg) => {
                tracing::error!("Generation failure: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "GENERATION_FAILURE",
                    "Failed to generate AI suggestions. Please try again.".to_string(),
                )
            }
            AppError::Multipart(e) => (e.status(), "INVALID_UPLOAD", e.body_text()),
            AppError::Store(e) => {
                tracing::error!("Session store error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(path) = redirect_to {
            error["redirect_to"] = json!(path);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
