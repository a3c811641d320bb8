use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OcrError {
    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    #[error("Preprocessing failed: {0}")]
    PreprocessingError(String),

    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("OCR engine reported an error during text extraction: {0}")]
    EngineProcessing(String),

    #[error("OCR engine timed out during text extraction: {0}")]
    EngineTimeout(String),

    #[error("Unexpected error: {0}")]
    Unexpected(String),

    #[error("Image too large (max: {max} bytes)")]
    ImageTooLarge { max: usize },

    #[error("Missing file in request")]
    MissingFile,

    #[error("No preprocessed image available, upload an image first")]
    NoImage,

    #[error("No text has been extracted yet")]
    NoText,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session is busy with another action")]
    SessionBusy,

    #[error("Too many open sessions (max: {0})")]
    TooManySessions(usize),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcrError {
    /// Stable machine-readable code and HTTP status for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            OcrError::DecodeError(_) => (StatusCode::BAD_REQUEST, "DECODE_ERROR"),
            OcrError::PreprocessingError(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "PREPROCESSING_ERROR")
            }
            OcrError::EngineUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "ENGINE_UNAVAILABLE")
            }
            OcrError::EngineProcessing(_) => (StatusCode::BAD_GATEWAY, "ENGINE_PROCESSING_ERROR"),
            OcrError::EngineTimeout(_) => (StatusCode::GATEWAY_TIMEOUT, "ENGINE_TIMEOUT"),
            OcrError::Unexpected(_) => (StatusCode::INTERNAL_SERVER_ERROR, "UNEXPECTED_ERROR"),
            OcrError::ImageTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "IMAGE_TOO_LARGE"),
            OcrError::MissingFile => (StatusCode::BAD_REQUEST, "MISSING_FILE"),
            OcrError::NoImage => (StatusCode::CONFLICT, "NO_IMAGE"),
            OcrError::NoText => (StatusCode::NOT_FOUND, "NO_TEXT"),
            OcrError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            OcrError::SessionNotFound(_) => (StatusCode::NOT_FOUND, "SESSION_NOT_FOUND"),
            OcrError::SessionBusy => (StatusCode::CONFLICT, "SESSION_BUSY"),
            OcrError::TooManySessions(_) => (StatusCode::SERVICE_UNAVAILABLE, "TOO_MANY_SESSIONS"),
            OcrError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    pub severity: &'static str,
}

impl IntoResponse for OcrError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if status.is_server_error() {
            tracing::error!(code, "{}", self);
        } else {
            tracing::warn!(code, "{}", self);
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
            severity: "error",
        });

        (status, body).into_response()
    }
}
