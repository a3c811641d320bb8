//! Request extractors that report rejections through `OcrError`

use crate::error::OcrError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};

/// `Json` whose rejection is a JSON error body
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(OcrError))]
pub struct AppJson<T>(pub T);

/// `Query` whose rejection is a JSON error body
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(OcrError))]
pub struct AppQuery<T>(pub T);

impl From<JsonRejection> for OcrError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                OcrError::InvalidRequest(format!("Invalid configuration: {}", err.body_text()))
            }
            JsonRejection::JsonSyntaxError(err) => {
                OcrError::InvalidRequest(format!("JSON syntax error: {}", err.body_text()))
            }
            JsonRejection::MissingJsonContentType(_) => OcrError::InvalidRequest(
                "Missing `Content-Type: application/json` header".to_string(),
            ),
            JsonRejection::BytesRejection(_) => {
                OcrError::Internal("Failed to read request body".to_string())
            }
            other => OcrError::InvalidRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for OcrError {
    fn from(rejection: QueryRejection) -> Self {
        OcrError::InvalidRequest(format!("Invalid configuration: {}", rejection.body_text()))
    }
}
