//! JSON error responses for the API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::export::ExportError;
use crate::generate::GenerateError;
use crate::session::SessionError;

/// Body of every failed API call.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Short category: "session", "upload", "transport", "parse", "export".
    pub kind: &'static str,
    pub message: String,
    /// Raw model output, for parse failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

/// An API failure with its HTTP status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                kind,
                message: message.into(),
                raw: None,
            },
        }
    }

    pub fn bad_upload(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "upload", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        let status = match err {
            SessionError::NotFound(_) => StatusCode::NOT_FOUND,
            SessionError::NoUpload => StatusCode::BAD_REQUEST,
            SessionError::GenerationInProgress => StatusCode::CONFLICT,
        };
        Self::new(status, "session", err.to_string())
    }
}

impl From<&GenerateError> for ErrorBody {
    fn from(err: &GenerateError) -> Self {
        ErrorBody {
            kind: err.kind(),
            message: err.to_string(),
            raw: err.raw().map(str::to_string),
        }
    }
}

impl From<GenerateError> for ApiError {
    fn from(err: GenerateError) -> Self {
        let status = match err {
            GenerateError::Transport(_) => StatusCode::BAD_GATEWAY,
            GenerateError::Parse(_) => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self {
            status,
            body: ErrorBody::from(&err),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        let status = match err {
            ExportError::UnsupportedFormat(_) => StatusCode::BAD_REQUEST,
            ExportError::Docx(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, "export", err.to_string())
    }
}
