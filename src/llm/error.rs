//! Completion service error types.

use thiserror::Error;

/// Result type for completion service operations.
pub type LlmResult<T> = Result<T, LlmError>;

/// Errors that can occur while talking to the completion service.
///
/// Every variant is a transport or service failure. Malformed JSON in the
/// generated *content* is not an `LlmError`; see [`crate::report::ParseError`].
#[derive(Error, Debug)]
pub enum LlmError {
    /// The client could not be configured.
    #[error("invalid client configuration: {0}")]
    Config(String),

    /// The HTTP request failed before a response arrived.
    #[error("request to completion service failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("completion service returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Error message from the service, or the raw body.
        message: String,
    },

    /// The service reported an error inside the event stream.
    #[error("completion service error: {0}")]
    Service(String),

    /// The response envelope did not have the expected shape.
    #[error("unexpected response from completion service: {0}")]
    MalformedEnvelope(String),

    /// The response carried no choices.
    #[error("completion service returned no choices")]
    EmptyResponse,

    /// The event stream broke off mid-response.
    #[error("stream interrupted: {0}")]
    Stream(String),
}

impl LlmError {
    /// Create a status error from a response code and body.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Check if the failure happened after fragments may already have been delivered.
    pub fn is_mid_stream(&self) -> bool {
        matches!(self, Self::Stream(_) | Self::Service(_))
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedEnvelope(err.to_string())
    }
}
