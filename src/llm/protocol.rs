//! Wire types for the OpenAI-compatible chat completions API.
//!
//! Only the fields this crate sends or reads are modelled; everything else in
//! the upstream payloads is ignored on deserialization.

use serde::{Deserialize, Serialize};

use super::error::{LlmError, LlmResult};
use crate::prompt::{Message, PromptPair};

/// Path appended to the configured endpoint.
pub const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

/// Terminal payload of a streamed response.
pub const DONE_SENTINEL: &str = "[DONE]";

// ============================================================================
// Request
// ============================================================================

/// Body of a chat completion request.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: [&'a Message; 2],
    pub response_format: ResponseFormat,
    pub stream: bool,
}

impl<'a> ChatCompletionRequest<'a> {
    /// Build a JSON-object request for a prompt pair.
    pub fn new(model: &'a str, prompt: &'a PromptPair, stream: bool) -> Self {
        Self {
            model,
            messages: prompt.messages(),
            response_format: ResponseFormat::json_object(),
            stream,
        }
    }
}

/// Requested output format.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            kind: "json_object",
        }
    }
}

// ============================================================================
// Blocking response
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Text of the first choice. A choice with null content yields an empty string.
    pub fn into_text(self) -> LlmResult<String> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or(LlmError::EmptyResponse)?;
        Ok(choice.message.content.unwrap_or_default())
    }
}

// ============================================================================
// Streamed response
// ============================================================================

/// One `data:` payload of a streamed response.
#[derive(Debug, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    #[serde(default)]
    pub error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
}

/// Outcome of decoding one stream payload.
#[derive(Debug, PartialEq, Eq)]
pub enum StreamPayload {
    /// A non-empty text fragment.
    Fragment(String),
    /// A keep-alive, role-only or empty delta.
    Empty,
    /// The `[DONE]` sentinel.
    Done,
}

/// Decode the `data:` payload of one server-sent event.
pub fn decode_stream_payload(data: &str) -> LlmResult<StreamPayload> {
    let data = data.trim();
    if data == DONE_SENTINEL {
        return Ok(StreamPayload::Done);
    }
    if data.is_empty() {
        return Ok(StreamPayload::Empty);
    }

    let chunk: StreamChunk = serde_json::from_str(data)?;
    if let Some(error) = chunk.error {
        return Err(LlmError::Service(error.message));
    }

    let content = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .unwrap_or_default();

    if content.is_empty() {
        Ok(StreamPayload::Empty)
    } else {
        Ok(StreamPayload::Fragment(content))
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
}

/// Pull the human-readable message out of an error body, falling back to the raw text.
pub fn error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) => body.trim().to_string(),
    }
}
