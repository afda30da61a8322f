//! Completion service access.
//!
//! The documentation model is reached through an OpenAI-compatible chat
//! completions endpoint, in one of two response modes:
//!
//! ```text
//! ┌──────────────┐   POST /chat/completions   ┌────────────────────┐
//! │  PromptPair  │ ─────────────────────────► │ completion service │
//! └──────────────┘                            └────────────────────┘
//!                                                │            │
//!                             stream = false     │            │  stream = true
//!                                                ▼            ▼
//!                                   one JSON envelope    text/event-stream
//!                                          │                  │
//!                                          ▼                  ▼
//!                                       String         FragmentStream
//! ```
//!
//! [`CompletionService`] is the seam the rest of the crate depends on;
//! [`DocumentationClient`] is the HTTP implementation.

mod client;
mod error;
pub mod protocol;
mod sse;
mod stream;

use async_trait::async_trait;

pub use client::DocumentationClient;
pub use error::{LlmError, LlmResult};
pub use sse::SseDecoder;
pub use stream::{FragmentSender, FragmentStream, FRAGMENT_BUFFER};

use crate::prompt::PromptPair;

/// Raw model output in the requested delivery mode.
#[derive(Debug)]
pub enum Completion {
    /// The whole text in one unit.
    Full(String),
    /// Incremental fragments, concatenated by the caller.
    Stream(FragmentStream),
}

impl Completion {
    /// Reduce either mode to the complete text.
    pub async fn into_text(self) -> LlmResult<String> {
        match self {
            Completion::Full(text) => Ok(text),
            Completion::Stream(stream) => stream.collect_text().await,
        }
    }
}

/// A remote model that turns a prompt pair into JSON text.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Model identifier sent with each request.
    fn model(&self) -> &str;

    /// Issue one request and wait for the complete response text.
    async fn complete(&self, prompt: &PromptPair) -> LlmResult<String>;

    /// Issue one request and return its fragments as they arrive.
    ///
    /// Errors that happen before the first byte of the body (connection,
    /// authentication, status) are returned here; later failures arrive as
    /// an `Err` item on the stream.
    async fn stream(&self, prompt: &PromptPair) -> LlmResult<FragmentStream>;

    /// Issue one request in the mode selected by `stream`.
    async fn request(&self, prompt: &PromptPair, stream: bool) -> LlmResult<Completion> {
        if stream {
            self.stream(prompt).await.map(Completion::Stream)
        } else {
            self.complete(prompt).await.map(Completion::Full)
        }
    }
}
