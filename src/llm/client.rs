//! HTTP client for the chat completions endpoint.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tracing::{debug, error, info, warn};

use super::error::{LlmError, LlmResult};
use super::protocol::{
    decode_stream_payload, error_message, ChatCompletionRequest, ChatCompletionResponse,
    StreamPayload, CHAT_COMPLETIONS_PATH,
};
use super::sse::SseDecoder;
use super::stream::{FragmentSender, FragmentStream};
use super::CompletionService;
use crate::config::LlmSettings;
use crate::prompt::PromptPair;

/// Client for the documentation model.
///
/// One call is one HTTP request. There is no retry and no backoff: a failed
/// attempt is reported to the caller, who decides whether to try again.
///
/// # Example
///
/// ```ignore
/// use scriptdoc::llm::{CompletionService, DocumentationClient};
/// use scriptdoc::prompt::build_messages;
///
/// let client = DocumentationClient::from_settings(&settings.llm, settings.api_key()?)?;
/// let prompt = build_messages(&source, "pipeline.py");
///
/// let mut fragments = client.stream(&prompt).await?;
/// while let Some(fragment) = fragments.next().await {
///     print!("{}", fragment?);
/// }
/// ```
#[derive(Clone)]
pub struct DocumentationClient {
    client: Client,
    url: String,
    model: String,
    api_key: String,
}

impl std::fmt::Debug for DocumentationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentationClient")
            .field("url", &self.url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl DocumentationClient {
    /// Create a client for an API base such as `https://api.openai.com/v1`.
    pub fn new(
        endpoint: &str,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> LlmResult<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(LlmError::Config("API key cannot be empty".to_string()));
        }

        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: format!("{}{}", endpoint.trim_end_matches('/'), CHAT_COMPLETIONS_PATH),
            model: model.into(),
            api_key,
        })
    }

    /// Create a client from the `[llm]` settings section.
    pub fn from_settings(settings: &LlmSettings, api_key: impl Into<String>) -> LlmResult<Self> {
        let endpoint = settings
            .resolved_endpoint()
            .map_err(|e| LlmError::Config(e.to_string()))?;
        Self::new(&endpoint, settings.model.clone(), api_key, settings.timeout())
    }

    /// Full URL requests are posted to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send the request and return the response once its status is known to be a success.
    async fn send(&self, prompt: &PromptPair, stream: bool) -> LlmResult<reqwest::Response> {
        let body = ChatCompletionRequest::new(&self.model, prompt, stream);

        info!(
            model = %self.model,
            stream,
            prompt_bytes = prompt.content_len(),
            "sending documentation request"
        );

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("completion request failed: {}", e);
                LlmError::Http(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read error response".to_string());
            let message = error_message(&text);
            error!(status = status.as_u16(), "completion service error: {}", message);
            return Err(LlmError::status(status.as_u16(), message));
        }

        Ok(response)
    }

    /// Drain an event-stream body into `tx`.
    ///
    /// Returns the number of fragments forwarded. An `Err` means the error has
    /// not been delivered yet; the caller forwards it.
    async fn pump(response: reqwest::Response, tx: &FragmentSender) -> LlmResult<usize> {
        let mut body = response.bytes_stream();
        let mut decoder = SseDecoder::new();
        let mut forwarded = 0usize;

        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| LlmError::Stream(e.to_string()))?;
            for data in decoder.push(&chunk) {
                match decode_stream_payload(&data)? {
                    StreamPayload::Fragment(text) => {
                        if tx.send(Ok(text)).await.is_err() {
                            debug!("fragment receiver dropped; stopping stream");
                            return Ok(forwarded);
                        }
                        forwarded += 1;
                    }
                    StreamPayload::Empty => {}
                    StreamPayload::Done => return Ok(forwarded),
                }
            }
        }

        // Body ended without [DONE]; a final unterminated event may still be buffered.
        if let Some(data) = decoder.finish() {
            if let StreamPayload::Fragment(text) = decode_stream_payload(&data)? {
                if tx.send(Ok(text)).await.is_ok() {
                    forwarded += 1;
                }
            }
        }
        warn!("event stream ended without [DONE]");
        Ok(forwarded)
    }
}

#[async_trait]
impl CompletionService for DocumentationClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &PromptPair) -> LlmResult<String> {
        let start = Instant::now();
        let response = self.send(prompt, false).await?;

        let body = response.text().await?;
        let parsed: ChatCompletionResponse = serde_json::from_str(&body)?;
        let text = parsed.into_text()?;

        info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            bytes = text.len(),
            "documentation response received"
        );
        Ok(text)
    }

    async fn stream(&self, prompt: &PromptPair) -> LlmResult<FragmentStream> {
        let start = Instant::now();
        let response = self.send(prompt, true).await?;
        let (tx, stream) = FragmentStream::channel();

        tokio::spawn(async move {
            match Self::pump(response, &tx).await {
                Ok(count) => info!(
                    fragments = count,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "documentation stream completed"
                ),
                Err(e) => {
                    error!("documentation stream failed: {}", e);
                    let _ = tx.send(Err(e)).await;
                }
            }
        });

        Ok(stream)
    }
}
