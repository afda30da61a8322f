//! Consumable sequence of streamed text fragments.

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use super::error::LlmResult;

/// Fragments buffered between the reader task and the consumer.
pub const FRAGMENT_BUFFER: usize = 64;

/// Sending half used by producers of a [`FragmentStream`].
pub type FragmentSender = mpsc::Sender<LlmResult<String>>;

/// Text fragments of one streamed completion, in arrival order.
///
/// The stream is finite: it ends when the producer drops its sender, either
/// after the last fragment or right after delivering an error. It cannot be
/// restarted; a retry means issuing a new request.
#[derive(Debug)]
pub struct FragmentStream {
    rx: mpsc::Receiver<LlmResult<String>>,
}

impl FragmentStream {
    /// Create a connected sender/stream pair.
    pub fn channel() -> (FragmentSender, Self) {
        let (tx, rx) = mpsc::channel(FRAGMENT_BUFFER);
        (tx, Self { rx })
    }

    /// Build an already-complete stream from fixed items.
    pub fn from_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = LlmResult<String>>,
    {
        let items: Vec<_> = items.into_iter().collect();
        let (tx, rx) = mpsc::channel(items.len().max(1));
        for item in items {
            // Capacity covers every item, so this cannot fail.
            let _ = tx.try_send(item);
        }
        Self { rx }
    }

    /// Build a stream that yields the given fragments and then ends.
    pub fn from_fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_items(fragments.into_iter().map(|f| Ok(f.into())))
    }

    /// Receive the next fragment. `None` means end of stream.
    pub async fn next(&mut self) -> Option<LlmResult<String>> {
        self.rx.recv().await
    }

    /// Concatenate every fragment in arrival order.
    ///
    /// Stops at the first error; fragments received before it are discarded.
    pub async fn collect_text(mut self) -> LlmResult<String> {
        let mut text = String::new();
        while let Some(fragment) = self.next().await {
            text.push_str(&fragment?);
        }
        Ok(text)
    }

    /// Adapt into a `futures::Stream`.
    pub fn into_stream(self) -> ReceiverStream<LlmResult<String>> {
        ReceiverStream::new(self.rx)
    }
}
