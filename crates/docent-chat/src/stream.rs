//! Streaming answer generation.
//!
//! [`GenerationBackend`] is the seam between the pipeline and a model
//! provider. Backends emit tagged [`StreamEvent`]s over a bounded
//! channel; dropping the consumer half cancels the producer because its
//! next send fails.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::ChatError;

/// Channel depth for in-flight answer fragments.
pub const STREAM_BUFFER: usize = 64;

/// One event on an answer stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A fragment of answer text, in emission order.
    Content(String),
    /// The stream failed mid-answer. Terminal; no Content follows.
    Failure(String),
}

/// Produces a stream of answer fragments for a fully assembled prompt.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Start generating. Fragments arrive on the returned channel.
    ///
    /// An `Err` here means generation could not start at all; failures
    /// after the stream opens are delivered as [`StreamEvent::Failure`].
    async fn generate(&self, prompt: &str) -> Result<mpsc::Receiver<StreamEvent>, ChatError>;
}

/// Consumer side of an in-flight answer.
///
/// Accumulates content fragments as they are read, so the full answer
/// text is always the concatenation of every fragment seen so far.
/// Dropping the stream before it completes cancels the backend.
pub struct AnswerStream {
    receiver: mpsc::Receiver<StreamEvent>,
    accumulated: String,
    failure: Option<String>,
}

impl AnswerStream {
    pub fn new(receiver: mpsc::Receiver<StreamEvent>) -> Self {
        Self {
            receiver,
            accumulated: String::new(),
            failure: None,
        }
    }

    /// Pull the next fragment, or `None` when the stream is finished.
    ///
    /// Content fragments are appended to the accumulated answer before
    /// being returned. After a failure event the stream yields `None`.
    pub async fn next_fragment(&mut self) -> Option<Result<String, ChatError>> {
        if self.failure.is_some() {
            return None;
        }
        match self.receiver.recv().await? {
            StreamEvent::Content(fragment) => {
                self.accumulated.push_str(&fragment);
                Some(Ok(fragment))
            }
            StreamEvent::Failure(message) => {
                self.failure = Some(message.clone());
                Some(Err(ChatError::Generation(message)))
            }
        }
    }

    /// Consume the remainder of the stream.
    pub async fn drain(&mut self) {
        while self.next_fragment().await.is_some() {}
    }

    /// Everything accumulated so far.
    pub fn answer(&self) -> &str {
        &self.accumulated
    }

    /// The failure message, if the stream ended in one.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }
}

impl std::fmt::Debug for AnswerStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerStream")
            .field("accumulated_len", &self.accumulated.len())
            .field("failure", &self.failure)
            .finish()
    }
}
