//! Pipeline orchestration.
//!
//! [`ChatPipeline::ask`] runs one question end to end: resolve the
//! conversation, window its history, persist the question, retrieve and
//! curate context, assemble the prompt, and hand back an [`AskStream`]
//! that streams the answer and persists the completed turn.

use std::sync::Arc;

use docent_core::config::DocentConfig;
use docent_core::types::{Conversation, Message};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::curator::ContextCurator;
use crate::error::ChatError;
use crate::history::HistoryWindow;
use crate::lifecycle::ConversationLifecycle;
use crate::prompt::PromptAssembler;
use crate::retrieval::Retriever;
use crate::stream::{AnswerStream, GenerationBackend};

/// Orchestrates the retrieval-augmented answer pipeline.
pub struct ChatPipeline {
    lifecycle: Arc<ConversationLifecycle>,
    retriever: Arc<dyn Retriever>,
    backend: Arc<dyn GenerationBackend>,
    curator: ContextCurator,
    history: HistoryWindow,
    assembler: PromptAssembler,
    fetch_k: usize,
}

impl ChatPipeline {
    pub fn new(
        lifecycle: Arc<ConversationLifecycle>,
        retriever: Arc<dyn Retriever>,
        backend: Arc<dyn GenerationBackend>,
        config: &DocentConfig,
    ) -> Self {
        Self {
            lifecycle,
            retriever,
            backend,
            curator: ContextCurator::from_config(&config.retrieval),
            history: HistoryWindow::new(config.chat.history_turns),
            assembler: PromptAssembler::default(),
            fetch_k: config.retrieval.fetch_k,
        }
    }

    /// Replace the default prompt template.
    pub fn with_assembler(mut self, assembler: PromptAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    /// Ask a question, optionally continuing an existing conversation.
    ///
    /// The history window covers only completed turns; the question
    /// being asked never appears in its own prompt's history block.
    /// Retrieval runs exactly once per question.
    #[instrument(skip(self, question))]
    pub async fn ask(
        &self,
        owner_id: Uuid,
        conversation_id: Option<Uuid>,
        question: &str,
    ) -> Result<AskStream, ChatError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ChatError::EmptyQuestion);
        }

        let conversation = self.lifecycle.ensure_conversation(owner_id, conversation_id)?;

        // Window the transcript before the new question is written so
        // the history block holds prior turns only.
        let transcript = self.lifecycle.transcript(conversation.id)?;
        let history_block = self.history.render_messages(&transcript);

        self.lifecycle.record_question(conversation.id, question)?;

        let passages = self.retriever.fetch(question, self.fetch_k).await?;
        let context_block = self.curator.curate(&passages);

        let prompt = self.assembler.assemble(&context_block, &history_block, question);

        info!(
            conversation_id = %conversation.id,
            retrieved = passages.len(),
            prompt_chars = prompt.len(),
            "asking"
        );

        let receiver = self.backend.generate(&prompt).await?;
        Ok(AskStream {
            conversation,
            stream: AnswerStream::new(receiver),
            lifecycle: Arc::clone(&self.lifecycle),
        })
    }

    pub fn lifecycle(&self) -> &ConversationLifecycle {
        &self.lifecycle
    }
}

/// An in-flight answer for one question.
///
/// Stream fragments as they arrive, then call [`AskStream::finish`] to
/// persist the assistant's answer and bump the conversation's recency.
/// Dropping the stream early cancels generation; the user message stays
/// persisted but no assistant message is written.
pub struct AskStream {
    conversation: Conversation,
    stream: AnswerStream,
    lifecycle: Arc<ConversationLifecycle>,
}

impl AskStream {
    /// The conversation this answer belongs to.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Next answer fragment, or `None` once the stream is exhausted.
    pub async fn next_fragment(&mut self) -> Option<Result<String, ChatError>> {
        self.stream.next_fragment().await
    }

    /// The answer accumulated so far.
    pub fn answer(&self) -> &str {
        self.stream.answer()
    }

    /// Drain any remaining fragments and persist the completed turn.
    ///
    /// On a generation failure nothing further is persisted and the
    /// failure is returned; the already-written user message is left in
    /// place.
    pub async fn finish(mut self) -> Result<Message, ChatError> {
        self.stream.drain().await;
        if let Some(message) = self.stream.failure() {
            return Err(ChatError::Generation(message.to_string()));
        }
        self.lifecycle
            .record_answer(self.conversation.id, self.stream.answer())
    }
}

impl std::fmt::Debug for AskStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AskStream")
            .field("conversation_id", &self.conversation.id)
            .field("stream", &self.stream)
            .finish()
    }
}
