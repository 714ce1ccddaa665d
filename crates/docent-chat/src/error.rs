//! Error types for the answer pipeline.
//!
//! The taxonomy distinguishes the collaborator that failed, and for
//! persistence it records which half of the turn was already written so
//! the caller can recover safely.

use uuid::Uuid;

use docent_core::error::DocentError;

/// Which persistence step failed during a turn.
///
/// The steps run in this order: user message, assistant message,
/// timestamp update. A failure at a later stage means the earlier ones
/// succeeded — a valid but asymmetric conversation state, not corruption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistStage {
    UserMessage,
    AssistantMessage,
    Timestamp,
}

impl std::fmt::Display for PersistStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PersistStage::UserMessage => "user message",
            PersistStage::AssistantMessage => "assistant message",
            PersistStage::Timestamp => "timestamp update",
        };
        f.write_str(s)
    }
}

/// Errors from the answer pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("retrieval backend unavailable: {0}")]
    RetrievalUnavailable(String),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("persistence failed at {stage}: {message}")]
    Persistence {
        stage: PersistStage,
        message: String,
    },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("conversation not found: {0}")]
    ConversationNotFound(Uuid),

    #[error("conversation {0} does not belong to the caller")]
    NotOwner(Uuid),

    #[error("question cannot be empty")]
    EmptyQuestion,

    #[error("invalid prompt template: {0}")]
    InvalidTemplate(String),
}

impl ChatError {
    /// Tag a storage failure with the persistence stage it interrupted.
    pub fn persistence(stage: PersistStage, err: DocentError) -> Self {
        ChatError::Persistence {
            stage,
            message: err.to_string(),
        }
    }

    /// Wrap a storage failure outside the turn persistence sequence.
    pub fn storage(err: DocentError) -> Self {
        ChatError::Storage(err.to_string())
    }
}

impl From<DocentError> for ChatError {
    fn from(err: DocentError) -> Self {
        ChatError::storage(err)
    }
}
