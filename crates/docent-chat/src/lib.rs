//! Conversational retrieval-augmented answer pipeline.
//!
//! Turns `(question, conversation history)` into a grounded, streamed
//! answer: retrieved passages are quality-filtered and curated into a
//! bounded context block, recent history is windowed, both are assembled
//! into a prompt, and the generated answer is streamed while the
//! conversation lifecycle persists the turn around it.

pub mod curator;
pub mod error;
pub mod filter;
pub mod history;
pub mod lifecycle;
pub mod pipeline;
pub mod prompt;
pub mod retrieval;
pub mod stream;

pub use curator::{ContextCurator, NO_CONTEXT_SENTINEL};
pub use error::{ChatError, PersistStage};
pub use filter::{DiscardReason, QualityFilter, Verdict};
pub use history::{pair_turns, HistoryWindow, NO_HISTORY_SENTINEL};
pub use lifecycle::{derive_title, ConversationLifecycle};
pub use pipeline::{AskStream, ChatPipeline};
pub use prompt::{PromptAssembler, CAVEAT_SENTINEL};
pub use retrieval::{IndexRetriever, Retriever};
pub use stream::{AnswerStream, GenerationBackend, StreamEvent};
