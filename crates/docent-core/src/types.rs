//! Domain types shared across the Docent workspace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Title given to a conversation before its first user message is recorded.
pub const DEFAULT_TITLE: &str = "New Chat";

/// Who authored a message within a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Stable string form used in the database and in prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Parse the stable string form. Returns `None` for unknown roles.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

/// A retrieved documentation fragment, candidate for inclusion in a prompt.
///
/// Produced by the retrieval interface, consumed by the context curator.
/// Ephemeral: never persisted by the answer pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    /// Raw text content of the fragment.
    pub content: String,
    /// Short label for the source corpus (e.g. a framework name).
    pub source_label: String,
    /// URL of the page the fragment came from.
    pub source_url: String,
    /// 1-based rank in the similarity ordering, best first.
    pub similarity_rank: usize,
}

/// A persisted conversation. Groups messages into a single chat thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    /// The user this conversation belongs to. Ownership is exclusive.
    pub owner_id: Uuid,
    /// Display title; starts as [`DEFAULT_TITLE`] and is derived from the
    /// first user message exactly once.
    pub title: String,
    pub created_at: DateTime<Utc>,
    /// Monotonically non-decreasing; bumped after each recorded turn.
    pub updated_at: DateTime<Utc>,
}

/// A persisted message within a conversation. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// One user question paired with its assistant answer.
///
/// Not stored as an entity; reconstructed by pairing consecutive messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub question: String,
    pub answer: String,
}
