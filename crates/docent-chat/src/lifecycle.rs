//! Conversation lifecycle policy.
//!
//! Lazy creation, ownership checks, title derivation, and the turn
//! persistence sequence sit here, on top of the storage repositories.

use std::sync::Arc;

use chrono::Utc;
use docent_core::types::{Conversation, Message, Role};
use docent_storage::repository::{ConversationRepository, MessageRepository};
use tracing::info;
use uuid::Uuid;

use crate::error::{ChatError, PersistStage};

/// Derive a conversation title from its first question.
///
/// Takes the first `max_chars` characters and appends a single ellipsis
/// marker when the question was longer.
pub fn derive_title(question: &str, max_chars: usize) -> String {
    let mut title: String = question.chars().take(max_chars).collect();
    if question.chars().count() > max_chars {
        title.push_str("...");
    }
    title
}

/// Conversation lifecycle operations for one owner-scoped store.
pub struct ConversationLifecycle {
    conversations: Arc<ConversationRepository>,
    messages: Arc<MessageRepository>,
    title_max_chars: usize,
    list_limit: u64,
}

impl ConversationLifecycle {
    pub fn new(
        conversations: Arc<ConversationRepository>,
        messages: Arc<MessageRepository>,
        config: &docent_core::config::ChatConfig,
    ) -> Self {
        Self {
            conversations,
            messages,
            title_max_chars: config.title_max_chars,
            list_limit: config.list_limit,
        }
    }

    /// Resolve the conversation a question belongs to.
    ///
    /// With no id, a fresh conversation is created lazily. With an id,
    /// the conversation must exist and belong to `owner_id`.
    pub fn ensure_conversation(
        &self,
        owner_id: Uuid,
        conversation_id: Option<Uuid>,
    ) -> Result<Conversation, ChatError> {
        match conversation_id {
            None => {
                let conversation = self
                    .conversations
                    .create(owner_id)
                    .map_err(ChatError::storage)?;
                info!(conversation_id = %conversation.id, "created conversation");
                Ok(conversation)
            }
            Some(id) => {
                let conversation = self
                    .conversations
                    .find_by_id(id)
                    .map_err(ChatError::storage)?
                    .ok_or(ChatError::ConversationNotFound(id))?;
                if conversation.owner_id != owner_id {
                    return Err(ChatError::NotOwner(id));
                }
                Ok(conversation)
            }
        }
    }

    /// Messages of a conversation in chronological order.
    pub fn transcript(&self, conversation_id: Uuid) -> Result<Vec<Message>, ChatError> {
        self.messages
            .for_conversation(conversation_id)
            .map_err(ChatError::storage)
    }

    /// Persist the user's question and derive the title if this is the
    /// conversation's first question.
    pub fn record_question(
        &self,
        conversation_id: Uuid,
        question: &str,
    ) -> Result<Message, ChatError> {
        let message = self
            .messages
            .append(conversation_id, Role::User, question)
            .map_err(|e| ChatError::persistence(PersistStage::UserMessage, e))?;

        let titled = self
            .conversations
            .set_title_if_default(
                conversation_id,
                &derive_title(question, self.title_max_chars),
            )
            .map_err(|e| ChatError::persistence(PersistStage::UserMessage, e))?;
        if titled {
            info!(conversation_id = %conversation_id, "derived conversation title");
        }

        Ok(message)
    }

    /// Persist the assistant's answer and bump the conversation's
    /// recency timestamp, in that order.
    pub fn record_answer(
        &self,
        conversation_id: Uuid,
        answer: &str,
    ) -> Result<Message, ChatError> {
        let message = self
            .messages
            .append(conversation_id, Role::Assistant, answer)
            .map_err(|e| ChatError::persistence(PersistStage::AssistantMessage, e))?;

        self.conversations
            .touch(conversation_id, Utc::now())
            .map_err(|e| ChatError::persistence(PersistStage::Timestamp, e))?;

        Ok(message)
    }

    /// An owner's conversations, most recently updated first.
    pub fn list(&self, owner_id: Uuid) -> Result<Vec<Conversation>, ChatError> {
        self.conversations
            .list_for_owner(owner_id, self.list_limit)
            .map_err(ChatError::storage)
    }

    /// Delete one conversation after an ownership check.
    pub fn delete(&self, owner_id: Uuid, conversation_id: Uuid) -> Result<(), ChatError> {
        let conversation = self
            .conversations
            .find_by_id(conversation_id)
            .map_err(ChatError::storage)?
            .ok_or(ChatError::ConversationNotFound(conversation_id))?;
        if conversation.owner_id != owner_id {
            return Err(ChatError::NotOwner(conversation_id));
        }
        self.conversations
            .delete(conversation_id)
            .map_err(ChatError::storage)?;
        info!(conversation_id = %conversation_id, "deleted conversation");
        Ok(())
    }

    /// Delete every conversation an owner has. Returns the count.
    pub fn delete_all(&self, owner_id: Uuid) -> Result<u64, ChatError> {
        let deleted = self
            .conversations
            .delete_all_for_owner(owner_id)
            .map_err(ChatError::storage)?;
        info!(owner_id = %owner_id, deleted, "deleted all conversations");
        Ok(deleted)
    }
}
