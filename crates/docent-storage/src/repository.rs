//! Repository implementations for SQLite-backed persistence.
//!
//! Provides ConversationRepository and MessageRepository which together
//! implement the conversation store: create, append, list, fetch, delete.
//! Titling and turn sequencing policy live in the chat crate; these types
//! only expose the store's logical operations.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use docent_core::error::DocentError;
use docent_core::types::{Conversation, Message, Role, DEFAULT_TITLE};

use crate::db::Database;

/// Repository for conversation rows.
pub struct ConversationRepository {
    db: Arc<Database>,
}

impl ConversationRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Create a new conversation with the sentinel title.
    pub fn create(&self, owner_id: Uuid) -> Result<Conversation, DocentError> {
        let now = Utc::now();
        let conversation = Conversation {
            id: Uuid::new_v4(),
            owner_id,
            title: DEFAULT_TITLE.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO conversations (id, owner_id, title, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    conversation.id.to_string(),
                    conversation.owner_id.to_string(),
                    conversation.title,
                    conversation.created_at.timestamp(),
                    conversation.updated_at.timestamp(),
                ],
            )
            .map_err(|e| DocentError::Storage(format!("Failed to create conversation: {}", e)))?;
            Ok(())
        })?;

        Ok(conversation)
    }

    /// Find a conversation by ID.
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Conversation>, DocentError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, owner_id, title, created_at, updated_at
                     FROM conversations WHERE id = ?1",
                )
                .map_err(|e| DocentError::Storage(e.to_string()))?;

            let result = stmt
                .query_row(rusqlite::params![id.to_string()], |row| {
                    Ok(row_to_conversation(row))
                })
                .optional()
                .map_err(|e| DocentError::Storage(e.to_string()))?;

            match result {
                Some(conversation) => Ok(Some(conversation?)),
                None => Ok(None),
            }
        })
    }

    /// List a user's conversations, most recently updated first.
    pub fn list_for_owner(
        &self,
        owner_id: Uuid,
        limit: u64,
    ) -> Result<Vec<Conversation>, DocentError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, owner_id, title, created_at, updated_at
                     FROM conversations
                     WHERE owner_id = ?1
                     ORDER BY updated_at DESC, created_at DESC
                     LIMIT ?2",
                )
                .map_err(|e| DocentError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![owner_id.to_string(), limit], |row| {
                    Ok(row_to_conversation(row))
                })
                .map_err(|e| DocentError::Storage(e.to_string()))?;

            let mut conversations = Vec::new();
            for row in rows {
                let conversation = row.map_err(|e| DocentError::Storage(e.to_string()))??;
                conversations.push(conversation);
            }
            Ok(conversations)
        })
    }

    /// Set the title once, only while it still holds the sentinel value.
    ///
    /// Returns true if the title was changed. The conditional update makes
    /// title derivation exactly-once even with a stale in-memory row.
    pub fn set_title_if_default(&self, id: Uuid, title: &str) -> Result<bool, DocentError> {
        self.db.with_conn(|conn| {
            let changed = conn
                .execute(
                    "UPDATE conversations SET title = ?2 WHERE id = ?1 AND title = ?3",
                    rusqlite::params![id.to_string(), title, DEFAULT_TITLE],
                )
                .map_err(|e| DocentError::Storage(format!("Failed to set title: {}", e)))?;
            Ok(changed > 0)
        })
    }

    /// Bump `updated_at`. Never moves the timestamp backwards.
    pub fn touch(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DocentError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "UPDATE conversations
                 SET updated_at = MAX(updated_at, ?2)
                 WHERE id = ?1",
                rusqlite::params![id.to_string(), at.timestamp()],
            )
            .map_err(|e| DocentError::Storage(format!("Failed to touch conversation: {}", e)))?;
            Ok(())
        })
    }

    /// Delete a conversation. Messages cascade via the foreign key.
    ///
    /// Returns true if a row was deleted.
    pub fn delete(&self, id: Uuid) -> Result<bool, DocentError> {
        self.db.with_conn(|conn| {
            let deleted = conn
                .execute(
                    "DELETE FROM conversations WHERE id = ?1",
                    rusqlite::params![id.to_string()],
                )
                .map_err(|e| DocentError::Storage(format!("Failed to delete conversation: {}", e)))?;
            Ok(deleted > 0)
        })
    }

    /// Delete all conversations for an owner. Returns the number deleted.
    pub fn delete_all_for_owner(&self, owner_id: Uuid) -> Result<u64, DocentError> {
        self.db.with_conn(|conn| {
            let deleted = conn
                .execute(
                    "DELETE FROM conversations WHERE owner_id = ?1",
                    rusqlite::params![owner_id.to_string()],
                )
                .map_err(|e| DocentError::Storage(e.to_string()))?;
            Ok(deleted as u64)
        })
    }
}

/// Repository for message rows.
pub struct MessageRepository {
    db: Arc<Database>,
}

impl MessageRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Append a message to a conversation.
    pub fn append(
        &self,
        conversation_id: Uuid,
        role: Role,
        content: &str,
    ) -> Result<Message, DocentError> {
        let message = Message {
            id: Uuid::new_v4(),
            conversation_id,
            role,
            content: content.to_string(),
            created_at: Utc::now(),
        };

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (id, conversation_id, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    message.id.to_string(),
                    message.conversation_id.to_string(),
                    message.role.as_str(),
                    message.content,
                    message.created_at.timestamp(),
                ],
            )
            .map_err(|e| DocentError::Storage(format!("Failed to append message: {}", e)))?;
            Ok(())
        })?;

        Ok(message)
    }

    /// Fetch all messages of a conversation in chronological order.
    ///
    /// Same-second ties (the common case for a user/assistant pair) are
    /// broken by insertion order.
    pub fn for_conversation(&self, conversation_id: Uuid) -> Result<Vec<Message>, DocentError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, conversation_id, role, content, created_at
                     FROM messages
                     WHERE conversation_id = ?1
                     ORDER BY created_at ASC, rowid ASC",
                )
                .map_err(|e| DocentError::Storage(e.to_string()))?;

            let rows = stmt
                .query_map(rusqlite::params![conversation_id.to_string()], |row| {
                    Ok(row_to_message(row))
                })
                .map_err(|e| DocentError::Storage(e.to_string()))?;

            let mut messages = Vec::new();
            for row in rows {
                let message = row.map_err(|e| DocentError::Storage(e.to_string()))??;
                messages.push(message);
            }
            Ok(messages)
        })
    }

    /// Count messages in a conversation.
    pub fn count(&self, conversation_id: Uuid) -> Result<u64, DocentError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM messages WHERE conversation_id = ?1",
                    rusqlite::params![conversation_id.to_string()],
                    |row| row.get(0),
                )
                .map_err(|e| DocentError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }
}

// ============================================================================
// Helper functions for row-to-entity conversion.
// ============================================================================

fn row_to_conversation(row: &rusqlite::Row<'_>) -> Result<Conversation, DocentError> {
    let id_str: String = row.get(0).map_err(|e| DocentError::Storage(e.to_string()))?;
    let owner_str: String = row.get(1).map_err(|e| DocentError::Storage(e.to_string()))?;
    let title: String = row.get(2).map_err(|e| DocentError::Storage(e.to_string()))?;
    let created_i64: i64 = row.get(3).map_err(|e| DocentError::Storage(e.to_string()))?;
    let updated_i64: i64 = row.get(4).map_err(|e| DocentError::Storage(e.to_string()))?;

    Ok(Conversation {
        id: parse_uuid(&id_str)?,
        owner_id: parse_uuid(&owner_str)?,
        title,
        created_at: epoch_to_datetime(created_i64),
        updated_at: epoch_to_datetime(updated_i64),
    })
}

fn row_to_message(row: &rusqlite::Row<'_>) -> Result<Message, DocentError> {
    let id_str: String = row.get(0).map_err(|e| DocentError::Storage(e.to_string()))?;
    let conv_str: String = row.get(1).map_err(|e| DocentError::Storage(e.to_string()))?;
    let role_str: String = row.get(2).map_err(|e| DocentError::Storage(e.to_string()))?;
    let content: String = row.get(3).map_err(|e| DocentError::Storage(e.to_string()))?;
    let created_i64: i64 = row.get(4).map_err(|e| DocentError::Storage(e.to_string()))?;

    let role = Role::parse(&role_str)
        .ok_or_else(|| DocentError::Storage(format!("Unknown role: {}", role_str)))?;

    Ok(Message {
        id: parse_uuid(&id_str)?,
        conversation_id: parse_uuid(&conv_str)?,
        role,
        content,
        created_at: epoch_to_datetime(created_i64),
    })
}

fn parse_uuid(s: &str) -> Result<Uuid, DocentError> {
    Uuid::parse_str(s).map_err(|e| DocentError::Storage(format!("Invalid UUID: {}", e)))
}

fn epoch_to_datetime(epoch: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(epoch, 0).single().unwrap_or_default()
}

/// Extension trait for rusqlite to support optional query results.
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error>;
}

impl<T> OptionalExt<T> for Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>, rusqlite::Error> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
