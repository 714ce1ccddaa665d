//! SQLite persistence for Docent.
//!
//! Implements the conversation store: conversations, their messages, and a
//! keyword-searchable passage table that backs the retrieval interface.

pub mod db;
pub mod migrations;
pub mod repository;
pub mod search;

pub use db::Database;
pub use repository::{ConversationRepository, MessageRepository};
pub use search::{PassageSearch, PassageStore};
