//! Database schema migrations.
//!
//! Applies the initial schema: conversations, messages, the passages table
//! with its FTS5 index, and the schema_migrations tracking table.

use rusqlite::Connection;
use tracing::info;

use docent_core::error::DocentError;

/// Run all pending database migrations.
///
/// Currently implements the initial schema (version 1). Future migrations
/// can be added by checking the current version and applying incremental
/// changes.
pub fn run_migrations(conn: &Connection) -> Result<(), DocentError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| DocentError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| DocentError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), DocentError> {
    conn.execute_batch(
        "
        -- Conversations: one row per chat thread. Created lazily, so no
        -- empty conversations exist.
        CREATE TABLE IF NOT EXISTS conversations (
            id          TEXT PRIMARY KEY NOT NULL,
            owner_id    TEXT NOT NULL,
            title       TEXT NOT NULL DEFAULT 'New Chat',
            created_at  INTEGER NOT NULL,
            updated_at  INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_conversations_owner
            ON conversations (owner_id, updated_at DESC);

        -- Messages: immutable once written, ordered by created_at within
        -- a conversation (rowid breaks same-second ties).
        CREATE TABLE IF NOT EXISTS messages (
            id               TEXT PRIMARY KEY NOT NULL,
            conversation_id  TEXT NOT NULL,
            role             TEXT NOT NULL
                             CHECK (role IN ('user', 'assistant')),
            content          TEXT NOT NULL,
            created_at       INTEGER NOT NULL,
            FOREIGN KEY (conversation_id) REFERENCES conversations(id)
                ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_messages_conversation
            ON messages (conversation_id, created_at ASC);

        -- Documentation passages, populated by an external ingester.
        CREATE TABLE IF NOT EXISTS passages (
            id            TEXT PRIMARY KEY NOT NULL,
            source_label  TEXT NOT NULL,
            source_url    TEXT NOT NULL DEFAULT '',
            content       TEXT NOT NULL,
            created_at    INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );

        CREATE VIRTUAL TABLE IF NOT EXISTS passages_fts USING fts5(
            content,
            content='passages',
            content_rowid='rowid'
        );

        CREATE TRIGGER IF NOT EXISTS passages_fts_insert
        AFTER INSERT ON passages BEGIN
            INSERT INTO passages_fts (rowid, content)
            VALUES (new.rowid, new.content);
        END;

        CREATE TRIGGER IF NOT EXISTS passages_fts_delete
        AFTER DELETE ON passages BEGIN
            INSERT INTO passages_fts (passages_fts, rowid, content)
            VALUES ('delete', old.rowid, old.content);
        END;

        -- Record migration.
        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| DocentError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        conn
    }

    #[test]
    fn test_migrations_run_once() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        // Running again should be idempotent.
        run_migrations(&conn).unwrap();

        let version: i64 = conn
            .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(version, 1);
    }

    #[test]
    fn test_tables_exist() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        for table in ["conversations", "messages", "passages"] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "missing table {}", table);
        }
    }

    #[test]
    fn test_role_check_constraint() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO conversations (id, owner_id, title, created_at, updated_at)
             VALUES ('c1', 'u1', 'New Chat', 0, 0)",
            [],
        )
        .unwrap();

        let bad = conn.execute(
            "INSERT INTO messages (id, conversation_id, role, content, created_at)
             VALUES ('m1', 'c1', 'system', 'hi', 0)",
            [],
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_delete_conversation_cascades_messages() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO conversations (id, owner_id, title, created_at, updated_at)
             VALUES ('c1', 'u1', 'New Chat', 0, 0)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO messages (id, conversation_id, role, content, created_at)
             VALUES ('m1', 'c1', 'user', 'hi', 0)",
            [],
        )
        .unwrap();

        conn.execute("DELETE FROM conversations WHERE id = 'c1'", [])
            .unwrap();

        let left: i64 = conn
            .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
            .unwrap();
        assert_eq!(left, 0);
    }

    #[test]
    fn test_passages_fts_trigger_sync() {
        let conn = open_test_conn();
        run_migrations(&conn).unwrap();

        conn.execute(
            "INSERT INTO passages (id, source_label, content) VALUES ('p1', 'docs', 'retrieval augmented generation')",
            [],
        )
        .unwrap();

        let hits: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM passages_fts WHERE passages_fts MATCH 'retrieval'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(hits, 1);

        conn.execute("DELETE FROM passages WHERE id = 'p1'", [])
            .unwrap();
        let hits: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM passages_fts WHERE passages_fts MATCH 'retrieval'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(hits, 0);
    }
}
