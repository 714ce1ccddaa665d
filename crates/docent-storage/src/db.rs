//! SQLite connection handle shared by the repositories.
//!
//! A single connection behind a mutex is enough for the answer pipeline:
//! turns are written one message at a time, and the only concurrent
//! traffic is FTS reads from retrieval.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;
use tracing::info;

use docent_core::error::DocentError;

use crate::migrations;

/// Owning handle for the conversation store's SQLite file.
///
/// rusqlite's `Connection` is not Sync, so all access funnels through
/// [`Database::with_conn`], which locks for the duration of the closure.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) the database at `path` and bring its schema up
    /// to date.
    ///
    /// Foreign keys must stay on for the lifetime of the connection:
    /// message rows cascade when their conversation is deleted.
    pub fn new(path: &Path) -> Result<Self, DocentError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| DocentError::Storage(format!("Failed to open database: {}", e)))?;
        let db = Self::from_connection(conn)?;

        info!("Database opened at {}", path.display());
        Ok(db)
    }

    /// In-memory database for tests. Same pragmas, same migrations.
    pub fn in_memory() -> Result<Self, DocentError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DocentError::Storage(format!("Failed to open in-memory db: {}", e)))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, DocentError> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;",
        )
        .map_err(|e| DocentError::Storage(format!("Failed to set pragmas: {}", e)))?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.with_conn(migrations::run_migrations)?;
        Ok(db)
    }

    /// Run a closure against the connection, holding the lock until it
    /// returns.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DocentError>
    where
        F: FnOnce(&Connection) -> Result<T, DocentError>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| DocentError::Storage(format!("Database lock poisoned: {}", e)))?;
        f(&conn)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_database() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM conversations", [], |row| row.get(0))
                .map_err(|e| DocentError::Storage(e.to_string()))?;
            assert_eq!(count, 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docent.db");
        let db = Database::new(&path).unwrap();

        db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM messages", [], |row| row.get(0))
                .map_err(|e| DocentError::Storage(e.to_string()))?;
            assert_eq!(count, 0);
            Ok(())
        })
        .unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_nested_data_dir_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("docent.db");
        Database::new(&path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_foreign_keys_enabled() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let enabled: i64 = conn
                .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
                .map_err(|e| DocentError::Storage(e.to_string()))?;
            assert_eq!(enabled, 1);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn test_wal_mode_enabled() {
        let db = Database::in_memory().unwrap();
        db.with_conn(|conn| {
            let mode: String = conn
                .query_row("PRAGMA journal_mode", [], |row| row.get(0))
                .map_err(|e| DocentError::Storage(e.to_string()))?;
            // In-memory databases may report "memory" instead of "wal".
            assert!(
                mode == "wal" || mode == "memory",
                "Expected wal or memory, got: {}",
                mode
            );
            Ok(())
        })
        .unwrap();
    }
}
