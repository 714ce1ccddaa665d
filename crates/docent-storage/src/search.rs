//! Keyword search over documentation passages using SQLite FTS5.
//!
//! Backs the retrieval interface consumed by the answer pipeline: a
//! `search(query, k)` that returns passages ranked best-first by BM25.
//! The passages table itself is populated by an external ingester; this
//! module only reads it (plus a small store type used by ingesters and
//! tests).

use std::sync::Arc;

use uuid::Uuid;

use docent_core::error::DocentError;
use docent_core::types::Passage;

use crate::db::Database;

/// Write-side access to the passages table.
pub struct PassageStore {
    db: Arc<Database>,
}

impl PassageStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert one passage. The FTS index is kept in sync by triggers, so a
    /// given passage contributes exactly one indexed row.
    pub fn insert(
        &self,
        source_label: &str,
        source_url: &str,
        content: &str,
    ) -> Result<Uuid, DocentError> {
        let id = Uuid::new_v4();
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO passages (id, source_label, source_url, content)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id.to_string(), source_label, source_url, content],
            )
            .map_err(|e| DocentError::Storage(format!("Failed to insert passage: {}", e)))?;
            Ok(())
        })?;
        Ok(id)
    }

    /// Count stored passages.
    pub fn count(&self) -> Result<u64, DocentError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM passages", [], |row| row.get(0))
                .map_err(|e| DocentError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }
}

/// Keyword search engine over the `passages_fts` virtual table.
pub struct PassageSearch {
    db: Arc<Database>,
}

impl PassageSearch {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Search passages with a free-text question.
    ///
    /// The question is sanitized into an OR-of-terms FTS5 query so user
    /// punctuation (question marks, quotes) cannot break MATCH syntax.
    /// Results come back best-first with a 1-based `similarity_rank`.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<Passage>, DocentError> {
        let fts_query = match build_match_query(query) {
            Some(q) => q,
            None => return Ok(Vec::new()),
        };

        self.db.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT p.content, p.source_label, p.source_url
                     FROM passages_fts
                     JOIN passages p ON p.rowid = passages_fts.rowid
                     WHERE passages_fts MATCH ?1
                     ORDER BY rank
                     LIMIT ?2",
                )
                .map_err(|e| DocentError::Storage(format!("FTS5 query prepare failed: {}", e)))?;

            let rows = stmt
                .query_map(rusqlite::params![fts_query, k as u64], |row| {
                    let content: String = row.get(0)?;
                    let source_label: String = row.get(1)?;
                    let source_url: String = row.get(2)?;
                    Ok((content, source_label, source_url))
                })
                .map_err(|e| DocentError::Storage(format!("FTS5 query failed: {}", e)))?;

            let mut passages = Vec::new();
            for row in rows {
                let (content, source_label, source_url) =
                    row.map_err(|e| DocentError::Storage(e.to_string()))?;
                passages.push(Passage {
                    content,
                    source_label,
                    source_url,
                    similarity_rank: passages.len() + 1,
                });
            }
            Ok(passages)
        })
    }
}

/// Turn a free-text question into an FTS5 MATCH expression.
///
/// Each alphanumeric term is double-quoted and the terms are OR-joined,
/// so any passage containing at least one term matches and BM25 ranks the
/// overlap. Returns `None` when the question has no searchable terms.
fn build_match_query(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| format!("\"{}\"", t))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}
