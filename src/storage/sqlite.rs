//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the BookmarkStore trait.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{AddOutcome, Bookmark, BookmarkStore, StorageError, StorageResult};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite bookmark backend
pub struct SqliteBookmarks {
    conn: Connection,
}

impl SqliteBookmarks {
    /// Opens (or creates) a bookmark database
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteBookmarks)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl BookmarkStore for SqliteBookmarks {
    fn add_bookmark(&mut self, title: &str, url: &str) -> StorageResult<AddOutcome> {
        let url = url.trim();
        if url.is_empty() {
            return Err(StorageError::InvalidBookmark("URL is empty".to_string()));
        }

        let title = match title.trim() {
            "" => url,
            t => t,
        };

        let now = Utc::now().to_rfc3339();
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO bookmarks (title, url, created_at) VALUES (?1, ?2, ?3)",
            params![title, url, now],
        )?;

        if inserted == 0 {
            tracing::debug!("Bookmark already exists: {}", url);
            Ok(AddOutcome::AlreadyExists)
        } else {
            tracing::debug!("Bookmark added: {}", url);
            Ok(AddOutcome::Created)
        }
    }

    fn list_bookmarks(&self) -> StorageResult<Vec<Bookmark>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, url, created_at FROM bookmarks ORDER BY id ASC",
        )?;

        let bookmarks = stmt
            .query_map([], |row| {
                Ok(Bookmark {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    url: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(bookmarks)
    }
}
