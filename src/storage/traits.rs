//! Storage traits and error types
//!
//! The bookmark store is behind a trait so the CLI and tests do not depend on
//! SQLite directly.

use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid bookmark: {0}")]
    InvalidBookmark(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A saved bookmark
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bookmark {
    pub id: i64,
    pub title: String,
    pub url: String,
    /// RFC 3339 timestamp
    pub created_at: String,
}

/// Result of adding a bookmark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new row was inserted
    Created,

    /// A bookmark with the same URL already existed; nothing changed
    AlreadyExists,
}

/// Trait for bookmark storage backends
pub trait BookmarkStore {
    /// Adds a bookmark
    ///
    /// # Arguments
    ///
    /// * `title` - Display title; blank titles fall back to the URL
    /// * `url` - Bookmarked location, unique per store
    ///
    /// # Returns
    ///
    /// * `Ok(AddOutcome)` - Whether a row was created
    /// * `Err(StorageError)` - The URL was blank or the database failed
    fn add_bookmark(&mut self, title: &str, url: &str) -> StorageResult<AddOutcome>;

    /// Lists all bookmarks in insertion order
    fn list_bookmarks(&self) -> StorageResult<Vec<Bookmark>>;
}
