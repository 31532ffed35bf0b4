//! Bookmark persistence
//!
//! Bookmarks live in a small SQLite database next to the mirrored files,
//! `<output>/bookmarks.db`.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteBookmarks;
pub use traits::{AddOutcome, Bookmark, BookmarkStore, StorageError, StorageResult};

use std::path::{Path, PathBuf};

/// File name of the bookmark database inside the output directory
pub const BOOKMARKS_DB: &str = "bookmarks.db";

/// Returns the bookmark database path for an output directory
pub fn bookmarks_db_path(output_dir: &Path) -> PathBuf {
    output_dir.join(BOOKMARKS_DB)
}

/// Opens the bookmark database of an output directory
///
/// # Arguments
///
/// * `output_dir` - Root directory of the mirror
///
/// # Returns
///
/// * `Ok(SqliteBookmarks)` - Successfully opened storage
/// * `Err(StorageError)` - Failed to open the database
pub fn open_bookmarks(output_dir: &Path) -> StorageResult<SqliteBookmarks> {
    SqliteBookmarks::open(&bookmarks_db_path(output_dir))
}
