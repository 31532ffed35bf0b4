//! Output module for files and reports that are not mirrored content
//!
//! This module handles:
//! - The bookmark script injected into pages and the `_bookmarks.html` page
//! - Crawl statistics printed at the end of a run

pub mod bookmarks;
pub mod stats;

pub use bookmarks::{write_bookmarks_page, BOOKMARKS_PAGE_FILE, BOOKMARK_SCRIPT};
pub use stats::{print_statistics, CrawlStatistics};
