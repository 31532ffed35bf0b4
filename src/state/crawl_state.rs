//! Resumable crawl state
//!
//! The visited set holds normalized URLs; the queue holds URLs exactly as
//! they were discovered. A mirror of the queue in normalized form answers
//! "already queued?" without scanning it.

use crate::url::normalize_url;
use crate::MirrorError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::path::{Path, PathBuf};

/// Name of the state file inside the output directory
pub const STATE_FILE: &str = "crawl_state.json";

/// On-disk representation of the state file
#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    start_url: String,
    #[serde(default)]
    visited: Vec<String>,
    #[serde(default)]
    queue: Vec<String>,
}

/// Visited set and pending queue of one crawl
#[derive(Debug, Clone)]
pub struct CrawlState {
    start_url: String,
    ignore_query: bool,
    visited: BTreeSet<String>,
    queue: VecDeque<String>,
    /// Normalized forms of everything in `queue`
    pending: HashSet<String>,
}

impl CrawlState {
    /// Creates a fresh state seeded with the start URL
    pub fn fresh(start_url: &str, ignore_query: bool) -> Self {
        let mut state = Self::restored(start_url, ignore_query, Vec::new(), Vec::new());
        state.enqueue(start_url);
        state
    }

    /// Rebuilds a state from persisted parts
    fn restored(
        start_url: &str,
        ignore_query: bool,
        visited: Vec<String>,
        queue: Vec<String>,
    ) -> Self {
        let pending = queue
            .iter()
            .map(|url| normalize_url(url, ignore_query))
            .collect();

        Self {
            start_url: start_url.to_string(),
            ignore_query,
            visited: visited.into_iter().collect(),
            queue: queue.into_iter().collect(),
            pending,
        }
    }

    pub fn start_url(&self) -> &str {
        &self.start_url
    }

    /// Returns true if the normalized URL has already been processed
    pub fn is_visited(&self, normalized: &str) -> bool {
        self.visited.contains(normalized)
    }

    /// Returns true if the normalized URL is visited or waiting in the queue
    pub fn is_known(&self, normalized: &str) -> bool {
        self.visited.contains(normalized) || self.pending.contains(normalized)
    }

    /// Records a normalized URL as processed
    pub fn mark_visited(&mut self, normalized: String) {
        self.visited.insert(normalized);
    }

    /// Appends a URL to the queue unless its normalized form is already known
    ///
    /// # Returns
    ///
    /// * `true` - The URL was queued
    /// * `false` - It was visited or already pending
    pub fn enqueue(&mut self, url: &str) -> bool {
        let normalized = normalize_url(url, self.ignore_query);
        if self.is_known(&normalized) {
            return false;
        }

        self.pending.insert(normalized);
        self.queue.push_back(url.to_string());
        true
    }

    /// Puts an abandoned URL back at the front of the queue
    ///
    /// It is dropped from the visited set, so the next run fetches it again.
    pub fn requeue(&mut self, url: &str) {
        let normalized = normalize_url(url, self.ignore_query);
        self.visited.remove(&normalized);
        if self.pending.insert(normalized) {
            self.queue.push_front(url.to_string());
        }
    }

    /// Removes and returns the next URL to fetch
    pub fn pop_next(&mut self) -> Option<String> {
        let url = self.queue.pop_front()?;
        self.pending.remove(&normalize_url(&url, self.ignore_query));
        Some(url)
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    fn to_file(&self) -> StateFile {
        StateFile {
            start_url: self.start_url.clone(),
            visited: self.visited.iter().cloned().collect(),
            queue: self.queue.iter().cloned().collect(),
        }
    }
}

/// Persists and restores crawl state in `<output>/crawl_state.json`
#[derive(Debug, Clone)]
pub struct CrawlStateStore {
    path: PathBuf,
}

impl CrawlStateStore {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            path: output_dir.join(STATE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Loads the saved state for `start_url`, or a fresh one
    ///
    /// A state file recorded for a different start URL is ignored. Read and
    /// parse failures fall back to a fresh crawl with a warning; they are
    /// never fatal.
    pub fn load(&self, start_url: &str, ignore_query: bool) -> CrawlState {
        if !self.path.exists() {
            return CrawlState::fresh(start_url, ignore_query);
        }

        match self.read() {
            Ok(file) if file.start_url == start_url => {
                tracing::info!(
                    "Resuming previous crawl session ({} visited, {} queued)",
                    file.visited.len(),
                    file.queue.len()
                );
                CrawlState::restored(start_url, ignore_query, file.visited, file.queue)
            }
            Ok(file) => {
                tracing::warn!(
                    "State file belongs to a different start URL ({}); starting fresh",
                    file.start_url
                );
                CrawlState::fresh(start_url, ignore_query)
            }
            Err(e) => {
                tracing::warn!("Could not load state file {}: {}", self.path.display(), e);
                CrawlState::fresh(start_url, ignore_query)
            }
        }
    }

    fn read(&self) -> Result<StateFile, MirrorError> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Writes the whole state file
    ///
    /// The content goes to a sibling temporary file first and is renamed into
    /// place, so a reader never sees a half-written state.
    pub fn save(&self, state: &CrawlState) -> Result<(), MirrorError> {
        let content = serde_json::to_string_pretty(&state.to_file())?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Saves the state, logging instead of failing
    pub fn checkpoint(&self, state: &CrawlState) {
        match self.save(state) {
            Ok(()) => tracing::info!(
                "Crawl state saved ({} visited, {} queued)",
                state.visited_len(),
                state.queue_len()
            ),
            Err(e) => tracing::warn!("Failed to write state file {}: {}", self.path.display(), e),
        }
    }

    /// Deletes the state file if present
    pub fn clear(&self) {
        if !self.path.exists() {
            return;
        }

        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::info!("Removed state file: {}", self.path.display()),
            Err(e) => tracing::error!(
                "Could not remove state file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
