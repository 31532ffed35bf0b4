use crate::config::validation::{validate, validate_start_url};
use crate::MirrorError;
use serde::Deserialize;
use std::path::PathBuf;

/// User agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Complete configuration for one mirror run
#[derive(Debug, Clone)]
pub struct Config {
    /// The URL the crawl starts from; its host defines the crawl scope
    pub start_url: String,

    /// Root directory of the mirror
    pub output_dir: PathBuf,

    pub crawler: CrawlerConfig,
}

impl Config {
    /// Builds and validates a configuration
    ///
    /// Fails with [`MirrorError::InvalidInput`] when the start URL has no
    /// resolvable host, before anything touches the network or disk.
    pub fn new(
        start_url: impl Into<String>,
        output_dir: impl Into<PathBuf>,
        crawler: CrawlerConfig,
    ) -> Result<Self, MirrorError> {
        let start_url = start_url.into();
        validate_start_url(&start_url).map_err(|e| MirrorError::InvalidInput(e.to_string()))?;
        validate(&crawler)?;

        Ok(Self {
            start_url,
            output_dir: output_dir.into(),
            crawler,
        })
    }
}

/// File wrapper: the TOML document holds a single `[crawler]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ConfigFile {
    #[serde(default)]
    pub crawler: CrawlerConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Network timeout per request (seconds)
    pub timeout: u64,

    /// Strip query strings before deduplicating URLs
    #[serde(rename = "ignore-query")]
    pub ignore_query: bool,

    /// Number of dequeued URLs between state checkpoints
    #[serde(rename = "checkpoint-interval")]
    pub checkpoint_interval: u32,

    /// User-Agent header for every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Rewrite references to local paths even when their download failed
    #[serde(rename = "rewrite-failed-references")]
    pub rewrite_failed_references: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            timeout: 15,
            ignore_query: false,
            checkpoint_interval: 20,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            rewrite_failed_references: false,
        }
    }
}
