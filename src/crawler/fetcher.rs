//! HTTP fetcher implementation
//!
//! This module handles all network and file writes for the crawler:
//! - Building the HTTP client with the configured user agent and timeout
//! - GET requests for pages, classified into a `FetchResult`
//! - Cached asset downloads, where file presence on disk is the cache
//!
//! No request is retried. A failed download leaves no file behind, so the
//! next run naturally tries again.

use crate::config::CrawlerConfig;
use encoding_rs::{Encoding, UTF_8};
use regex::bytes::Regex;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::borrow::Cow;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Duration;
use url::Url;

/// Maximum number of redirects followed for one request
const MAX_REDIRECTS: usize = 10;

/// How far into an HTML document a `<meta charset>` is looked for
const META_SNIFF_LIMIT: usize = 1024;

fn meta_charset_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"(?i-u)<meta[^>]+charset\s*=\s*["']?([a-z0-9_:.\-]+)"#)
            .expect("meta charset pattern is valid")
    })
}

/// Extracts the `charset` parameter of a Content-Type value
fn charset_param(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|part| {
        let (name, value) = part.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(|c| c == '"' || c == '\''))
    })
}

/// A successfully received response body
#[derive(Debug, Clone)]
pub struct FetchedBody {
    /// Final URL after redirects
    pub final_url: String,
    /// Content-Type header value (empty when absent)
    pub content_type: String,
    /// Raw response bytes
    pub body: Vec<u8>,
}

impl FetchedBody {
    /// Returns true if the Content-Type announces an HTML document
    pub fn is_html(&self) -> bool {
        self.content_type
            .trim_start()
            .to_ascii_lowercase()
            .starts_with("text/html")
    }

    /// Character encoding of the body
    ///
    /// The Content-Type charset wins; HTML without one falls back to a
    /// `<meta charset>` near the top of the document, everything else to UTF-8.
    pub fn encoding(&self) -> &'static Encoding {
        let declared = charset_param(&self.content_type).map(str::as_bytes).or_else(|| {
            if !self.is_html() {
                return None;
            }
            let head = &self.body[..self.body.len().min(META_SNIFF_LIMIT)];
            meta_charset_pattern()
                .captures(head)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_bytes())
        });

        declared
            .and_then(Encoding::for_label)
            .unwrap_or(UTF_8)
    }

    /// Decodes the body with its declared encoding
    ///
    /// A byte order mark overrides the declaration. Unmappable bytes become
    /// U+FFFD.
    pub fn text(&self) -> Cow<'_, str> {
        let (text, actual, had_errors) = self.encoding().decode(&self.body);
        if had_errors {
            tracing::debug!("Malformed {} in body of {}", actual.name(), self.final_url);
        }
        text
    }
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the URL
    Success(FetchedBody),

    /// The server answered 404
    NotFound,

    /// Any other non-success status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

/// Outcome of a cached asset download
#[derive(Debug)]
pub enum FetchOutcome {
    /// A file was already present at the local path; no request was made
    Exists,

    /// The body was downloaded and written to the local path
    Fetched(FetchedBody),

    /// The server answered 404
    NotFound,

    /// Network, HTTP or filesystem failure
    Failed(String),
}

impl FetchOutcome {
    /// Returns true if a local copy is available after this outcome
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Exists | Self::Fetched(_))
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use offline_mirror::config::CrawlerConfig;
/// use offline_mirror::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the response
///
/// | Condition | Result |
/// |-----------|--------|
/// | HTTP 2xx | `Success` |
/// | HTTP 404 | `NotFound` |
/// | Other status | `HttpError` |
/// | Timeout, DNS, connection, body read | `NetworkError` |
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
pub async fn fetch_url(client: &Client, url: &str) -> FetchResult {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return classify_network_error(&e),
    };

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return FetchResult::NotFound;
    }

    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    match response.bytes().await {
        Ok(body) => FetchResult::Success(FetchedBody {
            final_url,
            content_type,
            body: body.to_vec(),
        }),
        Err(e) => classify_network_error(&e),
    }
}

fn classify_network_error(e: &reqwest::Error) -> FetchResult {
    let error = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else if e.is_redirect() {
        "Too many redirects".to_string()
    } else {
        e.to_string()
    };
    FetchResult::NetworkError { error }
}

/// Writes bytes to `path`, creating parent directories as needed
pub async fn save_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}

/// Counters kept by the asset fetcher
#[derive(Debug, Default)]
struct FetchCounters {
    fetched: AtomicU64,
    cached: AtomicU64,
    not_found: AtomicU64,
    failures: AtomicU64,
}

/// Snapshot of the fetcher's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchCounts {
    pub fetched: u64,
    pub cached: u64,
    pub not_found: u64,
    pub failures: u64,
}

/// Downloads single URLs to local paths, skipping ones already on disk
///
/// File presence is the only cache: nothing else records which assets have
/// been downloaded.
#[derive(Debug)]
pub struct AssetFetcher {
    client: Client,
    counters: FetchCounters,
}

impl AssetFetcher {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            counters: FetchCounters::default(),
        }
    }

    /// Fetches `url` into `local_path` unless that file already exists
    ///
    /// # Returns
    ///
    /// * `Exists` - The file was already present; no request was made
    /// * `Fetched` - The body was downloaded and written verbatim
    /// * `NotFound` - 404, logged at info level only
    /// * `Failed` - Any other HTTP, network or write failure
    pub async fn fetch(&self, url: &Url, local_path: &Path) -> FetchOutcome {
        if tokio::fs::try_exists(local_path).await.unwrap_or(false) {
            tracing::debug!("Already on disk: {}", local_path.display());
            self.counters.cached.fetch_add(1, Ordering::Relaxed);
            return FetchOutcome::Exists;
        }

        match self.fetch_page(url.as_str()).await {
            FetchResult::Success(body) => self.store_body(body, local_path).await,
            FetchResult::NotFound => FetchOutcome::NotFound,
            FetchResult::HttpError { status_code } => {
                FetchOutcome::Failed(format!("HTTP status {}", status_code))
            }
            FetchResult::NetworkError { error } => FetchOutcome::Failed(error),
        }
    }

    /// Issues a GET for `url` and logs/counts non-success results
    ///
    /// Unlike [`AssetFetcher::fetch`] this never consults the disk; the crawl
    /// loop uses it for pages, which are rewritten on every visit.
    pub async fn fetch_page(&self, url: &str) -> FetchResult {
        let result = fetch_url(&self.client, url).await;
        match &result {
            FetchResult::Success(_) => {}
            FetchResult::NotFound => {
                tracing::info!("Not found (404), skipping: {}", url);
                self.counters.not_found.fetch_add(1, Ordering::Relaxed);
            }
            FetchResult::HttpError { status_code } => {
                tracing::warn!("HTTP status {} for {}", status_code, url);
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
            }
            FetchResult::NetworkError { error } => {
                tracing::warn!("Failed to fetch {}: {}", url, error);
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
            }
        }
        result
    }

    /// Writes an already received body to `local_path`
    pub async fn store_body(&self, body: FetchedBody, local_path: &Path) -> FetchOutcome {
        match save_file(local_path, &body.body).await {
            Ok(()) => {
                tracing::info!("Downloaded: {} -> {}", body.final_url, local_path.display());
                self.counters.fetched.fetch_add(1, Ordering::Relaxed);
                FetchOutcome::Fetched(body)
            }
            Err(e) => {
                tracing::error!("Failed to write {}: {}", local_path.display(), e);
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                FetchOutcome::Failed(e.to_string())
            }
        }
    }

    /// Returns the counters accumulated so far
    pub fn counts(&self) -> FetchCounts {
        FetchCounts {
            fetched: self.counters.fetched.load(Ordering::Relaxed),
            cached: self.counters.cached.load(Ordering::Relaxed),
            not_found: self.counters.not_found.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }
}
