//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the breadth-first crawl loop:
//! - Loading or resuming the crawl state
//! - Fetching each queued URL and dispatching pages to the rewriter
//! - Enqueuing newly discovered same-domain links
//! - Periodic checkpoints, and the final cleanup on every exit path
//!
//! The loop is strictly sequential. One URL, including every asset it
//! references, is finished before the next one is dequeued.

use crate::config::Config;
use crate::crawler::{build_http_client, AssetFetcher, FetchResult, FetchedBody};
use crate::output::{write_bookmarks_page, CrawlStatistics};
use crate::paths::asset_path;
use crate::rewrite::{CrawlScope, PageRewriter};
use crate::state::{CrawlPhase, CrawlState, CrawlStateStore};
use crate::storage::open_bookmarks;
use crate::url::normalize_url;
use crate::MirrorError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;
use url::Url;

/// Result of a finished (or interrupted) crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// `Completed` or `Interrupted`
    pub phase: CrawlPhase,
    pub statistics: CrawlStatistics,
}

/// Owns the crawl state and guarantees it is persisted on every exit
///
/// [`SessionGuard::complete`] and [`SessionGuard::interrupt`] end the session
/// explicitly. If neither ran (an error was propagated or a panic unwound),
/// dropping the guard checkpoints the state so the next run resumes. The
/// bookmarks page is written on all three paths.
struct SessionGuard {
    store: CrawlStateStore,
    output_dir: PathBuf,
    state: CrawlState,
    armed: bool,
}

impl SessionGuard {
    fn new(store: CrawlStateStore, output_dir: PathBuf, state: CrawlState) -> Self {
        Self {
            store,
            output_dir,
            state,
            armed: true,
        }
    }

    /// Clean finish: nothing is left to resume
    fn complete(&mut self) {
        self.armed = false;
        self.store.clear();
        write_bookmarks(&self.output_dir);
    }

    /// Interrupted with work left: keep it for the next run
    fn interrupt(&mut self) {
        self.armed = false;
        self.store.checkpoint(&self.state);
        write_bookmarks(&self.output_dir);
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("Crawl stopped unexpectedly, saving state");
            self.store.checkpoint(&self.state);
            write_bookmarks(&self.output_dir);
        }
    }
}

fn write_bookmarks(output_dir: &Path) {
    if let Err(e) = write_bookmarks_page(output_dir) {
        tracing::error!("Failed to write bookmarks page: {}", e);
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    scope: CrawlScope,
    fetcher: AssetFetcher,
    session: SessionGuard,
    shutdown: Arc<AtomicBool>,
    abort: Arc<Notify>,
    phase: CrawlPhase,
    pages_saved: u64,
    links_discovered: u64,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The mirror configuration
    /// * `fresh` - Whether to discard a saved crawl state instead of resuming
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(MirrorError)` - Invalid start URL, unusable output directory,
    ///   or the HTTP client could not be built
    pub fn new(config: Config, fresh: bool) -> Result<Self, MirrorError> {
        let scope = CrawlScope::from_config(&config)?;
        std::fs::create_dir_all(&config.output_dir)?;

        let store = CrawlStateStore::new(&config.output_dir);
        if fresh {
            tracing::info!("Starting fresh crawl (ignoring previous state)");
            store.clear();
        }
        let state = store.load(&config.start_url, config.crawler.ignore_query);

        match open_bookmarks(&config.output_dir) {
            Ok(_) => tracing::debug!("Bookmark database ready"),
            Err(e) => tracing::warn!("Could not initialize bookmark database: {}", e),
        }

        let client = build_http_client(&config.crawler)?;
        let session = SessionGuard::new(store, config.output_dir.clone(), state);

        Ok(Self {
            scope,
            fetcher: AssetFetcher::new(client),
            session,
            shutdown: Arc::new(AtomicBool::new(false)),
            abort: Arc::new(Notify::new()),
            phase: CrawlPhase::Running,
            pages_saved: 0,
            links_discovered: 0,
            config,
        })
    }

    /// Flag that asks the loop to stop after the current URL
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Signal that abandons the URL in flight and stops at once
    ///
    /// The abandoned URL goes back to the front of the queue.
    pub fn abort_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.abort)
    }

    pub fn state(&self) -> &CrawlState {
        &self.session.state
    }

    /// Runs the crawl loop until the queue is empty or a shutdown is requested
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Phase `Completed` (state file removed) or
    ///   `Interrupted` (state file saved)
    /// * `Err(MirrorError)` - An unexpected fault; the state was saved
    pub async fn run(mut self) -> Result<CrawlReport, MirrorError> {
        tracing::info!(
            "Starting crawl of {} into {}",
            self.config.start_url,
            self.config.output_dir.display()
        );

        let checkpoint_interval = u64::from(self.config.crawler.checkpoint_interval.max(1));
        let mut dequeued: u64 = 0;
        let abort = Arc::clone(&self.abort);

        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                self.phase = self.phase.transition(CrawlPhase::Draining)?;
                break;
            }

            let Some(url) = self.session.state.pop_next() else {
                break;
            };

            let processed = tokio::select! {
                result = self.process_url(&url) => Some(result),
                _ = abort.notified() => None,
            };
            match processed {
                Some(Ok(())) => {}
                Some(Err(e)) => tracing::error!("Error processing {}: {}", url, e),
                None => {
                    tracing::warn!("Abandoned {}; it will be fetched first on resume", url);
                    self.session.state.requeue(&url);
                    self.phase = self.phase.transition(CrawlPhase::Draining)?;
                    break;
                }
            }

            dequeued += 1;
            if dequeued % checkpoint_interval == 0 {
                tracing::info!(
                    "Progress: {} URLs processed, {} visited, {} queued",
                    dequeued,
                    self.session.state.visited_len(),
                    self.session.state.queue_len()
                );
                self.session.store.checkpoint(&self.session.state);
            }
        }

        if self.phase == CrawlPhase::Draining {
            self.phase = self.phase.transition(CrawlPhase::Interrupted)?;
            tracing::warn!(
                "Crawl interrupted with {} URLs queued; run again to resume",
                self.session.state.queue_len()
            );
            self.session.interrupt();
        } else {
            self.phase = self.phase.transition(CrawlPhase::Completed)?;
            tracing::info!(
                "Crawl completed: {} URLs visited",
                self.session.state.visited_len()
            );
            self.session.complete();
        }

        Ok(CrawlReport {
            phase: self.phase,
            statistics: self.statistics(),
        })
    }

    /// Processes a single dequeued URL
    ///
    /// Fetch failures are logged by the fetcher and end processing of this
    /// URL; the URL is still marked visited so it is not retried this run.
    async fn process_url(&mut self, url: &str) -> Result<(), MirrorError> {
        let ignore_query = self.scope.ignore_query();
        let normalized = normalize_url(url, ignore_query);
        if self.session.state.is_visited(&normalized) {
            tracing::debug!("Already visited: {}", url);
            return Ok(());
        }

        let page_url = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Skipping unparsable URL {}: {}", url, e);
                self.session.state.mark_visited(normalized);
                return Ok(());
            }
        };

        tracing::info!("Crawling: {}", url);
        let body = match self.fetcher.fetch_page(url).await {
            FetchResult::Success(body) => body,
            FetchResult::NotFound | FetchResult::HttpError { .. } | FetchResult::NetworkError { .. } => {
                self.session.state.mark_visited(normalized);
                return Ok(());
            }
        };

        if !body.is_html() {
            self.session.state.mark_visited(normalized);
            return self.save_non_html(&page_url, body).await;
        }

        let final_normalized = normalize_url(&body.final_url, ignore_query);
        self.session.state.mark_visited(normalized.clone());
        if final_normalized != normalized {
            self.session.state.mark_visited(final_normalized);
        }

        let rewriter = PageRewriter::new(&self.fetcher, &self.scope);
        let links = rewriter
            .process(&body.text(), &page_url, &self.session.state)
            .await?;
        self.pages_saved += 1;

        let mut added = 0;
        for link in &links {
            if self.session.state.enqueue(link) {
                added += 1;
            }
        }
        self.links_discovered += added;
        tracing::debug!("{} new links queued from {}", added, url);

        Ok(())
    }

    /// Stores a non-HTML response at its asset path
    ///
    /// An existing file is left as is, matching the asset cache.
    async fn save_non_html(&self, url: &Url, body: FetchedBody) -> Result<(), MirrorError> {
        tracing::info!("Saving non-HTML content at {} ({})", url, body.content_type);
        let local_path = asset_path(url, self.scope.output_root());
        if tokio::fs::try_exists(&local_path).await? {
            tracing::debug!("Already on disk: {}", local_path.display());
            return Ok(());
        }

        self.fetcher.store_body(body, &local_path).await;
        Ok(())
    }

    fn statistics(&self) -> CrawlStatistics {
        let counts = self.fetcher.counts();
        CrawlStatistics {
            pages_saved: self.pages_saved,
            assets_fetched: counts.fetched,
            assets_cached: counts.cached,
            not_found: counts.not_found,
            failures: counts.failures,
            links_discovered: self.links_discovered,
            remaining_in_queue: self.session.state.queue_len() as u64,
        }
    }
}

/// Runs the main crawl operation
///
/// Installs a Ctrl-C listener. The first Ctrl-C lets the current URL finish,
/// a second one abandons it; either way the state is saved and the crawl
/// stops. A second run with the same start URL and output directory resumes
/// from there.
///
/// # Arguments
///
/// * `config` - The mirror configuration
/// * `fresh` - Discard any saved state before starting
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed or was interrupted cleanly
/// * `Err(MirrorError)` - Crawl could not start or failed unexpectedly
///
/// # Example
///
/// ```no_run
/// use offline_mirror::config::{Config, CrawlerConfig};
/// use offline_mirror::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::new("https://example.com/", "mirror", CrawlerConfig::default())?;
/// let report = run_crawl(config, false).await?;
/// println!("{:?}", report.phase);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, fresh: bool) -> Result<CrawlReport, MirrorError> {
    let coordinator = Coordinator::new(config, fresh)?;

    let shutdown = coordinator.shutdown_handle();
    let abort = coordinator.abort_handle();
    let listener = tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if !shutdown.swap(true, Ordering::SeqCst) {
                tracing::warn!(
                    "Interrupt received, finishing current URL and saving state (Ctrl-C again to stop now)"
                );
            } else {
                tracing::warn!("Second interrupt, abandoning current URL");
                abort.notify_one();
                break;
            }
        }
    });

    let result = coordinator.run().await;
    listener.abort();
    result
}
