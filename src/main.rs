//! Offline Mirror main entry point
//!
//! This is the command-line interface for mirroring a website into a
//! locally browsable directory.

use anyhow::Context;
use clap::{Parser, Subcommand};
use offline_mirror::config::{load_crawler_config, Config, CrawlerConfig};
use offline_mirror::crawler::run_crawl;
use offline_mirror::output::print_statistics;
use offline_mirror::storage::{open_bookmarks, AddOutcome, BookmarkStore};
use offline_mirror::CrawlPhase;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Offline Mirror: a resumable same-domain website mirror
///
/// Fetches every page and asset reachable from a start URL on the same
/// domain and rewrites links so the copy can be browsed offline.
#[derive(Parser, Debug)]
#[command(name = "offline-mirror")]
#[command(version)]
#[command(about = "Mirror a website for offline browsing", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a site into an output directory, resuming a saved crawl if present
    ///
    /// Ctrl-C stops after the current URL and saves the crawl state; a second
    /// Ctrl-C abandons the current URL and stops immediately.
    Crawl {
        /// URL the crawl starts from; its host defines the crawl scope
        #[arg(value_name = "START_URL")]
        start_url: String,

        /// Directory the mirror is written to
        #[arg(value_name = "OUTPUT_PATH")]
        output_path: PathBuf,

        /// Ignore query strings when deduplicating URLs
        #[arg(long)]
        ignore_query: bool,

        /// Network timeout per request, in seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Path to a TOML configuration file with a [crawler] table
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Start a fresh crawl, discarding any saved state
        #[arg(long)]
        fresh: bool,
    },

    /// Inspect or edit the bookmarks of a mirror
    Bookmarks {
        /// Directory of the mirror
        #[arg(value_name = "OUTPUT_PATH")]
        output_path: PathBuf,

        #[command(subcommand)]
        action: BookmarkAction,
    },
}

#[derive(Subcommand, Debug)]
enum BookmarkAction {
    /// List saved bookmarks
    List,

    /// Add a bookmark
    Add {
        #[arg(long)]
        title: String,

        #[arg(long)]
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Crawl {
            start_url,
            output_path,
            ignore_query,
            timeout,
            config,
            fresh,
        } => {
            let mut crawler = match config {
                Some(path) => {
                    tracing::info!("Loading configuration from: {}", path.display());
                    load_crawler_config(&path)
                        .with_context(|| format!("Failed to load {}", path.display()))?
                }
                None => CrawlerConfig::default(),
            };

            // Command-line flags take precedence over the file
            if ignore_query {
                crawler.ignore_query = true;
            }
            if let Some(secs) = timeout {
                crawler.timeout = secs;
            }

            let config = Config::new(start_url, output_path, crawler)
                .context("Invalid crawl configuration")?;
            handle_crawl(config, fresh).await
        }
        Command::Bookmarks {
            output_path,
            action,
        } => handle_bookmarks(&output_path, action),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("offline_mirror=info,warn"),
            1 => EnvFilter::new("offline_mirror=debug,info"),
            2 => EnvFilter::new("offline_mirror=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the crawl subcommand
async fn handle_crawl(config: Config, fresh: bool) -> anyhow::Result<()> {
    tracing::info!(
        "Mirroring {} (timeout {}s, ignore query: {})",
        config.start_url,
        config.crawler.timeout,
        config.crawler.ignore_query
    );

    let report = run_crawl(config, fresh).await.context("Crawl failed")?;

    print_statistics(&report.statistics);
    if report.phase == CrawlPhase::Interrupted {
        tracing::info!("Crawl state saved; run the same command again to resume");
    }

    Ok(())
}

/// Handles the bookmarks subcommand
fn handle_bookmarks(output_path: &std::path::Path, action: BookmarkAction) -> anyhow::Result<()> {
    let mut store = open_bookmarks(output_path)
        .with_context(|| format!("Failed to open bookmarks in {}", output_path.display()))?;

    match action {
        BookmarkAction::List => {
            let bookmarks = store.list_bookmarks()?;
            if bookmarks.is_empty() {
                println!("No bookmarks yet.");
            }
            for bookmark in bookmarks {
                println!("{}\t{}\t{}", bookmark.created_at, bookmark.title, bookmark.url);
            }
        }
        BookmarkAction::Add { title, url } => match store.add_bookmark(&title, &url)? {
            AddOutcome::Created => println!("Bookmark added: {}", url),
            AddOutcome::AlreadyExists => println!("Bookmark already exists: {}", url),
        },
    }

    Ok(())
}
