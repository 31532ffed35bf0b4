//! Crawler module for fetching and mirroring a site
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and the on-disk asset cache
//! - The breadth-first crawl loop with checkpointing and resume

mod coordinator;
mod fetcher;

pub use coordinator::{run_crawl, Coordinator, CrawlReport};
pub use fetcher::{
    build_http_client, fetch_url, save_file, AssetFetcher, FetchCounts, FetchOutcome, FetchResult,
    FetchedBody,
};
