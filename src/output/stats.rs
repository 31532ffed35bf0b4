//! Crawl statistics
//!
//! Counters are collected while the crawl runs and printed once at the end.

/// Crawl statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// HTML pages rewritten and written to disk
    pub pages_saved: u64,

    /// Assets downloaded during this run
    pub assets_fetched: u64,

    /// Assets skipped because a local copy already existed
    pub assets_cached: u64,

    /// Requests answered with 404
    pub not_found: u64,

    /// Network and filesystem failures
    pub failures: u64,

    /// Same-domain links newly added to the queue
    pub links_discovered: u64,

    /// URLs still queued when the crawl stopped
    pub remaining_in_queue: u64,
}

impl CrawlStatistics {
    /// Total number of fetch attempts that ended without a usable body
    pub fn unsuccessful(&self) -> u64 {
        self.not_found + self.failures
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages saved: {}", stats.pages_saved);
    println!("  Assets downloaded: {}", stats.assets_fetched);
    println!("  Assets already on disk: {}", stats.assets_cached);
    println!("  Links discovered: {}", stats.links_discovered);
    println!();

    if stats.unsuccessful() > 0 {
        println!("Errors:");
        println!("  Not found (404): {}", stats.not_found);
        println!("  Failures: {}", stats.failures);
        println!();
    }

    if stats.remaining_in_queue > 0 {
        println!(
            "Interrupted with {} URLs still queued; run again to resume.",
            stats.remaining_in_queue
        );
    } else {
        println!("Crawl complete.");
    }
}
