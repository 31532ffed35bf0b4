//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: the visited set and pending queue of one crawl
//! - `CrawlStateStore`: persists and restores `CrawlState` so a crawl can resume
//! - `CrawlPhase`: the driver's run state machine

mod crawl_state;
mod phase;

// Re-export main types
pub use crawl_state::{CrawlState, CrawlStateStore, STATE_FILE};
pub use phase::CrawlPhase;
