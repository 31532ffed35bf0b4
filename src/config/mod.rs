//! Configuration module for the mirror
//!
//! Settings come from three layers: built-in defaults, an optional TOML file
//! with a `[crawler]` table, and command-line flags.
//!
//! # Example
//!
//! ```no_run
//! use offline_mirror::config::{load_crawler_config, Config};
//! use std::path::Path;
//!
//! let crawler = load_crawler_config(Path::new("mirror.toml")).unwrap();
//! let config = Config::new("https://example.com/", "./mirror", crawler).unwrap();
//! println!("Timeout: {}s", config.crawler.timeout);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, DEFAULT_USER_AGENT};

// Re-export parser functions
pub use parser::{load_crawler_config, parse_crawler_config};
pub use validation::{validate, validate_start_url};
