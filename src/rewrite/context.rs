//! Values threaded through the rewriters
//!
//! [`CrawlScope`] is fixed for a whole crawl. [`RewriteContext`] describes the
//! one document currently being rewritten: the URL its references resolve
//! against and the directory its relative paths start from.

use crate::config::Config;
use crate::crawler::FetchOutcome;
use crate::paths::{document_dir, page_path, relative_link};
use crate::url::{extract_domain, resolve_in_scope};
use crate::MirrorError;
use std::path::{Path, PathBuf};
use url::Url;

/// Crawl-wide rewriting settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlScope {
    domain: String,
    output_root: PathBuf,
    ignore_query: bool,
    rewrite_failed_references: bool,
}

impl CrawlScope {
    pub fn new(
        domain: impl Into<String>,
        output_root: impl Into<PathBuf>,
        ignore_query: bool,
        rewrite_failed_references: bool,
    ) -> Self {
        Self {
            domain: domain.into().to_ascii_lowercase(),
            output_root: output_root.into(),
            ignore_query,
            rewrite_failed_references,
        }
    }

    /// Derives the scope from a configuration
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlScope)` - The start URL's domain defines the scope
    /// * `Err(MirrorError::InvalidInput)` - The start URL has no host
    pub fn from_config(config: &Config) -> Result<Self, MirrorError> {
        let start = Url::parse(&config.start_url)
            .map_err(|e| MirrorError::InvalidInput(format!("{}: {}", config.start_url, e)))?;
        let domain = extract_domain(&start).ok_or_else(|| {
            MirrorError::InvalidInput(format!("No host in start URL: {}", config.start_url))
        })?;

        Ok(Self::new(
            domain,
            config.output_dir.clone(),
            config.crawler.ignore_query,
            config.crawler.rewrite_failed_references,
        ))
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn ignore_query(&self) -> bool {
        self.ignore_query
    }

    /// Resolves `raw` against `base`, keeping only same-domain targets
    pub fn resolve(&self, base: &Url, raw: &str) -> Option<Url> {
        resolve_in_scope(base, raw, &self.domain)
    }

    /// Decides whether a reference is pointed at its local copy
    ///
    /// References whose download failed keep their original value unless
    /// `rewrite-failed-references` is enabled.
    pub fn should_rewrite(&self, outcome: &FetchOutcome) -> bool {
        outcome.is_available() || self.rewrite_failed_references
    }
}

/// Per-document rewriting context
#[derive(Debug, Clone)]
pub struct RewriteContext<'a> {
    scope: &'a CrawlScope,
    source_url: Url,
    document_dir: PathBuf,
}

impl<'a> RewriteContext<'a> {
    /// Context for an HTML page and the inline CSS inside it
    pub fn for_page(scope: &'a CrawlScope, page_url: &Url) -> Self {
        let path = page_path(page_url, scope.output_root());
        Self {
            scope,
            source_url: page_url.clone(),
            document_dir: document_dir(&path),
        }
    }

    /// Context for a stylesheet stored at `stylesheet_path`
    pub fn for_stylesheet(scope: &'a CrawlScope, stylesheet_url: &Url, stylesheet_path: &Path) -> Self {
        Self {
            scope,
            source_url: stylesheet_url.clone(),
            document_dir: document_dir(stylesheet_path),
        }
    }

    pub fn document_dir(&self) -> &Path {
        &self.document_dir
    }

    /// Resolves a reference found in this document
    pub fn resolve(&self, raw: &str) -> Option<Url> {
        self.scope.resolve(&self.source_url, raw)
    }

    /// Path from this document's directory to `target`
    pub fn relative_to_document(&self, target: &Path) -> String {
        relative_link(target, &self.document_dir)
    }
}
