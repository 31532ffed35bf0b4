//! Content rewriting for the offline mirror
//!
//! Pages and stylesheets are rewritten so every same-domain reference points
//! at its local copy through a relative path:
//! - `html`: attribute, `srcset`, inline CSS and anchor rewriting for pages
//! - `css`: `@import` and `url()` rewriting for stylesheets and inline CSS
//! - `srcset`: best-candidate selection
//! - `context`: crawl-wide scope and per-document context

pub mod context;
pub mod css;
pub mod html;
pub mod srcset;

pub use context::{CrawlScope, RewriteContext};
pub use css::{apply_rewrites, scan_references, CssReference, CssReferenceKind, StyleRewriter};
pub use html::{PageRewriter, RewrittenPage, ASSET_ATTRIBUTES};
