//! CSS reference rewriting
//!
//! Rewriting a piece of CSS happens in three steps:
//!
//! 1. [`scan_references`] finds every `@import` and `url(...)` reference
//!    (pure, no I/O)
//! 2. [`StyleRewriter`] resolves each reference, downloads in-scope targets
//!    through the [`AssetFetcher`] and computes the replacement text
//! 3. [`apply_rewrites`] splices the replacements into the original text
//!    (pure)
//!
//! `@import` and `url()` are matched by a single pattern, so the `url(...)`
//! inside an import is never seen twice.

use crate::crawler::{AssetFetcher, FetchOutcome, FetchedBody};
use crate::paths::asset_path;
use crate::rewrite::context::{CrawlScope, RewriteContext};
use futures::future::{FutureExt, LocalBoxFuture};
use regex::Regex;
use std::borrow::Cow;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use url::Url;

/// Groups 1-3: `@import url(...)`, `@import "..."`, `@import '...'`.
/// Group 4: any other `url(...)`.
fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r#"(?i)@import\s+(?:url\(([^)]+)\)|"([^"]+)"|'([^']+)')\s*;|url\s*\(([^)]+)\)"#,
        )
        .expect("CSS reference pattern is valid")
    })
}

fn charset_rule_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"^\s*@charset\s*"[^"]*"\s*;"#).expect("charset rule pattern is valid")
    })
}

/// Replaces a leading `@charset` rule with one naming UTF-8
///
/// Rewritten stylesheets are written as UTF-8, whatever they were served as.
///
/// # Examples
///
/// ```
/// use offline_mirror::rewrite::css::declare_utf8_charset;
///
/// assert_eq!(declare_utf8_charset("@charset \"iso-8859-1\"; a{}"), "@charset \"utf-8\"; a{}");
/// assert_eq!(declare_utf8_charset("a{}"), "a{}");
/// ```
pub fn declare_utf8_charset(css: &str) -> Cow<'_, str> {
    charset_rule_pattern().replace(css, r#"@charset "utf-8";"#)
}

/// Syntactic form of a CSS reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CssReferenceKind {
    /// A whole `@import ...;` statement
    Import,
    /// A `url(...)` token
    Url,
}

impl CssReferenceKind {
    /// Renders the replacement text for a rewritten reference
    ///
    /// # Examples
    ///
    /// ```
    /// use offline_mirror::rewrite::css::CssReferenceKind;
    ///
    /// assert_eq!(CssReferenceKind::Import.render("a.css"), "@import url('a.css');");
    /// assert_eq!(CssReferenceKind::Url.render("b.png"), "url('b.png')");
    /// ```
    pub fn render(&self, target: &str) -> String {
        match self {
            Self::Import => format!("@import url('{}');", target),
            Self::Url => format!("url('{}')", target),
        }
    }
}

/// A reference found in CSS text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssReference {
    /// Byte range of the whole match, replaced when rewritten
    pub range: Range<usize>,
    pub kind: CssReferenceKind,
    /// Reference value with surrounding whitespace and quotes removed
    pub value: String,
}

fn clean_value(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_string()
}

/// Finds all `@import` and `url()` references in `css`, in source order
pub fn scan_references(css: &str) -> Vec<CssReference> {
    reference_pattern()
        .captures_iter(css)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let (kind, raw) = match (caps.get(1).or(caps.get(2)).or(caps.get(3)), caps.get(4)) {
                (Some(import), _) => (CssReferenceKind::Import, import.as_str()),
                (None, Some(url)) => (CssReferenceKind::Url, url.as_str()),
                (None, None) => return None,
            };

            Some(CssReference {
                range: whole.range(),
                kind,
                value: clean_value(raw),
            })
        })
        .collect()
}

/// Replaces the given byte ranges of `css`
///
/// Ranges must come from [`scan_references`] on the same text: in order and
/// non-overlapping. Text outside the ranges is copied unchanged.
pub fn apply_rewrites(css: &str, rewrites: &[(Range<usize>, String)]) -> String {
    let mut output = String::with_capacity(css.len());
    let mut cursor = 0;
    for (range, replacement) in rewrites {
        output.push_str(&css[cursor..range.start]);
        output.push_str(replacement);
        cursor = range.end;
    }
    output.push_str(&css[cursor..]);
    output
}

/// Rewrites CSS references to point at local copies
pub struct StyleRewriter<'a> {
    fetcher: &'a AssetFetcher,
    scope: &'a CrawlScope,
}

impl<'a> StyleRewriter<'a> {
    pub fn new(fetcher: &'a AssetFetcher, scope: &'a CrawlScope) -> Self {
        Self { fetcher, scope }
    }

    /// Rewrites every in-scope reference of `css`
    ///
    /// References resolve against the context's source URL; replacement
    /// paths are relative to the context's document directory. Skipped,
    /// cross-domain and (by default) failed references are left untouched.
    pub async fn rewrite(&self, css: &str, ctx: &RewriteContext<'_>) -> String {
        let references = scan_references(css);
        if references.is_empty() {
            return css.to_string();
        }

        let mut rewrites = Vec::new();
        for reference in references {
            let Some(target) = ctx.resolve(&reference.value) else {
                continue;
            };

            let local_path = asset_path(&target, self.scope.output_root());
            let outcome = self.fetcher.fetch(&target, &local_path).await;

            if reference.kind == CssReferenceKind::Import {
                if let FetchOutcome::Fetched(body) = &outcome {
                    self.rewrite_stylesheet_body(body, target.clone(), local_path.clone())
                        .await;
                }
            }

            if self.scope.should_rewrite(&outcome) {
                let relative = ctx.relative_to_document(&local_path);
                rewrites.push((reference.range, reference.kind.render(&relative)));
            }
        }

        apply_rewrites(css, &rewrites)
    }

    /// Rewrites a freshly downloaded stylesheet in place
    ///
    /// Its references resolve against its own URL and are made relative to
    /// its own directory. Imports it pulls in are processed the same way, each
    /// at most once per run since later encounters find the file on disk.
    pub fn rewrite_stylesheet_body<'s>(
        &'s self,
        body: &FetchedBody,
        stylesheet_url: Url,
        stylesheet_path: PathBuf,
    ) -> LocalBoxFuture<'s, ()> {
        let css = body.text().into_owned();
        async move {
            tracing::info!("Processing CSS file: {}", stylesheet_url);
            let ctx = RewriteContext::for_stylesheet(self.scope, &stylesheet_url, &stylesheet_path);
            let rewritten = self.rewrite(&css, &ctx).await;
            if rewritten != css {
                write_stylesheet(&stylesheet_path, &declare_utf8_charset(&rewritten)).await;
            }
        }
        .boxed_local()
    }
}

async fn write_stylesheet(path: &Path, css: &str) {
    if let Err(e) = crate::crawler::save_file(path, css.as_bytes()).await {
        tracing::error!("Failed to write rewritten stylesheet {}: {}", path.display(), e);
    }
}
