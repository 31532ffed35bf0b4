//! HTML page rewriting
//!
//! A page is parsed once into an owned `kuchiki` tree. The passes below
//! mutate attributes and text on that tree in order, then it is serialized
//! once and written to the page's local path:
//!
//! 1. asset attributes (`img/src`, `link/href`, ...)
//! 2. `srcset` lists, collapsed to their best candidate
//! 3. inline `style` attributes
//! 4. `<style>` elements
//! 5. charset declarations, since the output is always UTF-8
//! 6. bookmark script injection
//! 7. anchors: same-domain links are rewritten and reported

use crate::crawler::{save_file, AssetFetcher, FetchOutcome};
use crate::output::BOOKMARK_SCRIPT;
use crate::paths::{asset_path, page_path};
use crate::rewrite::context::{CrawlScope, RewriteContext};
use crate::rewrite::css::StyleRewriter;
use crate::rewrite::srcset::select_best;
use crate::state::CrawlState;
use crate::url::normalize_url;
use crate::MirrorError;
use kuchiki::traits::TendrilSink;
use kuchiki::{ElementData, NodeDataRef, NodeRef};
use std::collections::HashSet;
use std::path::PathBuf;
use url::Url;

/// Tag/attribute pairs whose value names a downloadable asset
pub const ASSET_ATTRIBUTES: &[(&str, &str)] = &[
    ("img", "src"),
    ("link", "href"),
    ("script", "src"),
    ("video", "src"),
    ("audio", "src"),
    ("source", "src"),
    ("iframe", "src"),
];

/// A rewritten page that has not been written yet
#[derive(Debug, Clone)]
pub struct RewrittenPage {
    pub html: String,
    /// Same-domain links that were neither visited nor queued, in document order
    pub discovered: Vec<String>,
}

fn select_all(document: &NodeRef, selector: &str) -> Vec<NodeDataRef<ElementData>> {
    match document.select(selector) {
        Ok(matches) => matches.collect(),
        Err(()) => {
            tracing::error!("Invalid selector: {}", selector);
            Vec::new()
        }
    }
}

fn attribute(element: &NodeDataRef<ElementData>, name: &str) -> Option<String> {
    element.attributes.borrow().get(name).map(str::to_string)
}

fn set_attribute(element: &NodeDataRef<ElementData>, name: &str, value: String) {
    element.attributes.borrow_mut().insert(name, value);
}

fn is_stylesheet_link(element: &NodeDataRef<ElementData>) -> bool {
    &*element.name.local == "link"
        && attribute(element, "rel").is_some_and(|rel| {
            rel.split_ascii_whitespace()
                .any(|token| token.eq_ignore_ascii_case("stylesheet"))
        })
}

/// Rewrites fetched HTML pages into their offline form
pub struct PageRewriter<'a> {
    fetcher: &'a AssetFetcher,
    scope: &'a CrawlScope,
    styles: StyleRewriter<'a>,
}

impl<'a> PageRewriter<'a> {
    pub fn new(fetcher: &'a AssetFetcher, scope: &'a CrawlScope) -> Self {
        Self {
            fetcher,
            scope,
            styles: StyleRewriter::new(fetcher, scope),
        }
    }

    /// Rewrites `html` fetched from `page_url` and writes it to its page path
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<String>)` - Newly discovered same-domain links
    /// * `Err(MirrorError)` - The page could not be serialized or written
    pub async fn process(
        &self,
        html: &str,
        page_url: &Url,
        state: &CrawlState,
    ) -> Result<Vec<String>, MirrorError> {
        let page = self.rewrite(html, page_url, state).await?;
        let path = self.page_file(page_url);
        save_file(&path, page.html.as_bytes()).await?;
        tracing::debug!("Saved page {} -> {}", page_url, path.display());
        Ok(page.discovered)
    }

    /// Local path a page is written to
    pub fn page_file(&self, page_url: &Url) -> PathBuf {
        page_path(page_url, self.scope.output_root())
    }

    /// Rewrites a page in memory, downloading the assets it references
    pub async fn rewrite(
        &self,
        html: &str,
        page_url: &Url,
        state: &CrawlState,
    ) -> Result<RewrittenPage, MirrorError> {
        let document = kuchiki::parse_html().one(html);
        let ctx = RewriteContext::for_page(self.scope, page_url);

        self.rewrite_asset_attributes(&document, &ctx).await;
        self.rewrite_srcsets(&document, &ctx).await;
        self.rewrite_style_attributes(&document, &ctx).await;
        self.rewrite_style_elements(&document, &ctx).await;
        declare_utf8(&document);
        inject_bookmark_script(&document);
        let discovered = self.rewrite_anchors(&document, &ctx, state);

        let mut output = Vec::new();
        document.serialize(&mut output)?;

        Ok(RewrittenPage {
            html: String::from_utf8_lossy(&output).into_owned(),
            discovered,
        })
    }

    /// Downloads `target` to its asset path
    async fn fetch_asset(&self, target: &Url) -> (PathBuf, FetchOutcome) {
        let local_path = asset_path(target, self.scope.output_root());
        let outcome = self.fetcher.fetch(target, &local_path).await;
        (local_path, outcome)
    }

    async fn rewrite_asset_attributes(&self, document: &NodeRef, ctx: &RewriteContext<'_>) {
        for (tag, attr) in ASSET_ATTRIBUTES {
            for element in select_all(document, &format!("{}[{}]", tag, attr)) {
                let Some(value) = attribute(&element, attr) else {
                    continue;
                };
                let Some(target) = ctx.resolve(&value) else {
                    continue;
                };

                let (local_path, outcome) = self.fetch_asset(&target).await;
                if let FetchOutcome::Fetched(body) = &outcome {
                    if is_stylesheet_link(&element) {
                        self.styles
                            .rewrite_stylesheet_body(body, target.clone(), local_path.clone())
                            .await;
                    }
                }

                if self.scope.should_rewrite(&outcome) {
                    set_attribute(&element, attr, ctx.relative_to_document(&local_path));
                }
            }
        }
    }

    async fn rewrite_srcsets(&self, document: &NodeRef, ctx: &RewriteContext<'_>) {
        for element in select_all(document, "img[srcset], source[srcset]") {
            let Some(best) = attribute(&element, "srcset").and_then(|s| select_best(&s)) else {
                continue;
            };
            let Some(target) = ctx.resolve(&best) else {
                continue;
            };

            let (local_path, outcome) = self.fetch_asset(&target).await;
            if self.scope.should_rewrite(&outcome) {
                let relative = ctx.relative_to_document(&local_path);
                if &*element.name.local == "img" {
                    set_attribute(&element, "src", relative.clone());
                }
                set_attribute(&element, "srcset", relative);
            }
        }
    }

    async fn rewrite_style_attributes(&self, document: &NodeRef, ctx: &RewriteContext<'_>) {
        for element in select_all(document, "[style]") {
            let Some(css) = attribute(&element, "style") else {
                continue;
            };

            let rewritten = self.styles.rewrite(&css, ctx).await;
            if rewritten != css {
                set_attribute(&element, "style", rewritten);
            }
        }
    }

    async fn rewrite_style_elements(&self, document: &NodeRef, ctx: &RewriteContext<'_>) {
        for element in select_all(document, "style") {
            let node = element.as_node();
            let css = node.text_contents();

            let rewritten = self.styles.rewrite(&css, ctx).await;
            if rewritten != css {
                for child in node.children().collect::<Vec<_>>() {
                    child.detach();
                }
                node.append(NodeRef::new_text(rewritten));
            }
        }
    }

    /// Rewrites same-domain anchors to local page paths
    ///
    /// Every in-scope anchor is rewritten, whether or not its target has been
    /// fetched yet. Targets that are neither visited nor queued are returned,
    /// each once.
    fn rewrite_anchors(
        &self,
        document: &NodeRef,
        ctx: &RewriteContext<'_>,
        state: &CrawlState,
    ) -> Vec<String> {
        let mut discovered = Vec::new();
        let mut seen = HashSet::new();

        for element in select_all(document, "a[href]") {
            let Some(href) = attribute(&element, "href") else {
                continue;
            };
            let Some(target) = ctx.resolve(&href) else {
                continue;
            };

            let normalized = normalize_url(target.as_str(), self.scope.ignore_query());
            if !state.is_known(&normalized) && seen.insert(normalized) {
                discovered.push(target.to_string());
            }

            let mut relative = ctx.relative_to_document(&page_path(&target, self.scope.output_root()));
            if let Some(fragment) = target.fragment() {
                relative.push('#');
                relative.push_str(fragment);
            }
            set_attribute(&element, "href", relative);
        }

        discovered
    }
}

/// Points `<meta>` charset declarations at UTF-8
fn declare_utf8(document: &NodeRef) {
    for meta in select_all(document, "meta[charset]") {
        set_attribute(&meta, "charset", "utf-8".to_string());
    }

    for meta in select_all(document, "meta[http-equiv][content]") {
        let is_content_type = attribute(&meta, "http-equiv")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("content-type"));
        if is_content_type {
            set_attribute(&meta, "content", "text/html; charset=utf-8".to_string());
        }
    }
}

/// Appends the bookmark script to `<body>`, if the document has one
fn inject_bookmark_script(document: &NodeRef) {
    let Ok(body) = document.select_first("body") else {
        return;
    };

    let fragment = kuchiki::parse_html().one("<script></script>");
    let Ok(script) = fragment.select_first("script") else {
        return;
    };

    let script = script.as_node().clone();
    script.detach();
    script.append(NodeRef::new_text(BOOKMARK_SCRIPT));
    body.as_node().append(script);
}
