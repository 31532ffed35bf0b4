//! URL-to-filesystem mapping
//!
//! Every URL lands at a deterministic location under the output root. Two
//! flavours exist:
//!
//! - **page paths** for navigable documents, which gain an `index.html` suffix
//!   when the URL looks like a directory
//! - **asset paths** for images, scripts, stylesheets and media, which keep
//!   their literal filename
//!
//! All functions here are pure: no network and no filesystem access.

use crate::url::extract_domain;
use std::path::{Component, Path, PathBuf};
use url::Url;

/// Characters that are illegal in file names on common filesystems
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '\\', '|', '?', '*'];

/// Components longer than this are reported (but still written)
pub const MAX_COMPONENT_LENGTH: usize = 240;

/// File name used for directory-like page URLs
pub const INDEX_FILE: &str = "index.html";

/// Replaces characters that are illegal on common filesystems with `_`
///
/// Overlong components are logged and kept intact; truncating them would
/// silently map distinct URLs onto one file.
///
/// # Examples
///
/// ```
/// use offline_mirror::paths::sanitize;
///
/// assert_eq!(sanitize("a:b*c"), "a_b_c");
/// assert_eq!(sanitize("plain.txt"), "plain.txt");
/// ```
pub fn sanitize(component: &str) -> String {
    let sanitized: String = component
        .chars()
        .map(|c| if INVALID_CHARS.contains(&c) { '_' } else { c })
        .collect();

    if sanitized.chars().count() > MAX_COMPONENT_LENGTH {
        let preview: String = sanitized.chars().take(60).collect();
        tracing::warn!("Sanitized path component is very long: {}...", preview);
    }

    sanitized
}

/// Splits a URL path into its non-empty, sanitized segments
fn sanitized_segments(url: &Url) -> Vec<String> {
    url.path()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(sanitize)
        .collect()
}

/// Maps a navigable page URL to its local file path
///
/// # Rules
///
/// | URL path | Local path |
/// |----------|------------|
/// | `/` (or empty) | `index.html` |
/// | `/docs/` | `docs/index.html` |
/// | `/docs/guide` | `docs/guide/index.html` |
/// | `/docs/page.html` | `docs/page.html` |
///
/// # Examples
///
/// ```
/// use offline_mirror::paths::page_path;
/// use std::path::Path;
/// use url::Url;
///
/// let url = Url::parse("https://a.b/docs/guide").unwrap();
/// assert_eq!(page_path(&url, Path::new("out")), Path::new("out/docs/guide/index.html"));
/// ```
pub fn page_path(url: &Url, output_root: &Path) -> PathBuf {
    let mut segments = sanitized_segments(url);
    if segments.is_empty() {
        return output_root.join(INDEX_FILE);
    }

    let raw_path = url.path();
    let last_segment = raw_path.trim_matches('/').rsplit('/').next().unwrap_or_default();
    if raw_path.ends_with('/') || !last_segment.contains('.') {
        segments.push(INDEX_FILE.to_string());
    }

    join_segments(output_root, &segments)
}

/// Maps an asset URL to its local file path
///
/// Never appends `index.html`. A URL without path segments (a bare origin
/// used as an asset source) falls back to the sanitized domain as file name.
///
/// # Examples
///
/// ```
/// use offline_mirror::paths::asset_path;
/// use std::path::Path;
/// use url::Url;
///
/// let url = Url::parse("https://a.b/img/logo.png").unwrap();
/// assert_eq!(asset_path(&url, Path::new("out")), Path::new("out/img/logo.png"));
/// ```
pub fn asset_path(url: &Url, output_root: &Path) -> PathBuf {
    let segments = sanitized_segments(url);
    if segments.is_empty() {
        let domain = extract_domain(url).unwrap_or_else(|| "_".to_string());
        return output_root.join(sanitize(&domain));
    }

    join_segments(output_root, &segments)
}

fn join_segments(output_root: &Path, segments: &[String]) -> PathBuf {
    let mut path = output_root.to_path_buf();
    for segment in segments {
        path.push(segment);
    }
    path
}

/// Directory a document's relative references are computed from
pub fn document_dir(document_path: &Path) -> PathBuf {
    document_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

/// Computes the `/`-separated path from `from_dir` to `target`
///
/// Both paths must share the same root (both relative to the working
/// directory, or both absolute). Falls back to `target` itself when no
/// relative path exists.
///
/// # Examples
///
/// ```
/// use offline_mirror::paths::relative_link;
/// use std::path::Path;
///
/// let link = relative_link(Path::new("out/img/logo.png"), Path::new("out/docs/guide"));
/// assert_eq!(link, "../../img/logo.png");
/// ```
pub fn relative_link(target: &Path, from_dir: &Path) -> String {
    let relative = pathdiff::diff_paths(target, from_dir).unwrap_or_else(|| target.to_path_buf());

    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            Component::ParentDir => Some("..".to_string()),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
