//! URL handling module for the mirror
//!
//! This module provides URL normalization, domain extraction, and the
//! scope test that decides whether a reference belongs to the mirrored site.

mod domain;
mod normalize;

use url::Url;

// Re-export main functions
pub use domain::{extract_domain, is_same_domain};
pub use normalize::normalize_url;

/// Schemes that never point at fetchable content
const SKIPPED_PREFIXES: &[&str] = &["data:", "mailto:", "tel:", "#"];

/// Returns true if a raw reference must be left alone without resolving it
///
/// Empty or whitespace-only values, fragment-only references and `data:`,
/// `mailto:` and `tel:` URIs are skipped everywhere references are rewritten.
///
/// # Examples
///
/// ```
/// use offline_mirror::url::is_skipped_reference;
///
/// assert!(is_skipped_reference("  "));
/// assert!(is_skipped_reference("#top"));
/// assert!(is_skipped_reference("data:image/png;base64,AAAA"));
/// assert!(!is_skipped_reference("/img/logo.png"));
/// ```
pub fn is_skipped_reference(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return true;
    }

    let lowered = trimmed.to_ascii_lowercase();
    SKIPPED_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
}

/// Resolves a raw reference against `base` and keeps it only if it is in scope
///
/// # Returns
///
/// * `Some(Url)` - The absolute URL, whose domain equals `domain`
/// * `None` - The reference is skipped, unparsable, or points at another domain
pub fn resolve_in_scope(base: &Url, raw: &str, domain: &str) -> Option<Url> {
    if is_skipped_reference(raw) {
        return None;
    }

    let resolved = base.join(raw.trim()).ok()?;
    if is_same_domain(&resolved, domain) {
        Some(resolved)
    } else {
        None
    }
}
