use url::Url;

/// Normalizes a URL for deduplication
///
/// # Normalization Steps
///
/// 1. Remove the fragment (always)
/// 2. Remove the query string (only when `ignore_query` is set)
///
/// Parsable URLs are re-serialized by the `url` crate, so `https://a.b` and
/// `https://a.b/` compare equal. Anything unparsable is stripped textually,
/// which keeps the function total.
///
/// # Examples
///
/// ```
/// use offline_mirror::url::normalize_url;
///
/// assert_eq!(normalize_url("https://a.b/p?x=1#top", false), "https://a.b/p?x=1");
/// assert_eq!(normalize_url("https://a.b/p?x=1#top", true), "https://a.b/p");
/// ```
pub fn normalize_url(url_str: &str, ignore_query: bool) -> String {
    match Url::parse(url_str) {
        Ok(mut url) => {
            url.set_fragment(None);
            if ignore_query {
                url.set_query(None);
            }
            url.into()
        }
        Err(_) => strip_textually(url_str, ignore_query),
    }
}

/// Fallback for strings the URL parser rejects
fn strip_textually(url_str: &str, ignore_query: bool) -> String {
    let without_fragment = url_str.split('#').next().unwrap_or_default();
    if ignore_query {
        without_fragment
            .split('?')
            .next()
            .unwrap_or_default()
            .to_string()
    } else {
        without_fragment.to_string()
    }
}
