use crate::{UrlError, UrlResult};
use url::{Position, Url};

/// Reference prefixes that never point at a fetchable resource
const SKIPPED_PREFIXES: &[&str] = &["data:", "mailto:", "tel:", "javascript:"];

/// Parses and checks a seed URL
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace and parse; reject if malformed
/// 2. Reject anything but HTTP and HTTPS
/// 3. Reject URLs without a host
/// 4. Remove the fragment
///
/// # Examples
///
/// ```
/// use offline_archiver::url::parse_seed;
///
/// let url = parse_seed("https://example.com/docs/#intro").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/docs/");
/// ```
pub fn parse_seed(url_str: &str) -> UrlResult<Url> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {}
        _ => return Err(UrlError::MissingDomain),
    }

    url.set_fragment(None);
    Ok(url)
}

/// Resolves a reference found in a document against the document's URL
///
/// Returns None if the reference should be left alone:
/// - empty or whitespace-only values
/// - fragment-only references (same page anchors)
/// - data:, mailto:, tel:, javascript: references
/// - values that do not resolve to a valid URL
/// - non-HTTP(S) URLs after resolution
///
/// The fragment of the reference is preserved in the result.
pub fn resolve_reference(base_url: &Url, raw: &str) -> Option<Url> {
    let raw = raw.trim();

    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }

    let lowered = raw.to_ascii_lowercase();
    if SKIPPED_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
    {
        return None;
    }

    match base_url.join(raw) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url)
            } else {
                None
            }
        }
        Err(_) => None,
    }
}

/// Computes the key used for visited/queued membership
///
/// The key is the URL from its authority onwards, without scheme or fragment:
/// `http://h/a` and `https://h/a` are in the same scope and map to the same
/// archive path, so they are one resource. When `ignore_query` is set the
/// query string is dropped too, so `/a?x=1` and `/a?x=2` are the same
/// resource.
pub fn visit_key(url: &Url, ignore_query: bool) -> String {
    let end = if ignore_query {
        Position::AfterPath
    } else {
        Position::AfterQuery
    };
    format!("//{}", &url[Position::BeforeUsername..end])
}

/// Returns a copy of the URL with its fragment removed
pub fn without_fragment(url: &Url) -> Url {
    let mut url = url.clone();
    url.set_fragment(None);
    url
}
