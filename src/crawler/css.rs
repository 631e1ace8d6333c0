//! CSS reference handling
//!
//! Stylesheets and inline `style` attributes point at further resources via
//! `url(...)` and `@import`. This module finds those references and rewrites
//! them through a caller-supplied mapping, leaving everything else untouched.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Matches `@import url(x);`, `@import "x";`, `@import 'x';` or a bare `url(x)`
///
/// Groups 1-3 capture the target of an `@import`, group 4 a `url()` target.
static CSS_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"@import\s+(?:url\s*\(\s*([^)]*?)\s*\)|"([^"]+)"|'([^']+)')\s*;|url\s*\(\s*([^)]*?)\s*\)"#,
    )
    .expect("CSS reference pattern is valid")
});

/// Extracts every referenced location from CSS text, in document order
///
/// Quotes are stripped. `data:` URIs, fragment-only and empty references are
/// skipped.
pub fn extract_css_references(css: &str) -> Vec<String> {
    CSS_REFERENCE
        .captures_iter(css)
        .filter_map(|caps| reference_of(&caps))
        .map(|(_, target)| target)
        .collect()
}

/// Rewrites CSS references through `map`
///
/// `map` receives the unquoted reference and returns its replacement, or None
/// to keep the original text. Rewritten imports become `@import url('x');`
/// and rewritten urls become `url('x')`.
pub fn rewrite_css_references<F>(css: &str, mut map: F) -> String
where
    F: FnMut(&str) -> Option<String>,
{
    CSS_REFERENCE
        .replace_all(css, |caps: &Captures| {
            let original = caps[0].to_string();
            match reference_of(caps) {
                Some((is_import, target)) => match map(&target) {
                    Some(replacement) if is_import => format!("@import url('{}');", replacement),
                    Some(replacement) => format!("url('{}')", replacement),
                    None => original,
                },
                None => original,
            }
        })
        .into_owned()
}

fn reference_of(caps: &Captures) -> Option<(bool, String)> {
    let (is_import, raw) = if let Some(m) = caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)) {
        (true, m.as_str())
    } else {
        (false, caps.get(4)?.as_str())
    };

    let target = raw.trim().trim_matches(|c| c == '\'' || c == '"').trim();
    if target.is_empty() || target.starts_with('#') || target.to_ascii_lowercase().starts_with("data:") {
        return None;
    }

    Some((is_import, target.to_string()))
}
