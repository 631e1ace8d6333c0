//! Character encoding of fetched pages
//!
//! Pages are decoded to text before parsing and encoded back to their own
//! encoding after rewriting, so a saved legacy page still matches the
//! charset it declares. The encoding is taken from, in order:
//! - a byte order mark
//! - the `charset` parameter of the Content-Type header
//! - a `<meta charset>` declaration near the start of the document
//! - UTF-8 if the bytes are valid UTF-8, windows-1252 otherwise

use crate::ParseError;
use encoding_rs::{Encoding, REPLACEMENT, UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::borrow::Cow;
use url::Url;

/// How far into the document a `<meta charset>` declaration is looked for
const META_PRESCAN_BYTES: usize = 1024;

static META_CHARSET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i-u)<meta[^>]*?charset\s*=\s*["']?\s*([a-z0-9_:.\-]+)"#)
        .expect("meta charset pattern is valid")
});

/// A page body decoded to text
#[derive(Debug)]
pub struct DecodedPage<'a> {
    pub text: Cow<'a, str>,

    /// Encoding the rewritten page is written back in
    pub encoding: &'static Encoding,

    /// Set when the body is not valid in the UTF-8 it declares; `text` is
    /// then a lossy decoding
    pub error: Option<ParseError>,
}

/// Decodes a fetched HTML body
pub fn decode_page<'a>(url: &Url, content_type: Option<&str>, body: &'a [u8]) -> DecodedPage<'a> {
    if let Some((encoding, bom_length)) = Encoding::for_bom(body) {
        let (text, _) = encoding.decode_without_bom_handling(&body[bom_length..]);
        return DecodedPage {
            text,
            encoding,
            error: None,
        };
    }

    let declared = declared_encoding(content_type, body);
    match declared {
        Some(encoding) if encoding != UTF_8 => {
            let (text, malformed) = encoding.decode_without_bom_handling(body);
            if malformed {
                tracing::debug!("{} has bytes that are invalid in {}", url, encoding.name());
            }
            DecodedPage {
                text,
                encoding,
                error: None,
            }
        }
        _ => match std::str::from_utf8(body) {
            Ok(text) => DecodedPage {
                text: Cow::Borrowed(text),
                encoding: UTF_8,
                error: None,
            },
            Err(e) if declared.is_some() => DecodedPage {
                text: String::from_utf8_lossy(body),
                encoding: UTF_8,
                error: Some(ParseError::NotUtf8 {
                    url: url.to_string(),
                    offset: e.valid_up_to(),
                }),
            },
            Err(_) => {
                tracing::debug!("{} declares no charset and is not UTF-8, reading it as windows-1252", url);
                let (text, _) = WINDOWS_1252.decode_without_bom_handling(body);
                DecodedPage {
                    text,
                    encoding: WINDOWS_1252,
                    error: None,
                }
            }
        },
    }
}

/// Encodes rewritten page text back into the page's encoding
///
/// Characters the encoding cannot represent become numeric character
/// references.
pub fn encode_page(text: &str, encoding: &'static Encoding) -> Vec<u8> {
    let (bytes, _, _) = encoding.encode(text);
    bytes.into_owned()
}

/// Returns the encoding a page declares, if any usable one
pub fn declared_encoding(content_type: Option<&str>, body: &[u8]) -> Option<&'static Encoding> {
    if let Some(encoding) = content_type.and_then(header_charset) {
        return Some(encoding);
    }

    let head = &body[..body.len().min(META_PRESCAN_BYTES)];
    let label = META_CHARSET.captures(head)?.get(1)?;
    match Encoding::for_label(label.as_bytes()) {
        // A meta tag cannot switch a byte-oriented document to UTF-16
        Some(encoding) if encoding == UTF_16BE || encoding == UTF_16LE => Some(UTF_8),
        Some(encoding) if encoding == REPLACEMENT => None,
        other => other,
    }
}

fn header_charset(content_type: &str) -> Option<&'static Encoding> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
        .and_then(|(_, value)| {
            let label = value.trim().trim_matches(|c| c == '"' || c == '\'');
            Encoding::for_label(label.as_bytes())
        })
        .filter(|encoding| *encoding != REPLACEMENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://example.com/").unwrap()
    }

    #[test]
    fn test_header_charset() {
        assert_eq!(
            declared_encoding(Some("text/html; charset=ISO-8859-1"), b""),
            Some(WINDOWS_1252)
        );
        assert_eq!(
            declared_encoding(Some("text/html;charset=\"utf-8\""), b""),
            Some(UTF_8)
        );
        assert_eq!(declared_encoding(Some("text/html"), b""), None);
        assert_eq!(declared_encoding(Some("text/html; charset=bogus"), b""), None);
    }

    #[test]
    fn test_meta_charset() {
        let body = br#"<html><head><meta http-equiv="Content-Type" content="text/html; charset=koi8-r">"#;
        assert_eq!(declared_encoding(None, body), Encoding::for_label(b"koi8-r"));

        let body = b"<html><head><META CHARSET='utf-16'></head>";
        assert_eq!(declared_encoding(Some("text/html"), body), Some(UTF_8));
    }

    #[test]
    fn test_header_wins_over_meta() {
        let body = b"<meta charset=\"utf-8\">";
        assert_eq!(
            declared_encoding(Some("text/html; charset=iso-8859-1"), body),
            Some(WINDOWS_1252)
        );
    }

    #[test]
    fn test_decode_latin1_page() {
        let body = b"<p>caf\xe9</p>";
        let page = decode_page(&page_url(), Some("text/html; charset=iso-8859-1"), body);

        assert_eq!(page.text, "<p>caf\u{e9}</p>");
        assert_eq!(page.encoding, WINDOWS_1252);
        assert!(page.error.is_none());
    }

    #[test]
    fn test_decode_undeclared_legacy_page() {
        let page = decode_page(&page_url(), Some("text/html"), b"<p>na\xefve</p>");

        assert_eq!(page.text, "<p>na\u{ef}ve</p>");
        assert_eq!(page.encoding, WINDOWS_1252);
        assert!(page.error.is_none());
    }

    #[test]
    fn test_decode_utf8_borrows() {
        let body = "<p>caf\u{e9}</p>".as_bytes();
        let page = decode_page(&page_url(), None, body);

        assert!(matches!(page.text, Cow::Borrowed(_)));
        assert_eq!(page.encoding, UTF_8);
    }

    #[test]
    fn test_decode_bom() {
        let body = b"\xef\xbb\xbf<p>x</p>";
        let page = decode_page(&page_url(), Some("text/html; charset=iso-8859-1"), body);

        assert_eq!(page.text, "<p>x</p>");
        assert_eq!(page.encoding, UTF_8);
    }

    #[test]
    fn test_declared_utf8_with_invalid_bytes() {
        let body = b"<p>ok</p><p>\xff</p>";
        let page = decode_page(&page_url(), Some("text/html; charset=utf-8"), body);

        assert_eq!(page.text, "<p>ok</p><p>\u{fffd}</p>");
        assert_eq!(
            page.error,
            Some(ParseError::NotUtf8 {
                url: "https://example.com/".to_string(),
                offset: 12
            })
        );
    }

    #[test]
    fn test_encode_back_to_page_encoding() {
        assert_eq!(encode_page("caf\u{e9}", WINDOWS_1252), b"caf\xe9");
        assert_eq!(encode_page("\u{2713}", WINDOWS_1252), b"&#10003;");
        assert_eq!(encode_page("caf\u{e9}", UTF_8), "caf\u{e9}".as_bytes());
    }
}
