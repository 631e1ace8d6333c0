//! Mapping between web URLs and locations inside the archive
//!
//! An [`ArchivePath`] is a forward-slash separated path relative to the
//! output root. It is derived from the URL path only (plus a short hash of the
//! query string, see [`PathMapper`]) and never contains `.`/`..` segments, so
//! joining it onto the root can not escape it.

use crate::config::Config;
use crate::url::normalize::{resolve_reference, visit_key};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use url::Url;

/// Characters replaced with `_` in decoded path segments
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '\\', '|', '?', '*', '/'];

/// Archive paths longer than this are likely to fail on some filesystems
pub const MAX_PATH_LENGTH: usize = 240;

/// Number of hex characters of the query hash kept in file names
const QUERY_TAG_LEN: usize = 8;

/// A location inside the archive, relative to the output root
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArchivePath(String);

impl ArchivePath {
    fn from_segments(segments: Vec<String>) -> Self {
        Self(segments.join("/"))
    }

    /// A file directly under the output root
    ///
    /// The name is sanitized like a URL path segment.
    pub fn root_file(name: &str) -> Self {
        Self(sanitize_segment(name))
    }

    /// Returns the path as a forward-slash separated string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the path segments, the last one being the file name
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Returns the final segment
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Joins this path onto a filesystem root using native separators
    pub fn to_fs_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in self.segments() {
            path.push(segment);
        }
        path
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a URL is going to be stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRole {
    /// A navigable page: directory-like URLs get the index document appended
    Page,
    /// An embedded resource: the URL path is kept as-is
    Asset,
}

/// Computes archive paths for URLs
///
/// # Mapping Rules
///
/// 1. Path segments are percent-decoded; `<>:"\|?*`, `/` and control
///    characters become `_`; empty segments are dropped
/// 2. Page role: an empty path, a trailing `/`, or a last segment without a
///    `.` gets the index document appended (`/about` → `about/index.html`)
/// 3. Asset role: the path is used as-is; an empty path becomes a file named
///    after the host
/// 4. Unless queries are ignored, a non-empty query inserts
///    `-<8 hex chars of SHA-256(query)>` before the file extension
///    (`/search?q=a` → `search/index-<hash>.html`)
#[derive(Debug, Clone)]
pub struct PathMapper {
    index_document: String,
    ignore_query: bool,
}

impl PathMapper {
    /// Creates a mapper with the given index document name and query policy
    pub fn new(index_document: impl Into<String>, ignore_query: bool) -> Self {
        Self {
            index_document: index_document.into(),
            ignore_query,
        }
    }

    /// Creates a mapper from the archive and crawler configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.archive.index_document.clone(),
            config.crawler.ignore_query,
        )
    }

    /// Returns the file name used for directory-like page URLs
    pub fn index_document(&self) -> &str {
        &self.index_document
    }

    /// Returns true if query strings are dropped from keys and paths
    pub fn ignores_query(&self) -> bool {
        self.ignore_query
    }

    /// Resolves a raw reference against the URL of the document holding it
    pub fn resolve(&self, base_url: &Url, raw: &str) -> Option<Url> {
        resolve_reference(base_url, raw)
    }

    /// Key under which the URL is tracked in the visited and queued sets
    pub fn visit_key(&self, url: &Url) -> String {
        visit_key(url, self.ignore_query)
    }

    /// Maps a URL to its archive path for the given role
    pub fn to_archive_path(&self, url: &Url, role: PathRole) -> ArchivePath {
        match role {
            PathRole::Page => self.page_path(url),
            PathRole::Asset => self.asset_path(url),
        }
    }

    /// Maps a navigable page URL to its archive path
    pub fn page_path(&self, url: &Url) -> ArchivePath {
        let mut segments = decoded_segments(url);

        let names_file =
            !url.path().ends_with('/') && segments.last().map_or(false, |s| s.contains('.'));
        if !names_file {
            segments.push(self.index_document.clone());
        }

        self.finish(segments, url)
    }

    /// Maps an embedded resource URL to its archive path
    pub fn asset_path(&self, url: &Url) -> ArchivePath {
        let mut segments = decoded_segments(url);

        if segments.is_empty() {
            let authority = match (url.host_str(), url.port()) {
                (Some(host), Some(port)) => format!("{}:{}", host, port),
                (Some(host), None) => host.to_string(),
                (None, _) => self.index_document.clone(),
            };
            segments.push(sanitize_segment(&authority));
        }

        self.finish(segments, url)
    }

    fn finish(&self, mut segments: Vec<String>, url: &Url) -> ArchivePath {
        if !self.ignore_query {
            if let Some(query) = url.query().filter(|q| !q.is_empty()) {
                if let Some(last) = segments.last_mut() {
                    *last = insert_before_extension(last, &query_tag(query));
                }
            }
        }

        let path = ArchivePath::from_segments(segments);
        if path.as_str().len() > MAX_PATH_LENGTH {
            let preview: String = path.as_str().chars().take(60).collect();
            tracing::warn!(
                "Archive path is very long and may not work everywhere: {}...",
                preview
            );
        }
        path
    }
}

/// Computes the relative reference from one saved document to another
///
/// The result is relative to the directory containing `from`, uses `/`
/// separators and percent-encodes each segment, so it can be written directly
/// into an `href` or `src` attribute.
///
/// # Examples
///
/// ```
/// use offline_archiver::url::{relativize, PathMapper};
/// use url::Url;
///
/// let mapper = PathMapper::new("index.html", false);
/// let page = mapper.page_path(&Url::parse("https://example.com/docs/intro").unwrap());
/// let logo = mapper.asset_path(&Url::parse("https://example.com/logo.png").unwrap());
/// assert_eq!(relativize(&page, &logo), "../../logo.png");
/// ```
pub fn relativize(from: &ArchivePath, to: &ArchivePath) -> String {
    let from_segments: Vec<&str> = from.segments().collect();
    let from_dir = &from_segments[..from_segments.len().saturating_sub(1)];

    let to_segments: Vec<&str> = to.segments().collect();
    let to_dir = &to_segments[..to_segments.len().saturating_sub(1)];

    let common = from_dir
        .iter()
        .zip(to_dir.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::with_capacity(from_dir.len() - common + to_segments.len());
    for _ in common..from_dir.len() {
        parts.push("..".to_string());
    }
    for segment in &to_segments[common..] {
        parts.push(urlencoding::encode(segment).into_owned());
    }

    parts.join("/")
}

/// Decodes and sanitizes one URL path segment for use as a file name
pub fn sanitize_segment(raw: &str) -> String {
    let decoded = urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string());

    let cleaned: String = decoded
        .chars()
        .map(|c| {
            if INVALID_CHARS.contains(&c) || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();

    // Never produce a segment that means "this" or "parent" directory
    if cleaned.chars().all(|c| c == '.') {
        cleaned.replace('.', "_")
    } else {
        cleaned
    }
}

fn decoded_segments(url: &Url) -> Vec<String> {
    url.path_segments()
        .map(|segments| {
            segments
                .filter(|s| !s.is_empty())
                .map(sanitize_segment)
                .collect()
        })
        .unwrap_or_default()
}

fn query_tag(query: &str) -> String {
    let digest = Sha256::digest(query.as_bytes());
    let mut tag = hex::encode(digest);
    tag.truncate(QUERY_TAG_LEN);
    tag
}

fn insert_before_extension(name: &str, tag: &str) -> String {
    match name.rfind('.') {
        Some(dot) if dot > 0 => format!("{}-{}{}", &name[..dot], tag, &name[dot..]),
        _ => format!("{}-{}", name, tag),
    }
}
