//! Offline Archiver: mirror a website for offline browsing
//!
//! This crate crawls every same-site page reachable from a seed URL, saves
//! each page and the assets it references, and rewrites references inside the
//! saved HTML so the archive can be browsed from a local directory.

pub mod archive;
pub mod config;
pub mod crawler;
pub mod output;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Offline Archiver operations
///
/// Only the variants produced before the frontier loop starts are fatal to a
/// run. Fetch, parse and write failures inside the loop are recorded in the
/// [`output::CrawlReport`] instead.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid seed URL '{url}': {reason}")]
    InvalidSeed { url: String, reason: String },

    #[error("Output root {path} is not usable: {source}")]
    OutputRoot {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Failure to retrieve a single resource
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },
}

impl FetchError {
    /// Returns the URL the failed request was made for
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url } | Self::Network { url, .. } | Self::HttpStatus { url, .. } => url,
        }
    }
}

/// A fetched document whose bytes contradict its declared encoding
///
/// Recoverable: the document is still rewritten from a lossy decoding.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Document at {url} declares UTF-8 but is not valid UTF-8 (invalid byte at offset {offset})")]
    NotUtf8 { url: String, offset: usize },
}

/// Failure to persist content inside the archive root
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Archive path '{0}' escapes the output root")]
    OutsideRoot(String),
}

/// Result type alias for Offline Archiver operations
pub type Result<T> = std::result::Result<T, ArchiveError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{run_archive, Coordinator};
pub use output::CrawlReport;
pub use url::{ArchivePath, PathMapper, SiteScope};
