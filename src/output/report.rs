//! Crawl report types
//!
//! The report is the explicit collector a crawl passes its outcomes to. It
//! counts what was saved and keeps every per-resource failure, so callers
//! and tests can inspect a run without scraping logs.

use chrono::{DateTime, Utc};
use std::fmt;

/// Category of a non-fatal crawl error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The resource could not be retrieved
    Fetch,
    /// The document could not be parsed for rewriting
    Parse,
    /// The content could not be written to the archive
    Write,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetch => "fetch",
            Self::Parse => "parse",
            Self::Write => "write",
        };
        f.write_str(name)
    }
}

/// Error information for a failed page or asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlError {
    pub kind: ErrorKind,

    /// The URL being processed when the error happened
    pub url: String,

    /// Error message
    pub message: String,
}

/// Outcome of one crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Seed URL the crawl started from
    pub seed: String,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// URLs dequeued from the frontier, whatever their outcome
    pub pages_visited: u64,

    /// HTML pages written to the archive
    pub pages_saved: u64,

    /// Non-page resources written to the archive, including non-HTML pages
    pub assets_saved: u64,

    /// URLs still queued when the page budget stopped the crawl
    pub pages_remaining: u64,

    /// Every recorded error, in the order it happened
    pub errors: Vec<CrawlError>,
}

impl CrawlReport {
    /// Starts a report for a crawl of `seed`
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            started_at: Utc::now(),
            finished_at: None,
            pages_visited: 0,
            pages_saved: 0,
            assets_saved: 0,
            pages_remaining: 0,
            errors: Vec::new(),
        }
    }

    pub fn record_visit(&mut self) {
        self.pages_visited += 1;
    }

    pub fn record_page_saved(&mut self) {
        self.pages_saved += 1;
    }

    pub fn record_asset_saved(&mut self) {
        self.assets_saved += 1;
    }

    /// Records a non-fatal error
    pub fn record_error(&mut self, kind: ErrorKind, url: impl Into<String>, message: impl Into<String>) {
        self.errors.push(CrawlError {
            kind,
            url: url.into(),
            message: message.into(),
        });
    }

    /// Marks the crawl finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Total number of recorded errors
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Errors of one kind
    pub fn errors_of(&self, kind: ErrorKind) -> impl Iterator<Item = &CrawlError> {
        self.errors.iter().filter(move |e| e.kind == kind)
    }

    /// Wall-clock duration in seconds, if finished
    pub fn duration_seconds(&self) -> Option<f64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_milliseconds() as f64 / 1000.0)
    }

    /// Calculates the share of visited pages that were saved as pages
    pub fn success_rate(&self) -> f64 {
        if self.pages_visited == 0 {
            return 0.0;
        }
        (self.pages_saved as f64 / self.pages_visited as f64) * 100.0
    }

    /// Returns true if nothing went wrong
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}
