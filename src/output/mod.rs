//! Output module for crawl reports
//!
//! This module handles:
//! - Collecting per-run counts and non-fatal errors ([`CrawlReport`])
//! - Printing a terminal summary
//! - Writing a markdown report

mod markdown;
pub mod report;
mod summary;

pub use markdown::{format_markdown_report, write_markdown_report};
pub use report::{CrawlError, CrawlReport, ErrorKind};
pub use summary::{format_report, print_report};
