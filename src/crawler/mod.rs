//! Crawler module for fetching, rewriting and saving pages
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with timeouts and error classification
//! - Decoding legacy page encodings
//! - HTML and CSS reference rewriting
//! - Frontier and visited-set management
//! - Overall crawl coordination

pub mod charset;
mod coordinator;
pub mod css;
mod fetcher;
mod scheduler;
pub mod transform;

pub use coordinator::{run_archive, Coordinator};
pub use fetcher::{build_http_client, Fetched, ResourceFetcher};
pub use scheduler::{Frontier, PushOutcome};
pub use transform::{
    collect_assets, rewrite_page, AssetKind, AssetRef, RewriteContext, TransformedPage,
    HYPERLINK_ATTRIBUTES, RESOURCE_ATTRIBUTES,
};
