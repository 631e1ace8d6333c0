//! Archive module: everything that lands in the output root
//!
//! This module handles:
//! - Writing pages and assets at their archive paths
//! - The bookmark button injected into pages and the bookmarks viewer page

mod bookmarks;
mod writer;

pub use bookmarks::{ADD_BOOKMARK_ENDPOINT, BOOKMARKS_ENDPOINT, BOOKMARKS_PAGE, BOOKMARK_SCRIPT};
pub use writer::ArchiveWriter;
