//! URL handling module for Offline Archiver
//!
//! This module provides site scoping, reference resolution, visit keys, and
//! the mapping from web URLs to paths inside the archive.

mod domain;
mod mapper;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, SiteScope};
pub use mapper::{relativize, sanitize_segment, ArchivePath, PathMapper, PathRole, MAX_PATH_LENGTH};
pub use normalize::{parse_seed, resolve_reference, visit_key, without_fragment};
