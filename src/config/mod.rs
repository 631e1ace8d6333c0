//! Configuration module for Offline Archiver
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Every key has a default, so an archive can be made
//! without any configuration at all.
//!
//! # Example
//!
//! ```no_run
//! use offline_archiver::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("archiver.toml")).unwrap();
//! println!("Index document: {}", config.archive.index_document);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ArchiveConfig, Config, CrawlerConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{load_config, load_or_default, parse_config};
pub use validation::validate;
