//! Archive writer implementation
//!
//! This module persists content under the output root. Every write creates
//! the missing parent directories and replaces whatever is already at the
//! target path.

use crate::url::ArchivePath;
use crate::{ArchiveError, WriteError};
use std::path::{Path, PathBuf};

/// Name of the file used to check that the output root is writable
const PROBE_FILE: &str = ".offline-archiver-probe";

/// Writes files inside one output root
#[derive(Debug, Clone)]
pub struct ArchiveWriter {
    root: PathBuf,
}

impl ArchiveWriter {
    /// Creates a writer for the given output root
    ///
    /// The root is created if missing, then checked for writability by
    /// writing and removing a probe file.
    ///
    /// # Returns
    ///
    /// * `Ok(ArchiveWriter)` - The root exists and is writable
    /// * `Err(ArchiveError::OutputRoot)` - The root can not be used
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ArchiveError> {
        let root = root.into();
        let unusable = |source: std::io::Error| ArchiveError::OutputRoot {
            path: root.clone(),
            source,
        };

        std::fs::create_dir_all(&root).map_err(unusable)?;

        let probe = root.join(PROBE_FILE);
        std::fs::write(&probe, b"").map_err(unusable)?;
        std::fs::remove_file(&probe).map_err(unusable)?;

        Ok(Self { root })
    }

    /// Returns the output root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns where an archive path ends up on disk
    pub fn location(&self, path: &ArchivePath) -> PathBuf {
        path.to_fs_path(&self.root)
    }

    /// Writes `bytes` at `path`, overwriting any existing file
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Absolute location of the written file
    /// * `Err(WriteError)` - The path escapes the root or the filesystem failed
    pub async fn write(&self, path: &ArchivePath, bytes: &[u8]) -> Result<PathBuf, WriteError> {
        if path
            .segments()
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(WriteError::OutsideRoot(path.to_string()));
        }

        let location = self.location(path);
        if let Some(parent) = location.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| WriteError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        tokio::fs::write(&location, bytes)
            .await
            .map_err(|source| WriteError::Io {
                path: location.clone(),
                source,
            })?;

        tracing::debug!("Wrote {} bytes to {}", bytes.len(), location.display());
        Ok(location)
    }
}
