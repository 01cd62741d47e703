//! Local tree scanner
//!
//! Produces a snapshot of every file and directory below the sync root.
//!
//! ## Design Decisions
//!
//! - **Snapshot, not stream**: The whole tree is collected before diffing so
//!   the plan is computed against one consistent view.
//! - **Blocking walk off the runtime**: `walkdir` is synchronous, so the walk
//!   runs inside `spawn_blocking`.
//! - **Symlinks are not followed**: A link is reported as a non-directory
//!   entry under its own name.
//! - **Path order**: Entries come back sorted by path, which places every
//!   directory before its contents.

use std::path::{Path, PathBuf};

use drivearchive_core::domain::LocalEntry;
use tracing::{debug, instrument, warn};
use walkdir::WalkDir;

use crate::SyncError;

/// Scanner rooted at the local sync directory
#[derive(Debug, Clone)]
pub struct LocalScanner {
    root: PathBuf,
}

impl LocalScanner {
    /// Create a scanner for `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The sync root this scanner walks
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the sync root and return every entry below it
    ///
    /// The root itself is not part of the result.
    ///
    /// # Errors
    /// - [`SyncError::PathNotFound`] if the root is missing or not a directory
    /// - [`SyncError::IoError`] if any part of the tree cannot be read
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn scan(&self) -> Result<Vec<LocalEntry>, SyncError> {
        let root = self.root.clone();
        let entries = tokio::task::spawn_blocking(move || scan_blocking(&root))
            .await
            .map_err(|e| SyncError::IoError(std::io::Error::other(e)))??;

        debug!(entries = entries.len(), "Local scan complete");
        Ok(entries)
    }
}

fn scan_blocking(root: &Path) -> Result<Vec<LocalEntry>, SyncError> {
    if !root.is_dir() {
        return Err(SyncError::PathNotFound(root.to_path_buf()));
    }

    let mut entries = Vec::new();
    for item in WalkDir::new(root).min_depth(1).follow_links(false) {
        let item = item.map_err(|e| {
            warn!(error = %e, "Failed to read local tree");
            SyncError::IoError(std::io::Error::other(e))
        })?;

        let is_dir = item.file_type().is_dir();
        entries.push(LocalEntry::new(root, item.into_path(), is_dir)?);
    }

    entries.sort_by(|a, b| a.path().cmp(b.path()));
    Ok(entries)
}
