//! Local tree snapshot entries
//!
//! A [`LocalEntry`] is one file or directory found under the sync root at
//! the start of a run. Entries are immutable: a run takes the snapshot once
//! and never refreshes it.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// A file or directory below the sync root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalEntry {
    path: PathBuf,
    relative_path: PathBuf,
    name: String,
    parent_name: Option<String>,
    is_dir: bool,
}

impl LocalEntry {
    /// Create an entry for `path`, which must lie strictly below `root`
    ///
    /// The leaf name is the last path segment. The parent leaf name is the
    /// segment before it, or `None` when the entry sits directly in `root`.
    ///
    /// # Errors
    /// - [`DomainError::PathNotInSyncRoot`] if `path` is not below `root`
    /// - [`DomainError::InvalidPath`] if `path` is the root itself, contains
    ///   `..` segments, or is not valid UTF-8
    pub fn new(root: &Path, path: PathBuf, is_dir: bool) -> Result<Self, DomainError> {
        let relative_path = path
            .strip_prefix(root)
            .map_err(|_| DomainError::PathNotInSyncRoot(path.display().to_string()))?
            .to_path_buf();

        if relative_path.as_os_str().is_empty() {
            return Err(DomainError::InvalidPath(format!(
                "sync root is not an entry: {}",
                path.display()
            )));
        }

        if relative_path
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(DomainError::InvalidPath(format!(
                "path must be normalized: {}",
                path.display()
            )));
        }

        let name = leaf_name(&relative_path)?;
        let parent_name = match relative_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => Some(leaf_name(parent)?),
            _ => None,
        };

        Ok(Self {
            path,
            relative_path,
            name,
            parent_name,
            is_dir,
        })
    }

    /// Absolute path of the entry
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path relative to the sync root
    #[must_use]
    pub fn relative_path(&self) -> &Path {
        &self.relative_path
    }

    /// Leaf name (last path segment)
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Leaf name of the containing directory, `None` at the root level
    #[must_use]
    pub fn parent_name(&self) -> Option<&str> {
        self.parent_name.as_deref()
    }

    /// Whether the entry is a directory
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.is_dir
    }

    /// Number of path segments below the sync root (root-level entries are 1)
    #[must_use]
    pub fn depth(&self) -> usize {
        self.relative_path.components().count()
    }
}

fn leaf_name(path: &Path) -> Result<String, DomainError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| DomainError::InvalidPath(format!("not valid UTF-8: {}", path.display())))
}
