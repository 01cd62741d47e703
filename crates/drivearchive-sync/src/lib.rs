//! DriveArchive Sync - One-way mirroring of a local tree into Drive
//!
//! Provides:
//! - A snapshot scanner for the local sync root
//! - The mirror engine: list, diff, then create in plan order
//!
//! ## Modules
//!
//! - [`engine`] - Mirror engine orchestrating a single run
//! - [`filesystem`] - Local tree scanner

pub mod engine;
pub mod filesystem;

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Pipeline stage in which a run failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    /// Scanning the local tree
    Scan,
    /// Fetching the remote listing (includes obtaining a token)
    List,
    /// Creating folders and uploading files
    Execute,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Scan => "scan",
            Self::List => "list",
            Self::Execute => "execute",
        })
    }
}

/// Errors that can occur during a mirror run
#[derive(Debug, Error)]
pub enum SyncError {
    /// An I/O error occurred while reading the local tree
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The sync root does not exist or is not a directory
    #[error("Path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    /// A domain-level error propagated from drivearchive-core
    #[error("Domain error: {0}")]
    DomainError(#[from] drivearchive_core::domain::DomainError),

    /// The run cannot continue; carries the original cause
    #[error("Mirror run failed during {stage}: {source}")]
    Unrecoverable {
        stage: RunStage,
        #[source]
        source: anyhow::Error,
    },
}

impl SyncError {
    /// Wraps any error as unrecoverable at `stage`
    pub fn unrecoverable(stage: RunStage, source: impl Into<anyhow::Error>) -> Self {
        Self::Unrecoverable {
            stage,
            source: source.into(),
        }
    }

    /// Stage at which the run stopped, for unrecoverable errors
    pub fn stage(&self) -> Option<RunStage> {
        match self {
            Self::Unrecoverable { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}
