//! Creation plan and the reconciliation algorithm
//!
//! [`diff`] compares a local snapshot against the resolved remote graph by
//! `(name, parent name)` equality. IDs play no part in matching: two local
//! entries that share a name under differently named parents are told
//! apart, but two parents with the same name are not. That limitation is
//! accepted.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::local::LocalEntry;
use super::newtypes::RemoteId;
use super::remote::RemoteGraph;

/// A single remote creation the run still has to perform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanEntry {
    /// Name to create remotely
    pub name: String,
    /// Absolute local path of the source file or directory
    pub path: PathBuf,
    /// Leaf name of the local parent directory, `None` at the root level
    pub parent_name: Option<String>,
    /// Remote ID of the parent folder when already known
    ///
    /// `None` together with `Some(parent_name)` means the parent is created
    /// earlier in the same plan and its ID is only known after execution.
    pub parent_id: Option<RemoteId>,
    /// Whether the entry creates a folder
    pub is_dir: bool,
}

impl PlanEntry {
    /// Number of path segments, used for ordering
    #[must_use]
    pub fn depth(&self) -> usize {
        self.path.components().count()
    }

    /// Whether the parent folder must be created by an earlier entry
    #[must_use]
    pub fn has_pending_parent(&self) -> bool {
        self.parent_id.is_none() && self.parent_name.is_some()
    }

    /// Local path of the parent directory
    #[must_use]
    pub fn parent_path(&self) -> Option<&Path> {
        self.path.parent()
    }

    /// Copy of this entry with the parent ID filled in
    #[must_use]
    pub fn with_parent_id(&self, parent_id: RemoteId) -> Self {
        Self {
            parent_id: Some(parent_id),
            ..self.clone()
        }
    }
}

/// `(name, parent name, id)` view of a remote node
struct Triple<'a> {
    name: &'a str,
    parent_name: Option<&'a str>,
    id: &'a RemoteId,
}

/// Compute the ordered creation plan
///
/// For each local entry the remote triples are searched in graph order for
/// one with the same name and parent name (`None` matches `None`). Matched
/// entries produce nothing. Unmatched entries produce a [`PlanEntry`] whose
/// parent ID is that of the first remote node named like the local parent.
/// The result is stable-sorted by path depth so ancestors precede
/// descendants.
///
/// Pure and deterministic: the same inputs always yield the same plan.
pub fn diff(local_entries: &[LocalEntry], remote: &RemoteGraph) -> Vec<PlanEntry> {
    let triples: Vec<Triple<'_>> = remote
        .nodes()
        .map(|node| Triple {
            name: node.name.as_str(),
            parent_name: node.parent_name(),
            id: &node.id,
        })
        .collect();

    let mut plan: Vec<PlanEntry> = local_entries
        .iter()
        .filter(|entry| {
            !triples
                .iter()
                .any(|t| t.name == entry.name() && t.parent_name == entry.parent_name())
        })
        .map(|entry| {
            let parent_id = entry.parent_name().and_then(|parent| {
                triples
                    .iter()
                    .find(|t| t.name == parent)
                    .map(|t| t.id.clone())
            });

            PlanEntry {
                name: entry.name().to_string(),
                path: entry.path().to_path_buf(),
                parent_name: entry.parent_name().map(str::to_string),
                parent_id,
                is_dir: entry.is_dir(),
            }
        })
        .collect();

    plan.sort_by_key(PlanEntry::depth);
    plan
}
