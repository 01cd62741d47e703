//! Remote listing resources and the resolved node graph
//!
//! Drive returns a flat list of resources, each carrying the IDs of its
//! parents. Building the graph is a two-pass, pure transformation:
//!
//! 1. [`build_name_index`] maps every listed ID to its name.
//! 2. [`build_nodes`] expands each resource into one [`RemoteNode`] per
//!    parent, resolving the parent's name through the index.
//!
//! A parent ID that is not part of the listing (typically the Drive root
//! folder, which `files.list` never returns) stays attached to the node
//! with an unknown name. No placeholder node is invented for it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::newtypes::RemoteId;

// ============================================================================
// Listing snapshot
// ============================================================================

/// A file or folder exactly as the listing call returned it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteResource {
    /// Unique resource ID
    pub id: RemoteId,
    /// Display name, not unique
    pub name: String,
    /// Parent IDs in listing order (zero, one or many)
    pub parents: Vec<RemoteId>,
}

impl RemoteResource {
    /// Convenience constructor used by adapters and tests
    pub fn new(id: RemoteId, name: impl Into<String>, parents: Vec<RemoteId>) -> Self {
        Self {
            id,
            name: name.into(),
            parents,
        }
    }
}

/// Non-owning reference from a node to one of its parents
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentRef {
    /// Parent resource ID
    pub id: RemoteId,
    /// Parent name from the same snapshot, `None` when the ID was not listed
    pub name: Option<String>,
}

/// One view of a resource under a single resolved parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteNode {
    pub id: RemoteId,
    pub name: String,
    pub parent: Option<ParentRef>,
}

impl RemoteNode {
    /// Name of the parent as seen by the reconciliation engine
    ///
    /// Parentless nodes and nodes whose parent was not listed both report
    /// `None`.
    #[must_use]
    pub fn parent_name(&self) -> Option<&str> {
        self.parent.as_ref().and_then(|p| p.name.as_deref())
    }
}

// ============================================================================
// Graph construction
// ============================================================================

/// Map every listed resource ID to its name
///
/// Duplicate IDs are resolved last-write-wins.
pub fn build_name_index(resources: &[RemoteResource]) -> HashMap<RemoteId, String> {
    resources
        .iter()
        .map(|r| (r.id.clone(), r.name.clone()))
        .collect()
}

/// Expand resources into per-parent node views
///
/// # Arguments
/// * `resources` - The flat listing, in listing order
/// * `name_index` - The ID to name map from [`build_name_index`]
///
/// # Returns
/// A [`RemoteGraph`] keyed by resource ID that iterates in listing order
pub fn build_nodes(
    resources: &[RemoteResource],
    name_index: &HashMap<RemoteId, String>,
) -> RemoteGraph {
    let mut graph = RemoteGraph::default();

    for resource in resources {
        let nodes = if resource.parents.is_empty() {
            vec![RemoteNode {
                id: resource.id.clone(),
                name: resource.name.clone(),
                parent: None,
            }]
        } else {
            resource
                .parents
                .iter()
                .map(|parent_id| RemoteNode {
                    id: resource.id.clone(),
                    name: resource.name.clone(),
                    parent: Some(ParentRef {
                        id: parent_id.clone(),
                        name: name_index.get(parent_id).cloned(),
                    }),
                })
                .collect()
        };

        graph.insert(resource.id.clone(), nodes);
    }

    graph
}

/// Resolved remote tree, keyed by resource ID
///
/// Holds a collection of node views per resource rather than a single
/// tree. Iteration follows the order in which IDs first appeared in the
/// listing, so every consumer sees the same deterministic order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteGraph {
    order: Vec<RemoteId>,
    nodes: HashMap<RemoteId, Vec<RemoteNode>>,
}

impl RemoteGraph {
    /// Build the graph in one step from a listing snapshot
    pub fn from_resources(resources: &[RemoteResource]) -> Self {
        let index = build_name_index(resources);
        build_nodes(resources, &index)
    }

    /// Insert or replace the node views for `id`
    ///
    /// A replaced ID keeps its original position in the iteration order.
    pub fn insert(&mut self, id: RemoteId, nodes: Vec<RemoteNode>) {
        if self.nodes.insert(id.clone(), nodes).is_none() {
            self.order.push(id);
        }
    }

    /// Node views for a resource ID
    #[must_use]
    pub fn get(&self, id: &RemoteId) -> Option<&[RemoteNode]> {
        self.nodes.get(id).map(Vec::as_slice)
    }

    /// Iterate `(id, nodes)` pairs in listing order
    pub fn iter(&self) -> impl Iterator<Item = (&RemoteId, &[RemoteNode])> {
        self.order
            .iter()
            .filter_map(|id| self.nodes.get(id).map(|n| (id, n.as_slice())))
    }

    /// Iterate every node view in listing order
    pub fn nodes(&self) -> impl Iterator<Item = &RemoteNode> {
        self.iter().flat_map(|(_, nodes)| nodes.iter())
    }

    /// Number of distinct resource IDs
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
