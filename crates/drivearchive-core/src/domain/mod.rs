//! Domain entities and business logic
//!
//! This module contains the core domain types for DriveArchive:
//! - Newtypes for type-safe remote identifiers
//! - Local tree snapshot entries
//! - Remote listing resources and the resolved node graph
//! - The creation plan and the reconciliation algorithm
//! - Domain-specific error types

pub mod errors;
pub mod local;
pub mod newtypes;
pub mod plan;
pub mod remote;

// Re-export commonly used types
pub use errors::DomainError;
pub use local::LocalEntry;
pub use newtypes::RemoteId;
pub use plan::{diff, PlanEntry};
pub use remote::{build_name_index, build_nodes, ParentRef, RemoteGraph, RemoteNode, RemoteResource};
