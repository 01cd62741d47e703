//! DriveArchive Core - Domain logic for mirroring a local tree into Google Drive
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `LocalEntry`, `RemoteResource`, `RemoteNode`, `PlanEntry`
//! - **Graph builder** - reconstructs parent links from a flat remote listing
//! - **Reconciliation** - compares the local tree against the remote graph
//!   and produces a depth-ordered creation plan
//! - **Port definitions** - Traits for adapters: `IHttpTransport`, `IDriveProvider`
//!
//! # Architecture
//!
//! The domain module is pure: no I/O, no clocks, no network. Ports define
//! trait interfaces that adapter crates implement, and the sync crate wires
//! both together into a single run.

pub mod config;
pub mod domain;
pub mod ports;
