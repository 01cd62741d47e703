//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the domain core
//! depends on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IHttpTransport`] - Executes a fully encoded HTTP request
//! - [`IDriveProvider`] - Remote listing and creation operations

pub mod drive_provider;
pub mod http_transport;

pub use drive_provider::{IDriveProvider, ListPage};
pub use http_transport::{ApiRequest, ApiResponse, HttpMethod, IHttpTransport, TransportError};
