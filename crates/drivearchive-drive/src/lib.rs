//! DriveArchive Drive - Google Drive API client
//!
//! Provides async building blocks for:
//! - Bearer tokens from a service-account JWT assertion or a stored refresh token
//! - A single-flight credential cache shared by every request of a run
//! - Paged file listing
//! - Protocol-exact folder and multipart upload requests
//!
//! ## Modules
//!
//! - [`auth`] - Credential sources (JWT assertion, stored refresh token)
//! - [`client`] - Endpoints and the `reqwest` transport
//! - [`credential`] - Credential cache with single-flight refresh
//! - [`listing`] - Listing request and response decoding
//! - [`provider`] - [`IDriveProvider`](drivearchive_core::ports::IDriveProvider) implementation
//! - [`upload`] - Folder and multipart upload request encoding

pub mod auth;
pub mod client;
pub mod credential;
pub mod listing;
pub mod provider;
pub mod upload;

use std::path::PathBuf;

use drivearchive_core::ports::TransportError;
use thiserror::Error;

pub use auth::{ServiceAccountKey, ServiceAccountSource, StoredCredentialSource};
pub use client::{DriveEndpoints, ReqwestTransport};
pub use credential::{Credential, CredentialSource, CredentialState, CredentialStore};
pub use provider::DriveProvider;
pub use upload::RequestEncoder;

/// Errors that can occur when talking to Google Drive
#[derive(Debug, Error)]
pub enum DriveError {
    /// Key file, stored credential or client secrets missing or unparsable
    #[error("Credential load failed: {0}")]
    CredentialLoad(String),

    /// Token endpoint rejected the grant or answered without `access_token`
    #[error("Token exchange failed: {0}")]
    TokenExchange(String),

    /// The credential store gave up after an earlier unrecoverable failure
    #[error("Credential unavailable: {0}")]
    CredentialUnavailable(String),

    /// No response was received
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// File exceeds the multipart upload limit
    #[error("{} is {size} bytes, upload limit is {limit} bytes", .path.display())]
    SizeLimit {
        path: PathBuf,
        size: u64,
        limit: u64,
    },

    /// Local file could not be read for upload
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A JSON response lacked required fields or was not JSON at all
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The API answered with a non-2xx status
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
}

impl DriveError {
    /// Whether the caller may retry the same operation later
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_retryable(),
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Whether the failure concerns a single plan entry only
    ///
    /// Such failures are recorded and the rest of the plan continues.
    #[must_use]
    pub fn is_entry_local(&self) -> bool {
        matches!(self, Self::SizeLimit { .. } | Self::Io { .. })
    }
}
