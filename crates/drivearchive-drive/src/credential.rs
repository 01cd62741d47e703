//! Credential cache with single-flight refresh
//!
//! [`CredentialStore`] hands out bearer tokens for every request of a run.
//! It caches the current [`Credential`] and asks its [`CredentialSource`]
//! for a new one only when the cached token is missing or about to expire.
//!
//! ## State machine
//!
//! ```text
//! Uninitialized ─┐
//!                ├─> Refreshing ─> Valid ─> Expired ─> Refreshing ─> ...
//! Expired ───────┘        │
//!                         └─> Failed (terminal)
//! ```
//!
//! Refreshing is exactly "a caller holds the refresh lock". The lock is a
//! `tokio::sync::Mutex` guard scoped to [`CredentialStore::get_token`], so it
//! is released on success, on error, and when the calling future is dropped
//! mid-refresh. A dropped refresh leaves the previous state in place.
//!
//! Credential-load and token-exchange failures move the store to Failed;
//! every later call fails fast without contacting the source. Transport
//! failures leave the state untouched so the caller may retry.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::DriveError;

// ============================================================================
// Credential
// ============================================================================

/// A bearer token and its expiry
#[derive(Clone)]
pub struct Credential {
    /// Bearer token for API requests
    pub access_token: String,
    /// When the token expires, `None` for tokens that never expire
    pub expires_at: Option<DateTime<Utc>>,
    /// Refresh token material, when the source uses one
    pub refresh_token: Option<String>,
}

impl Credential {
    /// Returns true if the access token has expired
    pub fn is_expired(&self) -> bool {
        self.expires_within(Duration::zero())
    }

    /// Returns true if the access token will expire within the given duration
    pub fn expires_within(&self, duration: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() + duration >= expires_at,
            None => false,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Something that can mint a fresh [`Credential`]
#[async_trait::async_trait]
pub trait CredentialSource: Send + Sync {
    /// Obtains a new credential
    ///
    /// # Errors
    /// - [`DriveError::CredentialLoad`] if key material cannot be loaded or used
    /// - [`DriveError::TokenExchange`] if the token endpoint refuses the grant
    /// - [`DriveError::Transport`] if the endpoint could not be reached
    async fn fetch(&self) -> Result<Credential, DriveError>;

    /// Short label for logs
    fn kind(&self) -> &'static str;
}

// ============================================================================
// CredentialStore
// ============================================================================

/// Observable state of a [`CredentialStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    Uninitialized,
    Valid,
    Expired,
    Refreshing,
    Failed,
}

enum Slot {
    Empty,
    Ready(Credential),
    Failed(String),
}

/// Shared, single-flight token cache
pub struct CredentialStore {
    source: Arc<dyn CredentialSource>,
    refresh_margin: Duration,
    slot: Mutex<Slot>,
    refreshes: AtomicU64,
}

impl CredentialStore {
    /// Creates a store in the Uninitialized state
    ///
    /// # Arguments
    /// * `source` - Where fresh credentials come from
    /// * `refresh_margin` - Tokens expiring within this window count as expired
    pub fn new(source: Arc<dyn CredentialSource>, refresh_margin: std::time::Duration) -> Self {
        Self {
            source,
            refresh_margin: Duration::from_std(refresh_margin).unwrap_or_else(|_| Duration::zero()),
            slot: Mutex::new(Slot::Empty),
            refreshes: AtomicU64::new(0),
        }
    }

    /// Returns a valid bearer token, refreshing first if needed
    ///
    /// Concurrent callers wait on the same refresh instead of starting
    /// their own.
    pub async fn get_token(&self) -> Result<String, DriveError> {
        let mut slot = self.slot.lock().await;

        match &*slot {
            Slot::Failed(reason) => {
                return Err(DriveError::CredentialUnavailable(reason.clone()));
            }
            Slot::Ready(credential) if !credential.expires_within(self.refresh_margin) => {
                return Ok(credential.access_token.clone());
            }
            Slot::Ready(_) => debug!(kind = self.source.kind(), "Cached token expired"),
            Slot::Empty => debug!(kind = self.source.kind(), "No cached token"),
        }

        self.refreshes.fetch_add(1, Ordering::Relaxed);
        match self.source.fetch().await {
            Ok(credential) => {
                info!(
                    kind = self.source.kind(),
                    expires_at = ?credential.expires_at,
                    "Obtained access token"
                );
                let token = credential.access_token.clone();
                *slot = Slot::Ready(credential);
                Ok(token)
            }
            Err(err) => {
                if matches!(
                    err,
                    DriveError::CredentialLoad(_) | DriveError::TokenExchange(_)
                ) {
                    warn!(kind = self.source.kind(), error = %err, "Credential store failed");
                    *slot = Slot::Failed(err.to_string());
                } else {
                    warn!(kind = self.source.kind(), error = %err, "Token refresh interrupted");
                }
                Err(err)
            }
        }
    }

    /// Current state, without blocking
    pub fn state(&self) -> CredentialState {
        match self.slot.try_lock() {
            Err(_) => CredentialState::Refreshing,
            Ok(slot) => match &*slot {
                Slot::Empty => CredentialState::Uninitialized,
                Slot::Failed(_) => CredentialState::Failed,
                Slot::Ready(c) if c.expires_within(self.refresh_margin) => CredentialState::Expired,
                Slot::Ready(_) => CredentialState::Valid,
            },
        }
    }

    /// Number of times the source has been asked for a credential
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }
}
