//! Mirror engine
//!
//! The [`MirrorEngine`] pushes the local sync root into Drive, one way only.
//!
//! ## Sync Flow
//!
//! 1. **Scan**: Snapshot every entry below the sync root
//! 2. **List**: Fetch the complete remote listing, following page tokens
//! 3. **Diff**: Build the remote graph and compute the depth-ordered plan
//! 4. **Execute**: Create folders and upload files strictly in plan order,
//!    feeding each created folder's ID to the entries below it
//!
//! Stages run sequentially and never overlap.
//!
//! ## Failure Handling
//!
//! Failures that concern a single entry (file over the upload ceiling,
//! unreadable file) are recorded in the [`MirrorReport`] and the plan goes
//! on. Anything else stops the run with [`SyncError::Unrecoverable`];
//! entries created so far stay created and the next run skips them.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use drivearchive_core::domain::{diff, PlanEntry, RemoteGraph, RemoteId};
use drivearchive_core::ports::IDriveProvider;
use drivearchive_drive::DriveError;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::filesystem::LocalScanner;
use crate::{RunStage, SyncError};

// ============================================================================
// MirrorReport
// ============================================================================

/// An entry that was left out of the run, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: String,
}

/// Summary of a completed mirror run
#[derive(Debug, Clone, Default, Serialize)]
pub struct MirrorReport {
    /// Number of plan entries the run started with
    pub planned: usize,
    /// Folders created remotely
    pub folders_created: u32,
    /// Files uploaded
    pub files_uploaded: u32,
    /// Entries that were not created (non-fatal)
    pub skipped: Vec<SkippedEntry>,
    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,
}

impl MirrorReport {
    /// Whether every planned entry was created
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

// ============================================================================
// MirrorEngine
// ============================================================================

/// One-way mirror from the local sync root into Drive
pub struct MirrorEngine {
    provider: Arc<dyn IDriveProvider>,
    scanner: LocalScanner,
}

impl MirrorEngine {
    /// Creates an engine for `scanner`'s root, talking to `provider`
    pub fn new(provider: Arc<dyn IDriveProvider>, scanner: LocalScanner) -> Self {
        Self { provider, scanner }
    }

    /// Computes the plan without creating anything
    ///
    /// # Errors
    /// [`SyncError::Unrecoverable`] at [`RunStage::Scan`] or
    /// [`RunStage::List`].
    #[instrument(skip(self), fields(root = %self.scanner.root().display()))]
    pub async fn plan(&self) -> Result<Vec<PlanEntry>, SyncError> {
        let local = self
            .scanner
            .scan()
            .await
            .map_err(|e| SyncError::unrecoverable(RunStage::Scan, e))?;

        let resources = self
            .provider
            .list_all()
            .await
            .map_err(|e| SyncError::unrecoverable(RunStage::List, e))?;

        let graph = RemoteGraph::from_resources(&resources);
        let plan = diff(&local, &graph);

        info!(
            local = local.len(),
            remote = graph.len(),
            planned = plan.len(),
            "Computed mirror plan"
        );
        Ok(plan)
    }

    /// Runs a full mirror: plan, then execute
    pub async fn run(&self) -> Result<MirrorReport, SyncError> {
        let started = Instant::now();
        let plan = self.plan().await?;
        let mut report = self.execute(&plan).await?;
        report.duration_ms = started.elapsed().as_millis() as u64;

        info!(
            folders_created = report.folders_created,
            files_uploaded = report.files_uploaded,
            skipped = report.skipped.len(),
            duration_ms = report.duration_ms,
            "Mirror run complete"
        );
        Ok(report)
    }

    /// Executes `plan` in order
    ///
    /// A folder created here takes precedence over a parent ID the diff
    /// found by name, since the name search can hit an unrelated folder.
    ///
    /// # Errors
    /// [`SyncError::Unrecoverable`] at [`RunStage::Execute`] for any failure
    /// that is not local to one entry.
    #[instrument(skip(self, plan), fields(entries = plan.len()))]
    pub async fn execute(&self, plan: &[PlanEntry]) -> Result<MirrorReport, SyncError> {
        let started = Instant::now();
        let mut report = MirrorReport {
            planned: plan.len(),
            ..MirrorReport::default()
        };
        let mut created: HashMap<PathBuf, RemoteId> = HashMap::new();

        for entry in plan {
            let resolved = match entry.parent_path().and_then(|p| created.get(p)) {
                Some(parent_id) => entry.with_parent_id(parent_id.clone()),
                None if entry.has_pending_parent() => {
                    warn!(path = %entry.path.display(), "Parent folder was not created, skipping");
                    report.skipped.push(SkippedEntry {
                        path: entry.path.clone(),
                        reason: format!(
                            "parent folder '{}' was not created",
                            entry.parent_name.as_deref().unwrap_or_default()
                        ),
                    });
                    continue;
                }
                None => entry.clone(),
            };

            match self.provider.create(&resolved).await {
                Ok(resource) => {
                    debug!(path = %entry.path.display(), id = %resource.id, "Created");
                    if entry.is_dir {
                        created.insert(entry.path.clone(), resource.id);
                        report.folders_created += 1;
                    } else {
                        report.files_uploaded += 1;
                    }
                }
                Err(err) if is_entry_local(&err) => {
                    warn!(path = %entry.path.display(), error = %format!("{err:#}"), "Skipping entry");
                    report.skipped.push(SkippedEntry {
                        path: entry.path.clone(),
                        reason: root_cause(&err),
                    });
                }
                Err(err) => {
                    return Err(SyncError::unrecoverable(RunStage::Execute, err));
                }
            }
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        Ok(report)
    }
}

fn is_entry_local(err: &anyhow::Error) -> bool {
    err.downcast_ref::<DriveError>()
        .is_some_and(DriveError::is_entry_local)
}

fn root_cause(err: &anyhow::Error) -> String {
    err.downcast_ref::<DriveError>()
        .map_or_else(|| err.root_cause().to_string(), ToString::to_string)
}
