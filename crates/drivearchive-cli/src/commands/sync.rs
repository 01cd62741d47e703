//! Sync command - Mirror the local archive into Google Drive
//!
//! Provides the `drivearchive sync` CLI command which:
//! 1. Loads and validates configuration
//! 2. Builds the credential store and the Drive provider
//! 3. Runs the MirrorEngine, or only computes the plan with `--dry-run`
//! 4. Displays the plan or the run summary

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use drivearchive_drive::{DriveProvider, ReqwestTransport};
use drivearchive_sync::engine::MirrorEngine;
use drivearchive_sync::filesystem::LocalScanner;
use tracing::info;

use crate::commands::auth::build_credential_store;
use crate::commands::{ensure_valid, load_config};
use crate::output::{get_formatter, OutputFormat};

/// Sync command with clap options
#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Show what would be created without making changes
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncCommand {
    /// Execute the sync command
    pub async fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);

        let config = load_config(config_path)?;
        ensure_valid(&config, formatter.as_ref())?;
        info!(config_path = %config_path.display(), root = %config.sync.root.display(), "Loaded configuration");

        let transport = Arc::new(ReqwestTransport::from_config(&config.http)?);
        let credentials = build_credential_store(&config, transport.clone())?;
        let provider = DriveProvider::new(transport, credentials).with_page_size(config.sync.page_size);

        let root = config.sync.root.as_path();
        let engine = MirrorEngine::new(Arc::new(provider), LocalScanner::new(root));

        if self.dry_run {
            let plan = engine.plan().await.context("Failed to compute plan")?;
            println!("{}", formatter.plan(root, &plan));
        } else {
            let report = engine.run().await.context("Sync failed")?;
            println!("{}", formatter.report(root, &report)?);
        }
        Ok(())
    }
}
