//! CLI subcommands

pub mod auth;
pub mod config;
pub mod sync;

use std::path::Path;

use anyhow::{Context, Result};
use drivearchive_core::config::Config;

use crate::output::OutputFormatter;

/// Loads the configuration at `path`
///
/// A missing file yields the defaults; a file that exists but does not
/// parse is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    Config::load(path).with_context(|| format!("Failed to parse configuration {}", path.display()))
}

/// Reports validation errors and fails if there are any
pub fn ensure_valid(config: &Config, formatter: &dyn OutputFormatter) -> Result<()> {
    let errors = config.validate();
    if errors.is_empty() {
        return Ok(());
    }

    for error in &errors {
        eprintln!("{}", formatter.error(&error.to_string()));
    }
    anyhow::bail!(
        "Configuration has {} error{}; run 'drivearchive config validate' for details",
        errors.len(),
        if errors.len() == 1 { "" } else { "s" }
    )
}
