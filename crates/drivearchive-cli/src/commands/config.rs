//! Config command - View and validate DriveArchive configuration
//!
//! Provides the `drivearchive config` CLI command which:
//! 1. Shows the effective configuration (YAML or JSON)
//! 2. Validates the configuration file and reports every error

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;
use drivearchive_core::config::Config;
use tracing::info;

use crate::commands::load_config;
use crate::output::{get_formatter, OutputFormat};

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
}

impl ConfigCommand {
    /// Execute the config command
    pub async fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        match self {
            ConfigCommand::Show => execute_show(config_path, format),
            ConfigCommand::Validate => execute_validate(config_path, format),
        }
    }
}

fn execute_show(config_path: &Path, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);
    let config = load_config(config_path)?;

    info!(config_path = %config_path.display(), "Showing configuration");
    println!("{}", formatter.config(config_path, &config)?);
    Ok(())
}

fn execute_validate(config_path: &Path, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format);

    if !config_path.exists() {
        println!(
            "{}",
            formatter.unreadable_config(config_path, "Configuration file not found")
        );
        anyhow::bail!("Configuration file not found");
    }

    let config = match Config::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            let message = format!("Failed to parse configuration: {e}");
            println!("{}", formatter.unreadable_config(config_path, &message));
            return Err(e.context("Invalid configuration"));
        }
    };

    info!(config_path = %config_path.display(), "Validating configuration");

    let errors = config.validate();
    println!("{}", formatter.validation(config_path, &errors));

    if errors.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("Configuration is invalid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// A configuration whose every referenced path exists
    fn write_valid_config(dir: &TempDir) -> std::path::PathBuf {
        let key = dir.path().join("key.json");
        std::fs::write(&key, "{}").unwrap();

        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            format!(
                "sync:\n  root: {}\nauth:\n  method: service_account\n  service_account_key: {}\n",
                dir.path().display(),
                key.display()
            ),
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn test_validate_accepts_complete_config() {
        let dir = TempDir::new().unwrap();
        let path = write_valid_config(&dir);

        ConfigCommand::Validate
            .execute(&path, OutputFormat::Json)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_validate_reports_invalid_values() {
        let dir = TempDir::new().unwrap();
        let path = write_valid_config(&dir);
        let mut yaml = std::fs::read_to_string(&path).unwrap();
        yaml.push_str("logging:\n  level: loud\n");
        std::fs::write(&path, yaml).unwrap();

        let err = ConfigCommand::Validate
            .execute(&path, OutputFormat::Json)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Configuration is invalid");
    }

    #[tokio::test]
    async fn test_validate_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let result = ConfigCommand::Validate
            .execute(&dir.path().join("absent.yaml"), OutputFormat::Human)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_validate_unparseable_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "http:\n  connect_timeout_secs: soon\n").unwrap();

        let err = ConfigCommand::Validate
            .execute(&path, OutputFormat::Json)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid configuration");
    }

    #[tokio::test]
    async fn test_show_works_without_a_file() {
        let dir = TempDir::new().unwrap();
        ConfigCommand::Show
            .execute(&dir.path().join("absent.yaml"), OutputFormat::Human)
            .await
            .unwrap();
    }
}
