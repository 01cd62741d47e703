//! Rendering of command results
//!
//! Each command result has a human and a JSON rendering. Formatters return
//! the rendered document and the command decides where it is printed, so
//! stdout carries exactly one document per command in `--json` mode.

use std::path::Path;

use anyhow::{Context, Result};
use drivearchive_core::config::{Config, ValidationError};
use drivearchive_core::domain::PlanEntry;
use drivearchive_drive::CredentialState;
use drivearchive_sync::engine::MirrorReport;
use serde_json::json;

/// Output format selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Human,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

/// Renders command results
pub trait OutputFormatter {
    /// The dry-run plan, in creation order
    fn plan(&self, root: &Path, plan: &[PlanEntry]) -> String;

    /// The summary of a completed mirror run
    fn report(&self, root: &Path, report: &MirrorReport) -> Result<String>;

    /// A successful `auth check`
    fn authenticated(&self, method: &str, state: CredentialState) -> String;

    /// The effective configuration
    fn config(&self, config_path: &Path, config: &Config) -> Result<String>;

    /// The outcome of `config validate`
    fn validation(&self, config_path: &Path, errors: &[ValidationError]) -> String;

    /// A configuration file that is missing or does not parse
    fn unreadable_config(&self, config_path: &Path, message: &str) -> String;

    /// A failure reported before the command gives up
    fn error(&self, message: &str) -> String;
}

// ============================================================================
// Human
// ============================================================================

/// Human-readable output with status marks and indentation
pub struct HumanFormatter;

impl OutputFormatter for HumanFormatter {
    fn plan(&self, root: &Path, plan: &[PlanEntry]) -> String {
        if plan.is_empty() {
            return "\u{2713} Dry run: remote is up to date".to_string();
        }

        let mut lines = vec![format!(
            "\u{2713} Dry run: {} entr{} would be created",
            plan.len(),
            if plan.len() == 1 { "y" } else { "ies" }
        )];
        lines.extend(plan.iter().map(|entry| format!("  {}", describe_entry(root, entry))));
        lines.join("\n")
    }

    fn report(&self, root: &Path, report: &MirrorReport) -> Result<String> {
        let mut lines = vec![
            format!(
                "\u{2713} Sync completed in {:.1}s",
                report.duration_ms as f64 / 1000.0
            ),
            format!("  Folders created: {}", report.folders_created),
            format!("  Files uploaded:  {}", report.files_uploaded),
        ];
        lines.extend(report.skipped.iter().map(|skipped| {
            format!(
                "\u{26a0} Skipped {}: {}",
                relative(root, &skipped.path),
                skipped.reason
            )
        }));
        Ok(lines.join("\n"))
    }

    fn authenticated(&self, method: &str, _state: CredentialState) -> String {
        format!("\u{2713} Authenticated ({method})")
    }

    fn config(&self, config_path: &Path, config: &Config) -> Result<String> {
        let yaml =
            serde_yaml::to_string(config).context("Failed to serialize configuration to YAML")?;

        let mut lines = vec![
            format!("\u{2713} Configuration ({})", config_path.display()),
            String::new(),
        ];
        lines.extend(yaml.lines().map(|line| format!("  {line}")));
        Ok(lines.join("\n"))
    }

    fn validation(&self, config_path: &Path, errors: &[ValidationError]) -> String {
        let file = format!("  File: {}", config_path.display());
        if errors.is_empty() {
            return format!("\u{2713} Configuration is valid\n{file}");
        }

        let mut lines = vec![
            format!(
                "\u{2717} Configuration has {} error{}:",
                errors.len(),
                if errors.len() == 1 { "" } else { "s" }
            ),
            file,
            String::new(),
        ];
        lines.extend(
            errors
                .iter()
                .map(|error| format!("    {} - {}", error.field, error.message)),
        );
        lines.join("\n")
    }

    fn unreadable_config(&self, config_path: &Path, message: &str) -> String {
        format!(
            "\u{2717} Error: {message}\n  File: {}",
            config_path.display()
        )
    }

    fn error(&self, message: &str) -> String {
        format!("\u{2717} Error: {message}")
    }
}

// ============================================================================
// JSON
// ============================================================================

/// JSON output; one pretty-printed document per result
pub struct JsonFormatter;

impl JsonFormatter {
    fn pretty(value: &serde_json::Value) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    }
}

impl OutputFormatter for JsonFormatter {
    fn plan(&self, root: &Path, plan: &[PlanEntry]) -> String {
        Self::pretty(&plan_json(root, plan))
    }

    fn report(&self, _root: &Path, report: &MirrorReport) -> Result<String> {
        serde_json::to_string_pretty(report).context("Failed to serialize run summary")
    }

    fn authenticated(&self, method: &str, state: CredentialState) -> String {
        Self::pretty(&json!({
            "authenticated": true,
            "method": method,
            "state": state_name(state),
        }))
    }

    fn config(&self, _config_path: &Path, config: &Config) -> Result<String> {
        serde_json::to_string_pretty(config).context("Failed to serialize configuration to JSON")
    }

    fn validation(&self, config_path: &Path, errors: &[ValidationError]) -> String {
        let errors: Vec<String> = errors.iter().map(ToString::to_string).collect();
        Self::pretty(&json!({
            "valid": errors.is_empty(),
            "config_path": config_path.display().to_string(),
            "errors": errors,
        }))
    }

    fn unreadable_config(&self, config_path: &Path, message: &str) -> String {
        Self::pretty(&json!({
            "valid": false,
            "config_path": config_path.display().to_string(),
            "errors": [message],
        }))
    }

    fn error(&self, message: &str) -> String {
        json!({"success": false, "error": message}).to_string()
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    if format.is_json() {
        Box::new(JsonFormatter)
    } else {
        Box::new(HumanFormatter)
    }
}

/// One plan line, e.g. `file   a/b.mp3 (in 'a', created first)`
fn describe_entry(root: &Path, entry: &PlanEntry) -> String {
    let kind = if entry.is_dir { "folder" } else { "file  " };
    let parent = match (&entry.parent_name, &entry.parent_id) {
        (None, _) => String::new(),
        (Some(name), Some(id)) => format!(" (in '{name}', {id})"),
        (Some(name), None) => format!(" (in '{name}', created first)"),
    };
    format!("{kind} {}{parent}", relative(root, &entry.path))
}

fn plan_json(root: &Path, plan: &[PlanEntry]) -> serde_json::Value {
    let entries: Vec<serde_json::Value> = plan
        .iter()
        .map(|entry| {
            json!({
                "path": relative(root, &entry.path),
                "name": entry.name,
                "is_dir": entry.is_dir,
                "parent_name": entry.parent_name,
                "parent_id": entry.parent_id.as_ref().map(|id| id.as_str()),
            })
        })
        .collect();

    json!({
        "dry_run": true,
        "planned": plan.len(),
        "entries": entries,
    })
}

fn state_name(state: CredentialState) -> &'static str {
    match state {
        CredentialState::Uninitialized => "uninitialized",
        CredentialState::Valid => "valid",
        CredentialState::Expired => "expired",
        CredentialState::Refreshing => "refreshing",
        CredentialState::Failed => "failed",
    }
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}
