//! Auth command - Verify the configured credentials
//!
//! Provides the `drivearchive auth check` CLI command which:
//! 1. Builds the credential source selected by `auth.method`
//! 2. Obtains a token from the token endpoint
//! 3. Reports success without ever printing the token

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Subcommand;
use drivearchive_core::config::{AuthMethod, Config};
use drivearchive_core::ports::IHttpTransport;
use drivearchive_drive::auth::{ClientSecrets, StoredCredential};
use drivearchive_drive::{
    CredentialSource, CredentialStore, DriveEndpoints, ReqwestTransport,
    ServiceAccountKey, ServiceAccountSource, StoredCredentialSource,
};
use tracing::info;

use crate::commands::{ensure_valid, load_config};
use crate::output::{get_formatter, OutputFormat};

/// Auth subcommands
#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Obtain a token with the configured credentials
    Check,
}

impl AuthCommand {
    /// Execute the auth command
    pub async fn execute(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        match self {
            AuthCommand::Check => self.execute_check(config_path, format).await,
        }
    }

    async fn execute_check(&self, config_path: &Path, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(format);
        let config = load_config(config_path)?;
        ensure_valid(&config, formatter.as_ref())?;

        let transport = Arc::new(ReqwestTransport::from_config(&config.http)?);
        let store = build_credential_store(&config, transport)?;

        info!(method = ?config.auth.method, "Checking credentials");
        store
            .get_token()
            .await
            .context("Failed to obtain an access token")?;

        println!(
            "{}",
            formatter.authenticated(method_name(config.auth.method), store.state())
        );
        Ok(())
    }
}

/// Builds the credential store for `auth.method`
///
/// Key and credential files are read here, so a missing or malformed file
/// fails before any network call.
///
/// # Errors
/// Returns an error if a credential file cannot be read or parsed.
pub fn build_credential_store(
    config: &Config,
    transport: Arc<dyn IHttpTransport>,
) -> Result<Arc<CredentialStore>> {
    let auth = &config.auth;
    let refresh_margin = Duration::from_secs(auth.refresh_margin_secs);
    let source: Arc<dyn CredentialSource> = match auth.method {
        AuthMethod::ServiceAccount => {
            let key = ServiceAccountKey::from_file(&auth.service_account_key)?;
            let token_url = key
                .token_uri
                .clone()
                .unwrap_or_else(|| DriveEndpoints::default().token_url);

            let mut source =
                ServiceAccountSource::new(key, token_url, transport).with_scope(&auth.scope);
            if let Some(issuer) = &auth.issuer {
                source = source.with_issuer(issuer);
            }
            Arc::new(source)
        }
        AuthMethod::StoredCredential => {
            let stored = StoredCredential::from_file(&auth.stored_credential)?;
            let secrets = ClientSecrets::from_file(&auth.client_secrets)?;
            Arc::new(StoredCredentialSource::new(
                stored,
                secrets,
                &DriveEndpoints::default().token_url,
                Duration::from_secs(config.http.connect_timeout_secs),
                Duration::from_secs(config.http.request_timeout_secs),
            )?
            .with_refresh_margin(refresh_margin))
        }
    };

    Ok(Arc::new(CredentialStore::new(source, refresh_margin)))
}

fn method_name(method: AuthMethod) -> &'static str {
    match method {
        AuthMethod::ServiceAccount => "service_account",
        AuthMethod::StoredCredential => "stored_credential",
    }
}
