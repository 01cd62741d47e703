//! [`IDriveProvider`] implementation for Google Drive
//!
//! Glues the credential store, the request encoders and a transport
//! together. Every call asks the store for a token, so a run that outlives
//! its token transparently refreshes it once.

use std::sync::Arc;

use anyhow::Context;
use drivearchive_core::domain::{PlanEntry, RemoteResource};
use drivearchive_core::ports::{IDriveProvider, IHttpTransport, ListPage};
use tracing::{debug, info, instrument};

use crate::client::DriveEndpoints;
use crate::credential::CredentialStore;
use crate::listing::{decode_list_page, list_request};
use crate::upload::{decode_created, RequestEncoder};
use crate::DriveError;

/// Google Drive adapter
pub struct DriveProvider {
    transport: Arc<dyn IHttpTransport>,
    credentials: Arc<CredentialStore>,
    endpoints: DriveEndpoints,
    encoder: RequestEncoder,
    page_size: Option<u32>,
}

impl DriveProvider {
    /// Creates a provider talking to the production endpoints
    pub fn new(transport: Arc<dyn IHttpTransport>, credentials: Arc<CredentialStore>) -> Self {
        Self::with_endpoints(transport, credentials, DriveEndpoints::default())
    }

    /// Creates a provider with custom endpoints (useful for testing)
    pub fn with_endpoints(
        transport: Arc<dyn IHttpTransport>,
        credentials: Arc<CredentialStore>,
        endpoints: DriveEndpoints,
    ) -> Self {
        Self {
            transport,
            credentials,
            encoder: RequestEncoder::new(endpoints.clone()),
            endpoints,
            page_size: None,
        }
    }

    /// Sets the listing page size
    pub fn with_page_size(mut self, page_size: Option<u32>) -> Self {
        self.page_size = page_size;
        self
    }

    async fn fetch_page(&self, page_token: Option<&str>) -> Result<ListPage, DriveError> {
        let token = self.credentials.get_token().await?;
        let request = list_request(&self.endpoints.files_url, &token, page_token, self.page_size);
        let response = self.transport.send(request).await?;
        decode_list_page(&response)
    }

    async fn create_resource(&self, entry: &PlanEntry) -> Result<RemoteResource, DriveError> {
        let token = self.credentials.get_token().await?;
        let request = self.encoder.encode(entry, &token).await?;
        let response = self.transport.send(request).await?;
        decode_created(&response)
    }
}

#[async_trait::async_trait]
impl IDriveProvider for DriveProvider {
    #[instrument(skip(self))]
    async fn list_page(&self, page_token: Option<&str>) -> anyhow::Result<ListPage> {
        let page = self
            .fetch_page(page_token)
            .await
            .context("Failed to list Drive files")?;

        debug!(
            files = page.resources.len(),
            has_more = page.next_page_token.is_some(),
            "Fetched listing page"
        );
        Ok(page)
    }

    #[instrument(skip(self, entry), fields(name = %entry.name, is_dir = entry.is_dir))]
    async fn create(&self, entry: &PlanEntry) -> anyhow::Result<RemoteResource> {
        let created = self
            .create_resource(entry)
            .await
            .with_context(|| format!("Failed to create {}", entry.path.display()))?;

        info!(id = %created.id, "Created remote resource");
        Ok(created)
    }
}
