//! Drive endpoints and the `reqwest` transport
//!
//! [`ReqwestTransport`] is the production [`IHttpTransport`]: it sends the
//! already-encoded request bytes as-is and reports timeouts and connection
//! failures as retryable [`TransportError`]s. Non-2xx statuses are returned
//! unchanged for the caller to classify.

use std::time::Duration;

use drivearchive_core::config::HttpConfig;
use drivearchive_core::ports::{ApiRequest, ApiResponse, HttpMethod, IHttpTransport, TransportError};
use reqwest::{Client, Method};
use tracing::{debug, instrument};

use crate::DriveError;

/// Google OAuth2 token endpoint
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Drive v3 metadata endpoint (listing, folder creation)
pub const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";

/// Drive v3 media upload endpoint
pub const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";

// ============================================================================
// Endpoints
// ============================================================================

/// Base URLs for the three endpoints a run talks to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriveEndpoints {
    pub token_url: String,
    pub files_url: String,
    pub upload_url: String,
}

impl Default for DriveEndpoints {
    fn default() -> Self {
        Self {
            token_url: TOKEN_URL.to_string(),
            files_url: FILES_URL.to_string(),
            upload_url: UPLOAD_URL.to_string(),
        }
    }
}

impl DriveEndpoints {
    /// Endpoints rooted at a custom base URL (useful for testing)
    ///
    /// Paths mirror the production layout: `/token`, `/drive/v3/files`
    /// and `/upload/drive/v3/files`.
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            token_url: format!("{base}/token"),
            files_url: format!("{base}/drive/v3/files"),
            upload_url: format!("{base}/upload/drive/v3/files"),
        }
    }
}

// ============================================================================
// ReqwestTransport
// ============================================================================

/// HTTP transport backed by a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with explicit timeouts
    ///
    /// # Arguments
    /// * `connect_timeout` - Limit for establishing the connection
    /// * `request_timeout` - Limit for the whole exchange, body upload included
    pub fn new(connect_timeout: Duration, request_timeout: Duration) -> Result<Self, DriveError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| TransportError::InvalidRequest(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Creates a transport from the `http` configuration section
    pub fn from_config(config: &HttpConfig) -> Result<Self, DriveError> {
        Self::new(
            Duration::from_secs(config.connect_timeout_secs),
            Duration::from_secs(config.request_timeout_secs),
        )
    }
}

#[async_trait::async_trait]
impl IHttpTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !request.body.is_empty() {
            builder = builder.body(request.body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_reqwest_error)?;

        debug!(status, bytes = body.len(), "Received response");
        Ok(ApiResponse {
            status,
            body: body.to_vec(),
        })
    }
}

/// Maps `reqwest` failures onto the transport error taxonomy
pub(crate) fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else if err.is_builder() {
        TransportError::InvalidRequest(err.to_string())
    } else {
        TransportError::Connect(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        let endpoints = DriveEndpoints::default();
        assert_eq!(endpoints.token_url, "https://oauth2.googleapis.com/token");
        assert_eq!(endpoints.files_url, "https://www.googleapis.com/drive/v3/files");
        assert_eq!(
            endpoints.upload_url,
            "https://www.googleapis.com/upload/drive/v3/files"
        );
    }

    #[test]
    fn test_endpoints_with_base_url_trims_slash() {
        let endpoints = DriveEndpoints::with_base_url("http://127.0.0.1:9000/");
        assert_eq!(endpoints.token_url, "http://127.0.0.1:9000/token");
        assert_eq!(endpoints.files_url, "http://127.0.0.1:9000/drive/v3/files");
        assert_eq!(
            endpoints.upload_url,
            "http://127.0.0.1:9000/upload/drive/v3/files"
        );
    }

    #[test]
    fn test_transport_from_default_config() {
        assert!(ReqwestTransport::from_config(&HttpConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url_is_not_retryable() {
        let transport = ReqwestTransport::new(Duration::from_secs(1), Duration::from_secs(1)).unwrap();
        let err = transport
            .send(ApiRequest::new(HttpMethod::Get, "not a url"))
            .await
            .unwrap_err();
        assert!(!err.is_retryable(), "{err:?}");
    }
}
