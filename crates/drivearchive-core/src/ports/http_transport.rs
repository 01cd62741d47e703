//! HTTP transport port (driven/secondary port)
//!
//! The credential and request-encoding layers never talk to an HTTP stack
//! directly. They build an [`ApiRequest`] with the exact bytes to send and
//! hand it to an [`IHttpTransport`], which returns status plus body.
//!
//! ## Design Notes
//!
//! - Timeouts and connection failures are surfaced as [`TransportError`],
//!   which callers may retry. Transports never retry internally.
//! - Non-2xx statuses are *not* transport errors: they come back as a
//!   normal [`ApiResponse`] for the caller to classify.

use thiserror::Error;

/// HTTP method of an encoded request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A protocol-exact request descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: String,
    /// Header name/value pairs in insertion order
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ApiRequest {
    /// Create a request with no headers and an empty body
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Append a header
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add an `Authorization: Bearer` header
    #[must_use]
    pub fn bearer_auth(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {token}"))
    }

    /// Replace the body
    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// First header value with a case-insensitive name match
    #[must_use]
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Status and raw body of a completed exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as lossy UTF-8, for error messages and logs
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Failure to complete an HTTP exchange at all
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Connect or overall request timeout elapsed
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Connection could not be established or was dropped
    #[error("Connection failed: {0}")]
    Connect(String),

    /// The request could not be built (bad URL, bad header)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TransportError {
    /// Whether a later attempt may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Connect(_))
    }
}

/// Port trait for executing encoded HTTP requests
#[async_trait::async_trait]
pub trait IHttpTransport: Send + Sync {
    /// Sends the request and returns status plus body
    ///
    /// # Errors
    /// Returns [`TransportError`] when no response was received
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let req = ApiRequest::new(HttpMethod::Post, "https://example.com/x")
            .header("Content-Type", "application/json")
            .bearer_auth("tok")
            .body(b"{}".to_vec());

        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://example.com/x");
        assert_eq!(req.header_value("content-type"), Some("application/json"));
        assert_eq!(req.header_value("Authorization"), Some("Bearer tok"));
        assert_eq!(req.body, b"{}");
    }

    #[test]
    fn test_response_success_range() {
        let ok = ApiResponse { status: 201, body: Vec::new() };
        let bad = ApiResponse { status: 404, body: b"nope".to_vec() };
        assert!(ok.is_success());
        assert!(!bad.is_success());
        assert_eq!(bad.text(), "nope");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(TransportError::Timeout("t".into()).is_retryable());
        assert!(TransportError::Connect("c".into()).is_retryable());
        assert!(!TransportError::InvalidRequest("u".into()).is_retryable());
    }

    #[test]
    fn test_method_display() {
        assert_eq!(HttpMethod::Get.to_string(), "GET");
        assert_eq!(HttpMethod::Post.as_str(), "POST");
    }
}
