//! Credential sources for Google OAuth2
//!
//! Two ways of obtaining a bearer token are supported:
//!
//! - [`ServiceAccountSource`]: signs a short-lived RS256 JWT assertion with
//!   the service-account private key and exchanges it at the token endpoint
//!   (`urn:ietf:params:oauth:grant-type:jwt-bearer`).
//! - [`StoredCredentialSource`]: reuses a previously stored access token
//!   while it is valid, otherwise redeems the stored refresh token with the
//!   installed-app client secrets.
//!
//! Both implement [`CredentialSource`] and are meant to sit behind a
//! [`CredentialStore`](crate::credential::CredentialStore).

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use drivearchive_core::config::DEFAULT_SCOPE;
use drivearchive_core::ports::{ApiRequest, ApiResponse, HttpMethod, IHttpTransport, TransportError};
use oauth2::basic::{BasicClient, BasicErrorResponse};
use oauth2::{
    AuthType, ClientId, ClientSecret, EndpointNotSet, EndpointSet, RefreshToken,
    RequestTokenError, TokenResponse, TokenUrl,
};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use tracing::{debug, info, instrument};

use crate::credential::{Credential, CredentialSource};
use crate::DriveError;

/// Grant type for the JWT bearer assertion flow (RFC 7523)
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Assertion lifetime in seconds
pub const ASSERTION_LIFETIME_SECS: i64 = 30;

/// Fixed JOSE header of every assertion
const JWT_HEADER: &str = r#"{"alg":"RS256","typ":"JWT"}"#;

// ============================================================================
// Key material
// ============================================================================

/// Service-account key file contents
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// PEM encoded RSA private key
    pub private_key: String,
    /// Service account e-mail, the default assertion issuer
    pub client_email: String,
    /// Token endpoint recorded in the key file, if any
    #[serde(default)]
    pub token_uri: Option<String>,
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("private_key", &"<redacted>")
            .field("client_email", &self.client_email)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    /// Parses a key from its JSON text
    pub fn from_json(json: &str) -> Result<Self, DriveError> {
        let key: Self = serde_json::from_str(json)
            .map_err(|e| DriveError::CredentialLoad(format!("invalid service account key: {e}")))?;

        if key.client_email.trim().is_empty() {
            return Err(DriveError::CredentialLoad(
                "service account key has an empty client_email".to_string(),
            ));
        }
        Ok(key)
    }

    /// Reads and parses a key file
    pub fn from_file(path: &Path) -> Result<Self, DriveError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            DriveError::CredentialLoad(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    /// Decodes the PEM private key (PKCS#8, or PKCS#1 as a fallback)
    pub fn decode_private_key(&self) -> Result<RsaPrivateKey, DriveError> {
        RsaPrivateKey::from_pkcs8_pem(&self.private_key)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(&self.private_key))
            .map_err(|e| DriveError::CredentialLoad(format!("invalid private key: {e}")))
    }
}

// ============================================================================
// JWT assertion
// ============================================================================

/// Claim set of a JWT bearer assertion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl JwtClaims {
    /// Claims issued at `now`, expiring [`ASSERTION_LIFETIME_SECS`] later
    pub fn new(
        issuer: impl Into<String>,
        scope: impl Into<String>,
        audience: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let iat = now.timestamp();
        Self {
            iss: issuer.into(),
            scope: scope.into(),
            aud: audience.into(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        }
    }
}

/// Builds a signed RS256 assertion: `b64(header).b64(claims).b64(signature)`
pub fn encode_assertion(key: &RsaPrivateKey, claims: &JwtClaims) -> Result<String, DriveError> {
    let claims_json = serde_json::to_vec(claims)
        .map_err(|e| DriveError::CredentialLoad(format!("cannot encode claims: {e}")))?;

    let signing_input = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(JWT_HEADER),
        URL_SAFE_NO_PAD.encode(claims_json)
    );

    let signature = SigningKey::<Sha256>::new(key.clone())
        .try_sign(signing_input.as_bytes())
        .map_err(|e| DriveError::CredentialLoad(format!("signing failed: {e}")))?;

    Ok(format!(
        "{signing_input}.{}",
        URL_SAFE_NO_PAD.encode(signature.to_bytes())
    ))
}

// ============================================================================
// Token endpoint response
// ============================================================================

/// Fields the token endpoint may return; everything is optional so the
/// absence of `access_token` can be reported precisely
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
}

/// Turns a token endpoint response into a [`Credential`]
///
/// A missing `expires_in` yields a credential that never expires.
pub(crate) fn decode_token_response(
    response: &ApiResponse,
    issued_at: DateTime<Utc>,
) -> Result<Credential, DriveError> {
    if !response.is_success() {
        return Err(DriveError::TokenExchange(format!(
            "token endpoint returned {}: {}",
            response.status,
            response.text()
        )));
    }

    let parsed: TokenEndpointResponse = serde_json::from_slice(&response.body)
        .map_err(|e| DriveError::TokenExchange(format!("unparsable token response: {e}")))?;

    let access_token = parsed
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| DriveError::TokenExchange("response has no access_token".to_string()))?;

    Ok(Credential {
        access_token,
        expires_at: parsed.expires_in.map(|s| issued_at + Duration::seconds(s)),
        refresh_token: parsed.refresh_token,
    })
}

// ============================================================================
// ServiceAccountSource
// ============================================================================

/// JWT bearer assertion flow for service accounts
pub struct ServiceAccountSource {
    key: ServiceAccountKey,
    issuer: String,
    scope: String,
    token_url: String,
    transport: Arc<dyn IHttpTransport>,
}

impl ServiceAccountSource {
    /// Creates a source whose issuer is the key's `client_email`
    ///
    /// # Arguments
    /// * `key` - Parsed service-account key
    /// * `token_url` - Token endpoint, also used as the assertion audience
    /// * `transport` - Transport for the token request
    pub fn new(
        key: ServiceAccountKey,
        token_url: impl Into<String>,
        transport: Arc<dyn IHttpTransport>,
    ) -> Self {
        Self {
            issuer: key.client_email.clone(),
            key,
            scope: DEFAULT_SCOPE.to_string(),
            token_url: token_url.into(),
            transport,
        }
    }

    /// Overrides the assertion issuer
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Overrides the requested scope
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Builds a signed assertion issued at `now`
    pub fn assertion(&self, now: DateTime<Utc>) -> Result<String, DriveError> {
        let private_key = self.key.decode_private_key()?;
        let claims = JwtClaims::new(&self.issuer, &self.scope, &self.token_url, now);
        encode_assertion(&private_key, &claims)
    }

    /// Encodes the form POST that exchanges `assertion` for a token
    pub fn token_request(&self, assertion: &str) -> ApiRequest {
        let form = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", JWT_BEARER_GRANT)
            .append_pair("assertion", assertion)
            .finish();

        ApiRequest::new(HttpMethod::Post, &self.token_url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(form.into_bytes())
    }
}

#[async_trait::async_trait]
impl CredentialSource for ServiceAccountSource {
    #[instrument(skip(self), fields(issuer = %self.issuer))]
    async fn fetch(&self) -> Result<Credential, DriveError> {
        let now = Utc::now();
        let assertion = self.assertion(now)?;

        debug!("Exchanging JWT assertion for access token");
        let response = self.transport.send(self.token_request(&assertion)).await?;
        let credential = decode_token_response(&response, now)?;

        info!("Service account token obtained");
        Ok(credential)
    }

    fn kind(&self) -> &'static str {
        "service_account"
    }
}

// ============================================================================
// StoredCredentialSource
// ============================================================================

/// Previously obtained tokens, as persisted after an interactive login
#[derive(Clone, Serialize, Deserialize)]
pub struct StoredCredential {
    #[serde(default)]
    pub access_token: Option<String>,
    pub refresh_token: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredential")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl StoredCredential {
    /// Reads and parses a stored credential file
    pub fn from_file(path: &Path) -> Result<Self, DriveError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            DriveError::CredentialLoad(format!("cannot read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&json)
            .map_err(|e| DriveError::CredentialLoad(format!("invalid stored credential: {e}")))
    }

    /// The stored access token, when it stays valid for at least `margin`
    fn cached(&self, margin: Duration) -> Option<Credential> {
        let credential = Credential {
            access_token: self.access_token.clone().filter(|t| !t.is_empty())?,
            expires_at: Some(self.expires_at?),
            refresh_token: Some(self.refresh_token.clone()),
        };
        (!credential.expires_within(margin)).then_some(credential)
    }
}

/// Installed-application client secrets (`google.credentials.json`)
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub installed: InstalledClient,
}

/// The `installed` section of the client secrets file
#[derive(Clone, Deserialize)]
pub struct InstalledClient {
    pub client_id: String,
    pub client_secret: String,
}

impl fmt::Debug for InstalledClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstalledClient")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl ClientSecrets {
    /// Reads and parses a client secrets file
    pub fn from_file(path: &Path) -> Result<Self, DriveError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            DriveError::CredentialLoad(format!("cannot read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&json)
            .map_err(|e| DriveError::CredentialLoad(format!("invalid client secrets: {e}")))
    }
}

type RefreshClient =
    BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Refresh-token flow for installed applications, using the `oauth2` crate
///
/// The refresh goes through its own `reqwest::Client` rather than
/// `IHttpTransport`: `oauth2`'s `request_async` takes a client implementing
/// its `AsyncHttpClient` trait, which the transport port does not. The client
/// is built with the configured timeouts and without redirects.
pub struct StoredCredentialSource {
    stored: StoredCredential,
    client: RefreshClient,
    http: reqwest::Client,
    refresh_margin: Duration,
}

impl StoredCredentialSource {
    /// Creates the source
    ///
    /// # Arguments
    /// * `stored` - Previously obtained access and refresh tokens
    /// * `secrets` - Installed-app client id and secret
    /// * `token_url` - Token endpoint
    /// * `connect_timeout` / `request_timeout` - Limits for the refresh call
    pub fn new(
        stored: StoredCredential,
        secrets: ClientSecrets,
        token_url: &str,
        connect_timeout: StdDuration,
        request_timeout: StdDuration,
    ) -> Result<Self, DriveError> {
        let token_url = TokenUrl::new(token_url.to_string())
            .map_err(|e| DriveError::CredentialLoad(format!("invalid token URL: {e}")))?;

        let client = BasicClient::new(ClientId::new(secrets.installed.client_id))
            .set_client_secret(ClientSecret::new(secrets.installed.client_secret))
            .set_auth_type(AuthType::RequestBody)
            .set_token_uri(token_url);

        // Following redirects would leak the refresh token to another host
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(crate::client::map_reqwest_error)?;

        Ok(Self {
            stored,
            client,
            http,
            refresh_margin: Duration::zero(),
        })
    }

    /// Treats a stored token expiring within `margin` as already expired
    ///
    /// Use the same margin as the `CredentialStore` wrapping this source,
    /// otherwise the store keeps asking for a token the source keeps reusing.
    pub fn with_refresh_margin(mut self, margin: StdDuration) -> Self {
        self.refresh_margin = Duration::from_std(margin).unwrap_or_else(|_| Duration::zero());
        self
    }

    async fn refresh(&self) -> Result<Credential, DriveError> {
        let now = Utc::now();
        let response = self
            .client
            .exchange_refresh_token(&RefreshToken::new(self.stored.refresh_token.clone()))
            .request_async(&self.http)
            .await
            .map_err(map_token_error)?;

        let access_token = response.access_token().secret().clone();
        if access_token.is_empty() {
            return Err(DriveError::TokenExchange(
                "response has an empty access_token".to_string(),
            ));
        }

        Ok(Credential {
            access_token,
            expires_at: response
                .expires_in()
                .map(|d| now + Duration::seconds(d.as_secs() as i64)),
            refresh_token: response
                .refresh_token()
                .map(|t| t.secret().clone())
                .or_else(|| Some(self.stored.refresh_token.clone())),
        })
    }
}

#[async_trait::async_trait]
impl CredentialSource for StoredCredentialSource {
    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<Credential, DriveError> {
        if let Some(cached) = self.stored.cached(self.refresh_margin) {
            debug!("Reusing stored access token");
            return Ok(cached);
        }

        info!("Stored access token expired, redeeming refresh token");
        self.refresh().await
    }

    fn kind(&self) -> &'static str {
        "stored_credential"
    }
}

/// Maps `oauth2` request failures onto the error taxonomy
fn map_token_error<RE>(err: RequestTokenError<RE, BasicErrorResponse>) -> DriveError
where
    RE: std::error::Error + 'static,
{
    match err {
        RequestTokenError::Request(e) => {
            if is_timeout(&e) {
                DriveError::Transport(TransportError::Timeout(e.to_string()))
            } else {
                DriveError::Transport(TransportError::Connect(e.to_string()))
            }
        }
        RequestTokenError::ServerResponse(resp) => DriveError::TokenExchange(resp.to_string()),
        RequestTokenError::Parse(e, _) => {
            DriveError::TokenExchange(format!("unparsable token response: {e}"))
        }
        RequestTokenError::Other(msg) => DriveError::TokenExchange(msg),
    }
}

/// Walks the source chain looking for a timed-out `reqwest` error
fn is_timeout(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        let timed_out = e
            .downcast_ref::<reqwest::Error>()
            .or_else(|| e.downcast_ref::<Box<reqwest::Error>>().map(|b| b.as_ref()))
            .is_some_and(reqwest::Error::is_timeout);
        if timed_out {
            return true;
        }
        current = e.source();
    }
    false
}
