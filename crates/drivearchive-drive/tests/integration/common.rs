//! Shared test helpers for Drive API integration tests
//!
//! Provides wiremock-based mock server setup for the token endpoint and the
//! Drive v3 endpoints. Each helper mounts the necessary mock endpoints and
//! returns a provider pointing at the mock server.

use std::sync::Arc;
use std::time::Duration;

use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use drivearchive_drive::{
    CredentialStore, DriveEndpoints, DriveProvider, ReqwestTransport, ServiceAccountKey,
    ServiceAccountSource,
};

pub const KEY_JSON: &str = include_str!("../fixtures/service_account.json");

/// Access token handed out by [`mount_token_endpoint`]
pub const ACCESS_TOKEN: &str = "ya29.test-access-token";

pub fn transport() -> Arc<ReqwestTransport> {
    Arc::new(
        ReqwestTransport::new(Duration::from_secs(5), Duration::from_secs(30))
            .expect("build transport"),
    )
}

/// Credential store backed by the fixture service account and `server`
pub fn service_account_store(server: &MockServer) -> Arc<CredentialStore> {
    let endpoints = DriveEndpoints::with_base_url(&server.uri());
    let key = ServiceAccountKey::from_json(KEY_JSON).expect("fixture key");
    let source = ServiceAccountSource::new(key, endpoints.token_url, transport());
    Arc::new(CredentialStore::new(
        Arc::new(source),
        Duration::from_secs(60),
    ))
}

/// Sets up a mock server with a working token endpoint and returns
/// a (MockServer, DriveProvider) tuple.
pub async fn setup_drive_mock() -> (MockServer, DriveProvider) {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let provider = DriveProvider::with_endpoints(
        transport(),
        service_account_store(&server),
        DriveEndpoints::with_base_url(&server.uri()),
    );

    (server, provider)
}

/// Mounts a token endpoint that accepts any JWT bearer grant.
pub async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": ACCESS_TOKEN,
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .mount(server)
        .await;
}
