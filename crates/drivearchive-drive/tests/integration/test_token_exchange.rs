//! Token endpoint tests for both credential sources

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use drivearchive_drive::auth::{ClientSecrets, InstalledClient, StoredCredential};
use drivearchive_drive::{
    CredentialSource, CredentialState, CredentialStore, DriveEndpoints, DriveError,
    StoredCredentialSource,
};

use crate::common::{mount_token_endpoint, service_account_store, ACCESS_TOKEN};

fn secrets() -> ClientSecrets {
    ClientSecrets {
        installed: InstalledClient {
            client_id: "cid.apps.googleusercontent.com".to_string(),
            client_secret: "client-secret".to_string(),
        },
    }
}

fn stored(expires_in_secs: i64) -> StoredCredential {
    StoredCredential {
        access_token: Some("stored-access".to_string()),
        refresh_token: "1//stored-refresh".to_string(),
        expires_at: Some(Utc::now() + chrono::Duration::seconds(expires_in_secs)),
    }
}

fn stored_source(server: &MockServer, credential: StoredCredential) -> StoredCredentialSource {
    StoredCredentialSource::new(
        credential,
        secrets(),
        &DriveEndpoints::with_base_url(&server.uri()).token_url,
        Duration::from_secs(5),
        Duration::from_secs(30),
    )
    .expect("build source")
}

#[tokio::test]
async fn test_service_account_token_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("assertion="))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": ACCESS_TOKEN,
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = service_account_store(&server);
    assert_eq!(store.get_token().await.unwrap(), ACCESS_TOKEN);
    assert_eq!(store.get_token().await.unwrap(), ACCESS_TOKEN);
    assert_eq!(store.state(), CredentialState::Valid);
}

#[tokio::test]
async fn test_service_account_concurrent_callers_single_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"access_token": ACCESS_TOKEN, "expires_in": 3599}))
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let store = service_account_store(&server);
    let (a, b, c) = tokio::join!(store.get_token(), store.get_token(), store.get_token());
    assert_eq!(a.unwrap(), ACCESS_TOKEN);
    assert_eq!(b.unwrap(), ACCESS_TOKEN);
    assert_eq!(c.unwrap(), ACCESS_TOKEN);
}

#[tokio::test]
async fn test_service_account_missing_access_token_fails_store() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = service_account_store(&server);
    assert!(matches!(
        store.get_token().await,
        Err(DriveError::TokenExchange(_))
    ));
    assert!(matches!(
        store.get_token().await,
        Err(DriveError::CredentialUnavailable(_))
    ));
    assert_eq!(store.state(), CredentialState::Failed);
}

#[tokio::test]
async fn test_service_account_rejected_assertion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Invalid JWT Signature."
        })))
        .mount(&server)
        .await;

    let store = service_account_store(&server);
    match store.get_token().await {
        Err(DriveError::TokenExchange(message)) => assert!(message.contains("invalid_grant")),
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn test_default_token_endpoint_mock_matches_jwt_grant() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;

    let store = service_account_store(&server);
    assert_eq!(store.get_token().await.unwrap(), ACCESS_TOKEN);
}

#[tokio::test]
async fn test_stored_credential_reused_while_valid() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let source = stored_source(&server, stored(600));
    let credential = source.fetch().await.unwrap();
    assert_eq!(credential.access_token, "stored-access");
}

#[tokio::test]
async fn test_stored_credential_refreshes_when_expired() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("client_id=cid.apps.googleusercontent.com"))
        .and(body_string_contains("client_secret=client-secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "fresh-access",
            "expires_in": 3599,
            "token_type": "Bearer",
            "scope": "https://www.googleapis.com/auth/drive.file"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = stored_source(&server, stored(-60));
    let credential = source.fetch().await.unwrap();
    assert_eq!(credential.access_token, "fresh-access");
    assert!(credential.expires_at.is_some());
    assert_eq!(credential.refresh_token.as_deref(), Some("1//stored-refresh"));
}

#[tokio::test]
async fn test_stored_credential_invalid_grant_is_token_exchange_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "Token has been expired or revoked."
        })))
        .mount(&server)
        .await;

    let store = CredentialStore::new(
        Arc::new(stored_source(&server, stored(-60))),
        Duration::from_secs(60),
    );
    assert!(matches!(
        store.get_token().await,
        Err(DriveError::TokenExchange(_))
    ));
    assert_eq!(store.state(), CredentialState::Failed);
}

#[tokio::test]
async fn test_stored_token_inside_refresh_margin_is_refreshed_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "fresh-access",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let margin = Duration::from_secs(60);
    let source = stored_source(&server, stored(30)).with_refresh_margin(margin);
    let store = CredentialStore::new(Arc::new(source), margin);

    assert_eq!(store.get_token().await.unwrap(), "fresh-access");
    assert_eq!(store.get_token().await.unwrap(), "fresh-access");
    assert_eq!(store.refresh_count(), 1);
    assert_eq!(store.state(), CredentialState::Valid);
}

#[tokio::test]
async fn test_stored_credential_refresh_does_not_follow_redirects() {
    let elsewhere = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&elsewhere)
        .await;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(
            ResponseTemplate::new(307).insert_header("Location", format!("{}/token", elsewhere.uri())),
        )
        .mount(&server)
        .await;

    let source = stored_source(&server, stored(-60));
    assert!(source.fetch().await.is_err());
}
