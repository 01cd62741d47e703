//! Transport-level behavior: timeouts and unreachable hosts

use std::time::Duration;

use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use drivearchive_core::ports::{ApiRequest, HttpMethod, IHttpTransport, TransportError};
use drivearchive_drive::ReqwestTransport;

#[tokio::test]
async fn test_request_timeout_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(Duration::from_secs(1), Duration::from_millis(100)).unwrap();
    let err = transport
        .send(ApiRequest::new(HttpMethod::Get, server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Timeout(_)), "{err:?}");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_non_success_status_is_not_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_string("missing"))
        .mount(&server)
        .await;

    let transport = ReqwestTransport::new(Duration::from_secs(1), Duration::from_secs(5)).unwrap();
    let response = transport
        .send(ApiRequest::new(HttpMethod::Post, server.uri()).body(b"x".to_vec()))
        .await
        .unwrap();

    assert_eq!(response.status, 404);
    assert_eq!(response.text(), "missing");
}

#[tokio::test]
async fn test_unreachable_host_is_retryable() {
    // Grab a free port, then release it so nothing listens there
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let transport = ReqwestTransport::new(Duration::from_secs(1), Duration::from_secs(2)).unwrap();
    let err = transport
        .send(ApiRequest::new(HttpMethod::Get, format!("http://127.0.0.1:{port}/")))
        .await
        .unwrap_err();

    assert!(err.is_retryable(), "{err:?}");
}
