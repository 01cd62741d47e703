//! Listing tests: single page, pagination, error statuses

use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use drivearchive_core::domain::RemoteGraph;
use drivearchive_core::ports::IDriveProvider;
use drivearchive_drive::DriveError;

use crate::common::{setup_drive_mock, ACCESS_TOKEN};

#[tokio::test]
async fn test_list_single_page() {
    let (server, provider) = setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param("fields", "nextPageToken,files(id,name,parents)"))
        .and(header("authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [
                {"id": "F-a", "name": "a", "parents": ["root-id"]},
                {"id": "F-b", "name": "b.mp3", "parents": ["F-a"]}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = provider.list_page(None).await.unwrap();
    assert!(page.next_page_token.is_none());
    assert_eq!(page.resources.len(), 2);

    let graph = RemoteGraph::from_resources(&page.resources);
    let names: Vec<(&str, Option<&str>)> = graph
        .nodes()
        .map(|n| (n.name.as_str(), n.parent_name()))
        .collect();
    assert_eq!(names, vec![("a", None), ("b.mp3", Some("a"))]);
}

#[tokio::test]
async fn test_list_all_follows_next_page_token() {
    let (server, provider) = setup_drive_mock().await;

    // More specific mock first: wiremock picks the first match in mount order
    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [{"id": "F3", "name": "three"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "nextPageToken": "page-2",
            "files": [
                {"id": "F1", "name": "one"},
                {"id": "F2", "name": "two", "parents": ["F1"]}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let all = provider.list_all().await.unwrap();
    let ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["F1", "F2", "F3"]);
}

#[tokio::test]
async fn test_list_server_error_is_api_error() {
    let (server, provider) = setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(503).set_body_string("backend unavailable"))
        .mount(&server)
        .await;

    let err = provider.list_page(None).await.unwrap_err();
    match err.downcast_ref::<DriveError>() {
        Some(DriveError::Api { status, body }) => {
            assert_eq!(*status, 503);
            assert_eq!(body, "backend unavailable");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn test_list_malformed_body() {
    let (server, provider) = setup_drive_mock().await;

    Mock::given(method("GET"))
        .and(path("/drive/v3/files"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "files": [{"name": "no-id"}]
        })))
        .mount(&server)
        .await;

    let err = provider.list_page(None).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DriveError>(),
        Some(DriveError::MalformedResponse(_))
    ));
}
