//! Folder creation and multipart upload tests

use std::path::PathBuf;

use wiremock::matchers::{body_bytes, body_json, header, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use drivearchive_core::domain::{PlanEntry, RemoteId};
use drivearchive_core::ports::IDriveProvider;
use drivearchive_drive::upload::{multipart_body, MAX_UPLOAD_SIZE};
use drivearchive_drive::DriveError;

use crate::common::{setup_drive_mock, ACCESS_TOKEN};

fn plan_entry(path: PathBuf, is_dir: bool, parent_id: Option<&str>) -> PlanEntry {
    PlanEntry {
        name: path.file_name().unwrap().to_string_lossy().into_owned(),
        parent_name: parent_id.map(|_| "parent".to_string()),
        parent_id: parent_id.map(|p| RemoteId::new(p.to_string()).unwrap()),
        is_dir,
        path,
    }
}

#[tokio::test]
async fn test_create_folder_at_root() {
    let (server, provider) = setup_drive_mock().await;

    Mock::given(method("POST"))
        .and(path("/drive/v3/files"))
        .and(header("authorization", format!("Bearer {ACCESS_TOKEN}").as_str()))
        .and(body_json(serde_json::json!({
            "mimeType": "application/vnd.google-apps.folder",
            "name": "2024"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "kind": "drive#file",
            "id": "folder-2024",
            "name": "2024",
            "mimeType": "application/vnd.google-apps.folder"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = provider
        .create(&plan_entry(PathBuf::from("/archive/2024"), true, None))
        .await
        .unwrap();
    assert_eq!(created.id.as_str(), "folder-2024");
    assert_eq!(created.name, "2024");
}

#[tokio::test]
async fn test_upload_file_multipart_bytes() {
    let (server, provider) = setup_drive_mock().await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("a.mp3");
    std::fs::write(&file, b"XY").unwrap();

    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .and(query_param("uploadType", "multipart"))
        .and(header("content-type", "multipart/related; boundary=oblique-rays"))
        .and(body_bytes(multipart_body(br#"{"name":"a.mp3","parents":["folder-1"]}"#, b"XY")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "kind": "drive#file",
            "id": "file-1",
            "name": "a.mp3",
            "mimeType": "audio/mpeg"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = provider
        .create(&plan_entry(file, false, Some("folder-1")))
        .await
        .unwrap();
    assert_eq!(created.id.as_str(), "file-1");
}

#[tokio::test]
async fn test_oversized_upload_sends_nothing() {
    let (server, provider) = setup_drive_mock().await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("huge.ts");
    std::fs::File::create(&file)
        .unwrap()
        .set_len(MAX_UPLOAD_SIZE + 1)
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = provider
        .create(&plan_entry(file, false, None))
        .await
        .unwrap_err();
    let drive_err = err.downcast_ref::<DriveError>().expect("DriveError");
    assert!(matches!(drive_err, DriveError::SizeLimit { .. }));
    assert!(drive_err.is_entry_local());
}

#[tokio::test]
async fn test_upload_quota_error() {
    let (server, provider) = setup_drive_mock().await;
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("b.mp3");
    std::fs::write(&file, b"data").unwrap();

    Mock::given(method("POST"))
        .and(path("/upload/drive/v3/files"))
        .respond_with(ResponseTemplate::new(403).set_body_string("storageQuotaExceeded"))
        .mount(&server)
        .await;

    let err = provider
        .create(&plan_entry(file, false, None))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<DriveError>(),
        Some(DriveError::Api { status: 403, .. })
    ));
}
