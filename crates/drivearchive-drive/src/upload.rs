//! Folder and multipart upload request encoding
//!
//! Turns a [`PlanEntry`] into the exact request Drive expects:
//! - directories: a JSON metadata `POST` to the `files` endpoint
//! - files: a `multipart/related` `POST` to the upload endpoint, metadata
//!   part first, raw content second
//!
//! Uploads above [`MAX_UPLOAD_SIZE`] are rejected from file metadata alone,
//! before a single content byte is read.
//!
//! ## Drive API References
//!
//! - [Create folders](https://developers.google.com/drive/api/guides/folder)
//! - [Multipart upload](https://developers.google.com/drive/api/guides/manage-uploads#multipart)

use std::path::Path;

use drivearchive_core::domain::{PlanEntry, RemoteId, RemoteResource};
use drivearchive_core::ports::{ApiRequest, ApiResponse, HttpMethod};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::DriveEndpoints;
use crate::listing::remote_id;
use crate::DriveError;

/// Multipart boundary used for every upload
pub const BOUNDARY: &str = "oblique-rays";

/// Largest file accepted for a multipart upload: 100 MiB
pub const MAX_UPLOAD_SIZE: u64 = 100 * 1024 * 1024;

/// MIME type Drive uses for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

// ============================================================================
// Metadata and framing
// ============================================================================

/// Resource metadata; field order is the wire order
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileMetadata<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    mime_type: Option<&'a str>,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parents: Option<[&'a str; 1]>,
}

/// JSON metadata for a new folder
pub fn folder_metadata(name: &str, parent: Option<&RemoteId>) -> Vec<u8> {
    metadata_json(&FileMetadata {
        mime_type: Some(FOLDER_MIME_TYPE),
        name,
        parents: parent.map(|p| [p.as_str()]),
    })
}

/// JSON metadata part for a file upload
pub fn file_metadata(name: &str, parent: Option<&RemoteId>) -> Vec<u8> {
    metadata_json(&FileMetadata {
        mime_type: None,
        name,
        parents: parent.map(|p| [p.as_str()]),
    })
}

fn metadata_json(metadata: &FileMetadata<'_>) -> Vec<u8> {
    // Serializing borrowed strings into a Vec cannot fail
    serde_json::to_vec(metadata).unwrap_or_default()
}

/// Frames metadata and content as a `multipart/related` body
pub fn multipart_body(metadata: &[u8], content: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(metadata.len() + content.len() + 160);
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=utf-8\r\n\r\n");
    body.extend_from_slice(metadata);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--").as_bytes());
    body
}

/// Fails with [`DriveError::SizeLimit`] when `size` exceeds the upload limit
pub fn check_upload_size(path: &Path, size: u64) -> Result<(), DriveError> {
    if size > MAX_UPLOAD_SIZE {
        return Err(DriveError::SizeLimit {
            path: path.to_path_buf(),
            size,
            limit: MAX_UPLOAD_SIZE,
        });
    }
    Ok(())
}

/// Reads a file for upload, checking its size first
pub async fn read_upload(path: &Path) -> Result<Vec<u8>, DriveError> {
    let io_error = |source| DriveError::Io {
        path: path.to_path_buf(),
        source,
    };

    let metadata = tokio::fs::metadata(path).await.map_err(io_error)?;
    check_upload_size(path, metadata.len())?;
    tokio::fs::read(path).await.map_err(io_error)
}

// ============================================================================
// RequestEncoder
// ============================================================================

/// Encodes plan entries into upload requests
#[derive(Debug, Clone, Default)]
pub struct RequestEncoder {
    endpoints: DriveEndpoints,
}

impl RequestEncoder {
    pub fn new(endpoints: DriveEndpoints) -> Self {
        Self { endpoints }
    }

    /// Encodes `entry` as a folder creation or a multipart upload
    ///
    /// The entry's `parent_id`, when set, is added to the metadata.
    pub async fn encode(&self, entry: &PlanEntry, access_token: &str) -> Result<ApiRequest, DriveError> {
        if entry.is_dir {
            Ok(self.folder_request(entry, access_token))
        } else {
            let content = read_upload(&entry.path).await?;
            Ok(self.file_request(entry, &content, access_token))
        }
    }

    /// Folder creation request
    pub fn folder_request(&self, entry: &PlanEntry, access_token: &str) -> ApiRequest {
        debug!(name = %entry.name, parent = ?entry.parent_id, "Encoding folder creation");
        ApiRequest::new(HttpMethod::Post, &self.endpoints.files_url)
            .bearer_auth(access_token)
            .header("Content-Type", "application/json; charset=utf-8")
            .body(folder_metadata(&entry.name, entry.parent_id.as_ref()))
    }

    /// Multipart upload request for already-read content
    pub fn file_request(&self, entry: &PlanEntry, content: &[u8], access_token: &str) -> ApiRequest {
        debug!(
            name = %entry.name,
            parent = ?entry.parent_id,
            bytes = content.len(),
            "Encoding multipart upload"
        );
        let metadata = file_metadata(&entry.name, entry.parent_id.as_ref());
        ApiRequest::new(
            HttpMethod::Post,
            format!("{}?uploadType=multipart", self.endpoints.upload_url),
        )
        .bearer_auth(access_token)
        .header(
            "Content-Type",
            format!("multipart/related; boundary={BOUNDARY}"),
        )
        .body(multipart_body(&metadata, content))
    }
}

// ============================================================================
// Created resource decoding
// ============================================================================

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
    name: String,
    #[serde(default)]
    parents: Vec<String>,
}

/// Decodes the resource returned by a folder creation or upload
///
/// # Errors
/// - [`DriveError::Api`] for a non-2xx status
/// - [`DriveError::MalformedResponse`] when `id` or `name` is missing
pub fn decode_created(response: &ApiResponse) -> Result<RemoteResource, DriveError> {
    if !response.is_success() {
        return Err(DriveError::Api {
            status: response.status,
            body: response.text(),
        });
    }

    let created: CreatedFile = serde_json::from_slice(&response.body)
        .map_err(|e| DriveError::MalformedResponse(format!("created file: {e}")))?;

    let parents = created
        .parents
        .into_iter()
        .map(remote_id)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RemoteResource::new(remote_id(created.id)?, created.name, parents))
}
