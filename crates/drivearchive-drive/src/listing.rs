//! Listing request and response decoding
//!
//! The listing asks only for `id`, `name` and `parents` of every visible
//! file plus the continuation token. Decoding is strict about `id` and
//! `name` and lenient about `parents`, which Drive omits for items without
//! a parent.

use drivearchive_core::domain::{RemoteId, RemoteResource};
use drivearchive_core::ports::{ApiRequest, ApiResponse, HttpMethod, ListPage};
use serde::Deserialize;

use crate::DriveError;

/// Partial-response field selector of the listing call
pub const LIST_FIELDS: &str = "nextPageToken,files(id,name,parents)";

// ============================================================================
// Drive API response types for deserialization
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListResponse {
    files: Vec<FileEntry>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    id: String,
    name: String,
    #[serde(default)]
    parents: Vec<String>,
}

// ============================================================================
// Request / response
// ============================================================================

/// Builds the listing request for one page
///
/// # Arguments
/// * `files_url` - Drive `files` endpoint
/// * `access_token` - Bearer token
/// * `page_token` - Continuation token, `None` for the first page
/// * `page_size` - Optional page size; the server default applies otherwise
pub fn list_request(
    files_url: &str,
    access_token: &str,
    page_token: Option<&str>,
    page_size: Option<u32>,
) -> ApiRequest {
    let mut url = format!("{files_url}?fields={LIST_FIELDS}");
    if let Some(size) = page_size {
        url.push_str(&format!("&pageSize={size}"));
    }
    if let Some(token) = page_token {
        let encoded: String = url::form_urlencoded::byte_serialize(token.as_bytes()).collect();
        url.push_str("&pageToken=");
        url.push_str(&encoded);
    }

    ApiRequest::new(HttpMethod::Get, url).bearer_auth(access_token)
}

/// Decodes one listing page
///
/// # Errors
/// - [`DriveError::Api`] for a non-2xx status
/// - [`DriveError::MalformedResponse`] when `files`, `id` or `name` is
///   missing or an ID is unusable
pub fn decode_list_page(response: &ApiResponse) -> Result<ListPage, DriveError> {
    if !response.is_success() {
        return Err(DriveError::Api {
            status: response.status,
            body: response.text(),
        });
    }

    let parsed: FileListResponse = serde_json::from_slice(&response.body)
        .map_err(|e| DriveError::MalformedResponse(format!("file list: {e}")))?;

    let resources = parsed
        .files
        .into_iter()
        .map(to_resource)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ListPage {
        resources,
        next_page_token: parsed.next_page_token.filter(|t| !t.is_empty()),
    })
}

fn to_resource(entry: FileEntry) -> Result<RemoteResource, DriveError> {
    let id = remote_id(entry.id)?;
    let parents = entry
        .parents
        .into_iter()
        .map(remote_id)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(RemoteResource::new(id, entry.name, parents))
}

pub(crate) fn remote_id(raw: String) -> Result<RemoteId, DriveError> {
    RemoteId::new(raw).map_err(|e| DriveError::MalformedResponse(e.to_string()))
}
