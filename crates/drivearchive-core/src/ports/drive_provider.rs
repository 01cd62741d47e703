//! Drive provider port (driven/secondary port)
//!
//! The sync engine reaches the remote store only through [`IDriveProvider`].
//! Implementations own authentication: every method is expected to obtain a
//! valid bearer token on its own.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are adapter-specific.
//!   Callers that need to tell a per-entry failure from a run-fatal one
//!   downcast to the adapter's error type.
//! - Uses `#[async_trait]` for async trait methods.

use crate::domain::{PlanEntry, RemoteResource};

/// One page of the remote listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Resources on this page, in listing order
    pub resources: Vec<RemoteResource>,
    /// Token for the next page, `None` on the last page
    pub next_page_token: Option<String>,
}

/// Port trait for remote listing and creation
#[async_trait::async_trait]
pub trait IDriveProvider: Send + Sync {
    /// Fetches a single listing page
    ///
    /// # Arguments
    /// * `page_token` - Continuation token from the previous page, `None` for the first
    async fn list_page(&self, page_token: Option<&str>) -> anyhow::Result<ListPage>;

    /// Creates the folder or uploads the file described by `entry`
    ///
    /// The entry's `parent_id`, when set, becomes the remote parent.
    ///
    /// # Returns
    /// The created resource as reported by the remote store
    async fn create(&self, entry: &PlanEntry) -> anyhow::Result<RemoteResource>;

    /// Fetches every listing page in order
    async fn list_all(&self) -> anyhow::Result<Vec<RemoteResource>> {
        let mut resources = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self.list_page(page_token.as_deref()).await?;
            resources.extend(page.resources);

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::domain::RemoteId;

    struct PagedProvider {
        pages: Vec<ListPage>,
        seen_tokens: Mutex<Vec<Option<String>>>,
    }

    #[async_trait::async_trait]
    impl IDriveProvider for PagedProvider {
        async fn list_page(&self, page_token: Option<&str>) -> anyhow::Result<ListPage> {
            let mut seen = self.seen_tokens.lock().unwrap();
            let index = seen.len();
            seen.push(page_token.map(str::to_string));
            Ok(self.pages[index].clone())
        }

        async fn create(&self, _entry: &PlanEntry) -> anyhow::Result<RemoteResource> {
            anyhow::bail!("not used")
        }
    }

    fn resource(id: &str) -> RemoteResource {
        RemoteResource::new(RemoteId::new(id.to_string()).unwrap(), id, Vec::new())
    }

    #[tokio::test]
    async fn test_list_all_follows_page_tokens() {
        let provider = PagedProvider {
            pages: vec![
                ListPage {
                    resources: vec![resource("a"), resource("b")],
                    next_page_token: Some("p2".to_string()),
                },
                ListPage {
                    resources: vec![resource("c")],
                    next_page_token: None,
                },
            ],
            seen_tokens: Mutex::new(Vec::new()),
        };

        let all = provider.list_all().await.unwrap();
        let ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(
            *provider.seen_tokens.lock().unwrap(),
            vec![None, Some("p2".to_string())]
        );
    }

    #[tokio::test]
    async fn test_list_all_stops_on_empty_token() {
        let provider = PagedProvider {
            pages: vec![ListPage {
                resources: vec![resource("a")],
                next_page_token: Some(String::new()),
            }],
            seen_tokens: Mutex::new(Vec::new()),
        };

        assert_eq!(provider.list_all().await.unwrap().len(), 1);
    }
}
