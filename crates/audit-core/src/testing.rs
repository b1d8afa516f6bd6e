//! In-memory test doubles for the graph API
//!
//! [`FakeGraphApi`] serves pre-baked pages and records every call, so
//! unit and integration tests can drive the whole pipeline without a
//! network. Not gated behind `cfg(test)` so the binary crate's
//! integration tests can use it too.

use crate::graph::{
    BlockedList, FollowPage, GraphApi, GraphError, ListItemView, ListPage, ListView,
    ListViewerState, MemberPage, Result, SubjectProfile,
};
use async_trait::async_trait;
use atproto_client::xrpc::XrpcError;
use std::collections::HashMap;
use std::sync::Mutex;

// ===== Fixtures =====

/// A moderation list with no viewer state
pub fn mod_list(uri: &str, name: &str) -> ListView {
    ListView {
        uri: uri.to_string(),
        name: name.to_string(),
        purpose: "app.bsky.graph.defs#modlist".to_string(),
        viewer: None,
    }
}

/// A moderation list the viewer has blocked
///
/// The block-record URI is derived from the list URI's record key, the
/// way a real viewer state points at the listblock record.
pub fn blocked_list(uri: &str, name: &str) -> ListView {
    let rkey = uri.rsplit('/').next().unwrap_or(uri);
    ListView {
        viewer: Some(ListViewerState {
            muted: None,
            blocked: Some(format!(
                "at://did:plc:me/app.bsky.graph.listblock/{rkey}"
            )),
        }),
        ..mod_list(uri, name)
    }
}

/// A list membership entry
pub fn member(did: &str, handle: &str) -> ListItemView {
    ListItemView {
        uri: format!("at://did:plc:owner/app.bsky.graph.listitem/{handle}"),
        subject: profile(did, handle),
    }
}

/// A followed or listed account
pub fn profile(did: &str, handle: &str) -> SubjectProfile {
    SubjectProfile {
        did: did.to_string(),
        handle: handle.to_string(),
    }
}

// ===== Call log =====

/// Everything a [`FakeGraphApi`] was asked to do, in order per endpoint
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    /// Cursors passed to `list_blocks`
    pub block_list_cursors: Vec<Option<String>>,
    /// Cursors passed to `list_mutes`
    pub mute_list_cursors: Vec<Option<String>>,
    /// `(list, cursor)` pairs passed to `list_members`
    pub member_cursors: Vec<(String, Option<String>)>,
    /// Cursors passed to `get_follows`
    pub follow_cursors: Vec<Option<String>>,
    /// List URIs passed to `unblock_list`, in call order
    pub unblocked: Vec<String>,
    /// List URIs passed to `block_list`, in call order
    pub reblocked: Vec<String>,
}

// ===== Fake =====

/// In-memory [`GraphApi`] serving configured pages
///
/// Pagination uses numeric cursors: the first page is served for a
/// `None` cursor, and each page whose successor exists returns the
/// successor's index as its cursor. Unconfigured endpoints serve one
/// empty page.
#[derive(Debug, Default)]
pub struct FakeGraphApi {
    blocks_pages: Vec<Vec<ListView>>,
    mutes_pages: Vec<Vec<ListView>>,
    member_pages: HashMap<String, Vec<Vec<ListItemView>>>,
    follow_pages: Vec<Vec<SubjectProfile>>,
    malformed_blocks: bool,
    malformed_members_for: Vec<String>,
    fail_follows: bool,
    fail_unblock_of: Vec<String>,
    fail_reblock_of: Vec<String>,
    calls: Mutex<CallLog>,
}

impl FakeGraphApi {
    /// An empty fake: every endpoint serves a single empty page
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve these pages from the blocked-lists endpoint
    pub fn with_block_lists(mut self, pages: Vec<Vec<ListView>>) -> Self {
        self.blocks_pages = pages;
        self
    }

    /// Serve these pages from the muted-lists endpoint
    pub fn with_mute_lists(mut self, pages: Vec<Vec<ListView>>) -> Self {
        self.mutes_pages = pages;
        self
    }

    /// Serve these membership pages for one list
    pub fn with_members(mut self, list: &str, pages: Vec<Vec<ListItemView>>) -> Self {
        self.member_pages.insert(list.to_string(), pages);
        self
    }

    /// Serve these pages from the follows endpoint
    pub fn with_follows(mut self, pages: Vec<Vec<SubjectProfile>>) -> Self {
        self.follow_pages = pages;
        self
    }

    /// Make the blocked-lists endpoint return a malformed page
    pub fn with_malformed_blocks(mut self) -> Self {
        self.malformed_blocks = true;
        self
    }

    /// Make the membership fetch for one list return a malformed page
    pub fn with_malformed_members_for(mut self, list: &str) -> Self {
        self.malformed_members_for.push(list.to_string());
        self
    }

    /// Make the follows endpoint fail with a server error
    pub fn with_follow_failure(mut self) -> Self {
        self.fail_follows = true;
        self
    }

    /// Make `unblock_list` fail for one list
    pub fn with_unblock_failure(mut self, list: &str) -> Self {
        self.fail_unblock_of.push(list.to_string());
        self
    }

    /// Make `block_list` fail for one list
    pub fn with_reblock_failure(mut self, list: &str) -> Self {
        self.fail_reblock_of.push(list.to_string());
        self
    }

    /// Snapshot of every call made so far
    pub fn calls(&self) -> CallLog {
        self.calls.lock().expect("call log poisoned").clone()
    }

    fn log<F: FnOnce(&mut CallLog)>(&self, record: F) {
        record(&mut self.calls.lock().expect("call log poisoned"));
    }
}

/// Serve the page a numeric cursor points at
fn page_at<T: Clone>(pages: &[Vec<T>], cursor: Option<&String>) -> (Vec<T>, Option<String>) {
    let idx: usize = cursor.and_then(|c| c.parse().ok()).unwrap_or(0);
    let items = pages.get(idx).cloned().unwrap_or_default();
    let next = (idx + 1 < pages.len()).then(|| (idx + 1).to_string());
    (items, next)
}

fn malformed(endpoint: &str, field: &str) -> GraphError {
    GraphError::MalformedPage {
        endpoint: endpoint.to_string(),
        field: field.to_string(),
        payload: serde_json::json!({ "error": "upstream hiccup" }),
    }
}

fn server_error(message: &str) -> GraphError {
    GraphError::Xrpc(XrpcError::new(500, "InternalServerError", message))
}

#[async_trait]
impl GraphApi for FakeGraphApi {
    async fn list_blocks(&self, cursor: Option<String>) -> Result<ListPage> {
        self.log(|log| log.block_list_cursors.push(cursor.clone()));
        if self.malformed_blocks {
            return Err(malformed("app.bsky.graph.getListBlocks", "lists"));
        }
        let (lists, cursor) = page_at(&self.blocks_pages, cursor.as_ref());
        Ok(ListPage { lists, cursor })
    }

    async fn list_mutes(&self, cursor: Option<String>) -> Result<ListPage> {
        self.log(|log| log.mute_list_cursors.push(cursor.clone()));
        let (lists, cursor) = page_at(&self.mutes_pages, cursor.as_ref());
        Ok(ListPage { lists, cursor })
    }

    async fn list_members(
        &self,
        list: &str,
        cursor: Option<String>,
        _limit: u32,
    ) -> Result<MemberPage> {
        self.log(|log| log.member_cursors.push((list.to_string(), cursor.clone())));
        if self.malformed_members_for.iter().any(|l| l == list) {
            return Err(malformed("app.bsky.graph.getList", "items"));
        }
        let pages = self.member_pages.get(list).map(Vec::as_slice).unwrap_or(&[]);
        let (items, cursor) = page_at(pages, cursor.as_ref());
        Ok(MemberPage { items, cursor })
    }

    async fn get_follows(
        &self,
        _actor: &str,
        cursor: Option<String>,
        _limit: u32,
    ) -> Result<FollowPage> {
        self.log(|log| log.follow_cursors.push(cursor.clone()));
        if self.fail_follows {
            return Err(server_error("follows unavailable"));
        }
        let (follows, cursor) = page_at(&self.follow_pages, cursor.as_ref());
        Ok(FollowPage { follows, cursor })
    }

    async fn unblock_list(&self, list: &BlockedList) -> Result<()> {
        // Attempts are logged whether or not they succeed
        self.log(|log| log.unblocked.push(list.uri.clone()));
        if self.fail_unblock_of.iter().any(|l| l == &list.uri) {
            return Err(server_error("delete rejected"));
        }
        Ok(())
    }

    async fn block_list(&self, list: &BlockedList) -> Result<()> {
        self.log(|log| log.reblocked.push(list.uri.clone()));
        if self.fail_reblock_of.iter().any(|l| l == &list.uri) {
            return Err(server_error("create rejected"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fake_paginates_with_numeric_cursors() {
        let api = FakeGraphApi::new().with_follows(vec![
            vec![profile("did:plc:a", "a.test")],
            vec![profile("did:plc:b", "b.test")],
        ]);

        let first = api.get_follows("did:plc:me", None, 100).await.unwrap();
        assert_eq!(first.follows[0].did, "did:plc:a");
        assert_eq!(first.cursor, Some("1".to_string()));

        let second = api.get_follows("did:plc:me", first.cursor, 100).await.unwrap();
        assert_eq!(second.follows[0].did, "did:plc:b");
        assert_eq!(second.cursor, None);
    }

    #[tokio::test]
    async fn test_unconfigured_endpoint_serves_empty_final_page() {
        let api = FakeGraphApi::new();

        let page = api.list_blocks(None).await.unwrap();
        assert!(page.lists.is_empty());
        assert!(page.cursor.is_none());
    }

    #[test]
    fn test_blocked_list_fixture_carries_block_record() {
        let list = blocked_list("at://did:plc:abc/app.bsky.graph.list/3k", "spam");
        let viewer = list.viewer.unwrap();
        assert_eq!(
            viewer.blocked,
            Some("at://did:plc:me/app.bsky.graph.listblock/3k".to_string())
        );
    }
}
