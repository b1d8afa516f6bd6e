//! Remote graph API surface
//!
//! This module defines the slice of the `app.bsky.graph` API the audit
//! consumes, as an async trait so the pipeline can run against either
//! the real XRPC-backed implementation or an in-memory fake in tests.
//!
//! Every paginated endpoint returns a page of items plus an optional
//! continuation cursor; an absent (or empty) cursor marks the final
//! page. A page whose expected item array is missing is a fatal
//! `MalformedPage` carrying the raw payload for diagnosis.

use async_trait::async_trait;
use atproto_client::xrpc::{XrpcClient, XrpcError, XrpcRequest};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Page size requested from the list-of-lists endpoints
const LIST_PAGE_LIMIT: u32 = 50;

/// Errors that can occur talking to the graph API
#[derive(Debug, Error)]
pub enum GraphError {
    /// Transport or server error
    #[error("XRPC error: {0}")]
    Xrpc(#[from] XrpcError),

    /// A pagination response lacked its expected item array
    #[error("malformed page from {endpoint}: missing `{field}` array")]
    MalformedPage {
        /// Endpoint NSID that produced the page
        endpoint: String,
        /// Name of the missing item array
        field: String,
        /// Raw response payload, kept for the error log
        payload: serde_json::Value,
    },

    /// A page had its item array but did not decode into the expected shape
    #[error("failed to decode {endpoint} response")]
    Decode {
        /// Endpoint NSID that produced the page
        endpoint: String,
        /// Underlying serde error
        #[source]
        source: serde_json::Error,
    },

    /// A blocked list carried no block-record URI in its viewer state
    #[error("blocked list {list} has no block record in viewer state")]
    MissingBlockRecord {
        /// URI of the offending list
        list: String,
    },

    /// An error scoped to one list's membership fetch
    #[error("list {list}: {source}")]
    ListScope {
        /// URI of the list whose fetch failed
        list: String,
        /// The underlying failure
        #[source]
        source: Box<GraphError>,
    },
}

/// Result type for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

// =============================================================================
// Wire Types
// =============================================================================

/// Viewer state for a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListViewerState {
    /// Whether the list is muted by the viewer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muted: Option<bool>,

    /// URI of the viewer's block record if the list is blocked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked: Option<String>,
}

/// A moderation list as returned by the list-of-lists endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListView {
    /// List URI
    pub uri: String,

    /// List name
    pub name: String,

    /// List purpose (e.g., "app.bsky.graph.defs#modlist")
    pub purpose: String,

    /// Viewer state, carrying the block record URI when blocked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer: Option<ListViewerState>,
}

/// A user referenced by a list item or a follow entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectProfile {
    /// Stable unique identifier; identity for all matching
    pub did: String,

    /// Display handle; mutable upstream, never used as identity
    pub handle: String,
}

/// A membership entry of a moderation list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItemView {
    /// List item record URI
    pub uri: String,

    /// The user on the list
    pub subject: SubjectProfile,
}

/// One page of moderation lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage {
    /// Lists on this page
    pub lists: Vec<ListView>,

    /// Continuation cursor; absent on the final page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// One page of list members
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPage {
    /// Members on this page
    pub items: Vec<ListItemView>,

    /// Continuation cursor; absent on the final page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// One page of follow entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowPage {
    /// Followed accounts on this page
    pub follows: Vec<SubjectProfile>,

    /// Continuation cursor; absent on the final page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

// =============================================================================
// Domain Types
// =============================================================================

/// A `(did, handle)` pair accumulated by the collectors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRecord {
    /// Stable unique identifier
    pub did: String,
    /// Display handle
    pub handle: String,
}

/// A list the account has blocked, with the record needed to lift it
///
/// Unblocking deletes the viewer's listblock record; re-blocking
/// creates a fresh one. The list URI is the stable identity, the
/// block-record URI is only valid until the unblock consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockedList {
    /// URI of the moderation list itself
    pub uri: String,
    /// URI of the viewer's listblock record at discovery time
    pub block_uri: String,
}

// =============================================================================
// Trait
// =============================================================================

/// The remote graph operations the audit depends on
///
/// All pagination is cursor-driven: pass the cursor from the previous
/// page, or `None` for the first page.
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Fetch one page of the account's blocked moderation lists
    async fn list_blocks(&self, cursor: Option<String>) -> Result<ListPage>;

    /// Fetch one page of the account's muted moderation lists
    async fn list_mutes(&self, cursor: Option<String>) -> Result<ListPage>;

    /// Fetch one page of a list's members
    async fn list_members(
        &self,
        list: &str,
        cursor: Option<String>,
        limit: u32,
    ) -> Result<MemberPage>;

    /// Fetch one page of the accounts `actor` follows
    async fn get_follows(
        &self,
        actor: &str,
        cursor: Option<String>,
        limit: u32,
    ) -> Result<FollowPage>;

    /// Delete the block record for a list
    async fn unblock_list(&self, list: &BlockedList) -> Result<()>;

    /// Create a new block record for a list
    async fn block_list(&self, list: &BlockedList) -> Result<()>;
}

// =============================================================================
// XRPC-backed Implementation
// =============================================================================

/// `GraphApi` implementation over an authenticated XRPC client
pub struct XrpcGraphApi {
    /// Authenticated XRPC client
    client: XrpcClient,
    /// DID of the account whose repo holds the listblock records
    repo_did: String,
}

impl XrpcGraphApi {
    /// Create a new graph API over an authenticated client
    pub fn new(client: XrpcClient, repo_did: impl Into<String>) -> Self {
        Self {
            client,
            repo_did: repo_did.into(),
        }
    }

    async fn fetch_page<T: DeserializeOwned>(
        &self,
        request: XrpcRequest,
        endpoint: &str,
        field: &str,
    ) -> Result<T> {
        let response = self.client.query::<serde_json::Value>(request).await?;
        decode_page(endpoint, field, response.data)
    }
}

/// Extract the record key from an AT URI
fn rkey(uri: &str) -> &str {
    uri.rsplit('/').next().unwrap_or(uri)
}

/// Validate that a page payload carries its item array, then decode it
///
/// The raw payload travels in the error so the caller can log exactly
/// what the server sent before aborting.
pub(crate) fn decode_page<T: DeserializeOwned>(
    endpoint: &str,
    field: &str,
    payload: serde_json::Value,
) -> Result<T> {
    if !payload.get(field).map(serde_json::Value::is_array).unwrap_or(false) {
        error!(%endpoint, %payload, "malformed page response");
        return Err(GraphError::MalformedPage {
            endpoint: endpoint.to_string(),
            field: field.to_string(),
            payload,
        });
    }

    serde_json::from_value(payload).map_err(|source| GraphError::Decode {
        endpoint: endpoint.to_string(),
        source,
    })
}

#[async_trait]
impl GraphApi for XrpcGraphApi {
    async fn list_blocks(&self, cursor: Option<String>) -> Result<ListPage> {
        let mut request = XrpcRequest::query("app.bsky.graph.getListBlocks")
            .param("limit", LIST_PAGE_LIMIT.to_string());
        if let Some(c) = cursor {
            request = request.param("cursor", c);
        }
        self.fetch_page(request, "app.bsky.graph.getListBlocks", "lists")
            .await
    }

    async fn list_mutes(&self, cursor: Option<String>) -> Result<ListPage> {
        let mut request = XrpcRequest::query("app.bsky.graph.getListMutes")
            .param("limit", LIST_PAGE_LIMIT.to_string());
        if let Some(c) = cursor {
            request = request.param("cursor", c);
        }
        self.fetch_page(request, "app.bsky.graph.getListMutes", "lists")
            .await
    }

    async fn list_members(
        &self,
        list: &str,
        cursor: Option<String>,
        limit: u32,
    ) -> Result<MemberPage> {
        let mut request = XrpcRequest::query("app.bsky.graph.getList")
            .param("list", list.to_string())
            .param("limit", limit.to_string());
        if let Some(c) = cursor {
            request = request.param("cursor", c);
        }
        self.fetch_page(request, "app.bsky.graph.getList", "items")
            .await
    }

    async fn get_follows(
        &self,
        actor: &str,
        cursor: Option<String>,
        limit: u32,
    ) -> Result<FollowPage> {
        let mut request = XrpcRequest::query("app.bsky.graph.getFollows")
            .param("actor", actor.to_string())
            .param("limit", limit.to_string());
        if let Some(c) = cursor {
            request = request.param("cursor", c);
        }
        self.fetch_page(request, "app.bsky.graph.getFollows", "follows")
            .await
    }

    async fn unblock_list(&self, list: &BlockedList) -> Result<()> {
        let body = serde_json::json!({
            "repo": self.repo_did,
            "collection": "app.bsky.graph.listblock",
            "rkey": rkey(&list.block_uri),
        });

        let request = XrpcRequest::procedure("com.atproto.repo.deleteRecord")
            .json_body(&body)
            .map_err(|source| GraphError::Decode {
                endpoint: "com.atproto.repo.deleteRecord".to_string(),
                source,
            })?;

        self.client.procedure::<serde_json::Value>(request).await?;
        Ok(())
    }

    async fn block_list(&self, list: &BlockedList) -> Result<()> {
        let record = serde_json::json!({
            "$type": "app.bsky.graph.listblock",
            "subject": list.uri,
            "createdAt": chrono::Utc::now().to_rfc3339(),
        });

        let body = serde_json::json!({
            "repo": self.repo_did,
            "collection": "app.bsky.graph.listblock",
            "record": record,
        });

        let request = XrpcRequest::procedure("com.atproto.repo.createRecord")
            .json_body(&body)
            .map_err(|source| GraphError::Decode {
                endpoint: "com.atproto.repo.createRecord".to_string(),
                source,
            })?;

        self.client.procedure::<serde_json::Value>(request).await?;
        Ok(())
    }
}
