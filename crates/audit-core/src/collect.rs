//! Pagination collectors
//!
//! Each collector drives one paginated endpoint to exhaustion with its
//! own local cursor and returns a fresh result container; no cursor
//! state is shared between loops. Any malformed page aborts the whole
//! collection with the error from the graph layer.

use crate::graph::{BlockedList, GraphApi, GraphError, ListView, MemberRecord, Result};
use tracing::info;

/// Page size requested when fetching list members
pub const MEMBER_PAGE_LIMIT: u32 = 100;

/// Page size requested when fetching follows
pub const FOLLOW_PAGE_LIMIT: u32 = 100;

/// The account's moderation lists, in discovery order
#[derive(Debug, Clone, Default)]
pub struct ModerationLists {
    /// Every blocked and muted list (blocked first)
    pub all: Vec<ListView>,
    /// The blocked subset: exactly the lists whose blocks get lifted
    /// and restored. Mute state is never touched.
    pub blocked: Vec<BlockedList>,
}

/// Whether a page's cursor continues the pagination
///
/// Servers signal the final page with an absent or empty cursor.
fn continues(cursor: Option<String>) -> Option<String> {
    cursor.filter(|c| !c.is_empty())
}

/// Collect the account's blocked and muted moderation lists
///
/// Blocked lists additionally populate [`ModerationLists::blocked`];
/// a blocked list whose viewer state carries no block-record URI
/// cannot be lifted and restored, so it fails the collection.
pub async fn collect_moderation_lists(api: &dyn GraphApi) -> Result<ModerationLists> {
    let mut all = Vec::new();
    let mut blocked = Vec::new();

    let mut cursor: Option<String> = None;
    loop {
        let page = api.list_blocks(cursor.take()).await?;
        for list in &page.lists {
            let block_uri = list
                .viewer
                .as_ref()
                .and_then(|v| v.blocked.clone())
                .ok_or_else(|| GraphError::MissingBlockRecord {
                    list: list.uri.clone(),
                })?;
            blocked.push(BlockedList {
                uri: list.uri.clone(),
                block_uri,
            });
        }
        all.extend(page.lists);
        match continues(page.cursor) {
            Some(c) => cursor = Some(c),
            None => break,
        }
    }
    info!(count = blocked.len(), "collected blocked lists");

    let mut cursor: Option<String> = None;
    loop {
        let page = api.list_mutes(cursor.take()).await?;
        all.extend(page.lists);
        match continues(page.cursor) {
            Some(c) => cursor = Some(c),
            None => break,
        }
    }
    info!(count = all.len(), "collected moderation lists");

    Ok(ModerationLists { all, blocked })
}

/// Collect the members of every given list into one flat sequence
///
/// Lists are processed in discovery order, each with a fresh cursor.
/// Duplicates across lists are kept; the reporter's keyed lookup makes
/// them harmless. Errors are scoped to the list whose fetch failed.
pub async fn collect_list_members(
    api: &dyn GraphApi,
    lists: &[ListView],
) -> Result<Vec<MemberRecord>> {
    let mut members = Vec::new();

    for list in lists {
        info!(list = %list.uri, name = %list.name, "fetching list members");
        let mut cursor: Option<String> = None;
        loop {
            let page = api
                .list_members(&list.uri, cursor.take(), MEMBER_PAGE_LIMIT)
                .await
                .map_err(|source| GraphError::ListScope {
                    list: list.uri.clone(),
                    source: Box::new(source),
                })?;
            members.extend(page.items.into_iter().map(|item| MemberRecord {
                did: item.subject.did,
                handle: item.subject.handle,
            }));
            match continues(page.cursor) {
                Some(c) => cursor = Some(c),
                None => break,
            }
        }
    }
    info!(count = members.len(), "collected list members");

    Ok(members)
}

/// Collect every account `actor` follows
pub async fn collect_follows(api: &dyn GraphApi, actor: &str) -> Result<Vec<MemberRecord>> {
    let mut follows = Vec::new();

    let mut cursor: Option<String> = None;
    loop {
        let page = api
            .get_follows(actor, cursor.take(), FOLLOW_PAGE_LIMIT)
            .await?;
        follows.extend(page.follows.into_iter().map(|profile| MemberRecord {
            did: profile.did,
            handle: profile.handle,
        }));
        match continues(page.cursor) {
            Some(c) => cursor = Some(c),
            None => break,
        }
    }
    info!(count = follows.len(), "collected follows");

    Ok(follows)
}
