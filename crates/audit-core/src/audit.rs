//! The audit pipeline
//!
//! Ties the stages together: enumerate moderation lists, gather their
//! members, lift the list blocks long enough to read the full follow
//! graph, restore the blocks, and intersect.

use crate::collect::{collect_follows, collect_list_members, collect_moderation_lists};
use crate::graph::{GraphApi, GraphError};
use crate::report::OverlapReport;
use crate::toggle::with_lists_unblocked;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Errors surfaced by an audit run
#[derive(Debug, Error)]
pub enum AuditError {
    /// A graph read or write failed
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The signed-in session carried no DID to fetch follows for
    #[error("no account DID available for the follow fetch")]
    MissingAccountDid,

    /// The audit finished but some list blocks could not be restored
    #[error("failed to restore blocks on {} list(s): {}", .lists.len(), .lists.join(", "))]
    RestoreFailed {
        /// URIs of the lists left unblocked
        lists: Vec<String>,
    },
}

/// Run the full audit for `actor`
///
/// Collects the account's blocked and muted moderation lists and their
/// members, then fetches the follow list inside an unblocked window
/// (the network hides follow relationships for members of blocked
/// lists). Blocks are restored on every exit path out of that window;
/// `settle` is the wait between unblocking and reading follows.
pub async fn run_audit(
    api: &dyn GraphApi,
    actor: Option<String>,
    settle: Duration,
) -> Result<OverlapReport, AuditError> {
    let lists = collect_moderation_lists(api).await?;
    info!(
        total = lists.all.len(),
        blocked = lists.blocked.len(),
        "moderation lists enumerated"
    );

    let members = collect_list_members(api, &lists.all).await?;

    let follows = with_lists_unblocked(api, &lists.blocked, settle, async {
        let actor = actor.ok_or(AuditError::MissingAccountDid)?;
        collect_follows(api, &actor).await.map_err(AuditError::from)
    })
    .await?;

    let report = OverlapReport::build(&members, &follows);
    info!(matches = report.count(), "audit complete");
    Ok(report)
}
