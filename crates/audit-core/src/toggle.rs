//! The unblocked window
//!
//! The network hides the follow relationships of blocked-list members
//! from the viewer, so the follow graph can only be read accurately
//! with the list blocks lifted. This module scopes that lifted state:
//! whatever the guarded work does, the blocks it removed get their
//! restore attempt before control leaves the window.

use crate::audit::AuditError;
use crate::graph::{BlockedList, GraphApi};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Wait after unblocking before relying on the unblocked state.
///
/// The read path is eventually consistent; querying follows before the
/// unblocks are visible would still suppress affected relationships.
pub const SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Run `guarded` with the given list blocks lifted
///
/// Unblocks each list in order, waits `settle` for the change to become
/// visible, awaits `guarded`, then re-blocks every list in the same
/// order regardless of how `guarded` finished. The guarded error wins
/// over restore errors; restore failures on an otherwise successful run
/// surface as [`AuditError::RestoreFailed`].
///
/// A failure during the unblock phase itself propagates immediately
/// with no rollback of earlier unblocks, leaving the account partially
/// unblocked. The log names every list that was already unblocked.
pub async fn with_lists_unblocked<T, F>(
    api: &dyn GraphApi,
    blocked: &[BlockedList],
    settle: Duration,
    guarded: F,
) -> Result<T, AuditError>
where
    F: Future<Output = Result<T, AuditError>>,
{
    for list in blocked {
        info!(list = %list.uri, "unblocking list");
        api.unblock_list(list).await.map_err(AuditError::Graph)?;
    }

    if !blocked.is_empty() && !settle.is_zero() {
        info!(seconds = settle.as_secs(), "waiting for unblocks to settle");
        tokio::time::sleep(settle).await;
    }

    let outcome = guarded.await;

    // Restore runs on every exit path out of the window, and attempts
    // every list even if an earlier re-block fails.
    let mut failed_restores = Vec::new();
    for list in blocked {
        info!(list = %list.uri, "re-blocking list");
        if let Err(e) = api.block_list(list).await {
            warn!(list = %list.uri, error = %e, "failed to restore block");
            failed_restores.push(list.uri.clone());
        }
    }

    match outcome {
        Ok(value) if failed_restores.is_empty() => Ok(value),
        Ok(_) => Err(AuditError::RestoreFailed {
            lists: failed_restores,
        }),
        Err(e) => Err(e),
    }
}
