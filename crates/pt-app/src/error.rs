//! Store error taxonomy and operation outcomes.
//!
//! Errors never propagate to the view as `Err`: they are recorded as observable
//! store state and echoed in the outcome of the operation that produced them.
//! 错误不会抛给视图层，而是转换为可观察的状态。

use std::fmt;

use pt_core::ClipId;
use serde::Serialize;

/// Command whose acknowledgment failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MutationAction {
    Pin(ClipId),
    Unpin(ClipId),
    Delete(ClipId),
    ClearUnpinned,
    KeepWindowOpen(bool),
}

impl fmt::Display for MutationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationAction::Pin(id) => write!(f, "pin clip {}", id),
            MutationAction::Unpin(id) => write!(f, "unpin clip {}", id),
            MutationAction::Delete(id) => write!(f, "delete clip {}", id),
            MutationAction::ClearUnpinned => f.write_str("clear unpinned clips"),
            MutationAction::KeepWindowOpen(keep) => write!(f, "set keep-window-open to {}", keep),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail")]
pub enum StoreError {
    /// Service unavailable. Retrying is left to the user.
    #[error("failed to load clips: {0}")]
    TransientFetch(String),

    /// The optimistic change was rolled back.
    #[error("could not {action}: {reason}")]
    MutationRejected { action: MutationAction, reason: String },

    /// The item stays listed with a placeholder preview.
    #[error("preview for clip {id} unavailable: {reason}")]
    HydrationFailed { id: ClipId, reason: String },

    /// Cached data is still served; a manual refresh remains possible.
    #[error("history updates disconnected: {0}")]
    SubscriptionLost(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response matched the current descriptor and was the newest one.
    Applied,
    /// A newer request or a descriptor change superseded this response.
    Discarded,
    Failed(StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A later coalesced request took over before this one fired.
    Superseded,
    Completed { list: FetchOutcome, count: FetchOutcome },
}

impl RefreshOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(
            self,
            RefreshOutcome::Completed {
                list: FetchOutcome::Applied,
                ..
            }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationOutcome {
    Committed { affected: u64 },
    /// Absent id, or a mutation for it is already pending.
    NoOp,
    RolledBack(StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OffsetOutcome {
    /// Paging is disabled while a search is active.
    Ignored,
    /// The clamped offset equals the current one.
    Unchanged,
    Moved { offset: usize, refresh: RefreshOutcome },
}
