use thiserror::Error;

use crate::clip::ClipId;

/// Failures reported by the external Clipboard History Service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryServiceError {
    #[error("history service unavailable: {0}")]
    Unavailable(String),

    #[error("history service rejected the command: {0}")]
    Rejected(String),

    #[error("clip {0} not found")]
    NotFound(ClipId),

    #[error("history service did not answer within {0} ms")]
    Timeout(u64),

    #[error("history event channel closed")]
    ChannelClosed,
}
