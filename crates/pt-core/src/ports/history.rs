use async_trait::async_trait;

use super::HistoryServiceError;
use crate::clip::{ClipId, ClipPage, PreviewPayload};
use crate::query::FilterType;

/// Command/response contract of the Clipboard History Service.
///
/// 剪贴板历史服务的命令/响应端口。
///
/// # Behavior / 行为
/// - `list_clips` returns items ordered pin-first, then newest first.
/// - `count_clips` is scoped to the same filter and search as `list_clips`.
#[async_trait]
pub trait ClipHistoryPort: Send + Sync {
    async fn list_clips(
        &self,
        filter_type: FilterType,
        search_query: &str,
        offset: usize,
        limit: usize,
    ) -> Result<ClipPage, HistoryServiceError>;

    async fn count_clips(
        &self,
        filter_type: FilterType,
        search_query: &str,
    ) -> Result<u64, HistoryServiceError>;

    async fn pin_clip(&self, id: ClipId) -> Result<(), HistoryServiceError>;

    async fn unpin_clip(&self, id: ClipId) -> Result<(), HistoryServiceError>;

    async fn delete_clip(&self, id: ClipId) -> Result<(), HistoryServiceError>;

    /// Delete every unpinned clip, returning how many were deleted.
    async fn clear_unpinned_clips(&self) -> Result<u64, HistoryServiceError>;

    async fn fetch_preview(&self, id: ClipId) -> Result<PreviewPayload, HistoryServiceError>;

    async fn set_keep_window_open(&self, keep: bool) -> Result<(), HistoryServiceError>;
}
