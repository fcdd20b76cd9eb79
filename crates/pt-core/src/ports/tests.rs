//! Mock implementations of the history ports using `mockall`.

use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;
use mockall::predicate::eq;
use tokio::sync::mpsc;

use super::*;
use crate::clip::{ClipId, ClipPage, PreviewPayload};
use crate::query::FilterType;
use crate::ContentType;

mock! {
    pub History {}

    #[async_trait]
    impl ClipHistoryPort for History {
        async fn list_clips(
            &self,
            filter_type: FilterType,
            search_query: &str,
            offset: usize,
            limit: usize,
        ) -> Result<ClipPage, HistoryServiceError>;
        async fn count_clips(&self, filter_type: FilterType, search_query: &str) -> Result<u64, HistoryServiceError>;
        async fn pin_clip(&self, id: ClipId) -> Result<(), HistoryServiceError>;
        async fn unpin_clip(&self, id: ClipId) -> Result<(), HistoryServiceError>;
        async fn delete_clip(&self, id: ClipId) -> Result<(), HistoryServiceError>;
        async fn clear_unpinned_clips(&self) -> Result<u64, HistoryServiceError>;
        async fn fetch_preview(&self, id: ClipId) -> Result<PreviewPayload, HistoryServiceError>;
        async fn set_keep_window_open(&self, keep: bool) -> Result<(), HistoryServiceError>;
    }
}

mock! {
    pub Events {}

    #[async_trait]
    impl HistoryEventsPort for Events {
        async fn subscribe(&self) -> Result<HistorySubscription, HistoryServiceError>;
    }
}

#[tokio::test]
async fn history_port_is_usable_as_trait_object() {
    let mut history = MockHistory::new();
    history
        .expect_count_clips()
        .withf(|filter, search| *filter == FilterType::Only(ContentType::Image) && search.is_empty())
        .times(1)
        .returning(|_, _| Ok(3));
    history
        .expect_delete_clip()
        .with(eq(ClipId::new(9)))
        .returning(|id| Err(HistoryServiceError::NotFound(id)));

    let port: Arc<dyn ClipHistoryPort> = Arc::new(history);

    assert_eq!(port.count_clips(FilterType::Only(ContentType::Image), "").await, Ok(3));
    let err = port.delete_clip(ClipId::new(9)).await.unwrap_err();
    assert_eq!(err.to_string(), "clip 9 not found");
}

#[tokio::test]
async fn subscription_reports_closure_as_end_of_stream() {
    let mut events = MockEvents::new();
    events.expect_subscribe().times(1).returning(|| {
        let (tx, rx) = mpsc::channel(4);
        tx.try_send(HistoryEvent::HistoryChanged).unwrap();
        Ok(HistorySubscription::new(rx))
    });

    let mut subscription = events.subscribe().await.unwrap();
    assert_eq!(subscription.events.recv().await, Some(HistoryEvent::HistoryChanged));
    // Sender was dropped inside the closure.
    assert_eq!(subscription.events.recv().await, None);
}
