//! In-memory Clipboard History Service.
//! 内存中的剪贴板历史服务。
//!
//! Implements both service ports with the same ordering, search and preview
//! rules as the persistent service, plus fault injection and response gates
//! for exercising the store's ordering guarantees.

mod content;
mod faults;
mod seed;

pub use content::NewClip;
pub use faults::{FaultOp, ResponseGate};
pub use seed::{load_seed_file, SeedClip, SeedContent};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use pt_core::ports::{ClipHistoryPort, ClockPort, HistoryEvent, HistoryEventsPort, HistoryServiceError, HistorySubscription};
use pt_core::{ClipId, ClipPage, FilterType, PreviewPayload};
use tokio::sync::mpsc;
use tracing::{debug, info};

use content::StoredClip;
use faults::Faults;

/// Buffered push events per subscriber.
const SUBSCRIBER_CAPACITY: usize = 64;

#[derive(Debug, Default)]
struct HistoryState {
    clips: Vec<StoredClip>,
    next_id: i64,
}

pub struct InMemoryClipHistory {
    clock: Arc<dyn ClockPort>,
    state: Mutex<HistoryState>,
    subscribers: Mutex<Vec<mpsc::Sender<HistoryEvent>>>,
    faults: Mutex<Faults>,
    keep_window_open: AtomicBool,
}

impl InMemoryClipHistory {
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        Self {
            clock,
            state: Mutex::new(HistoryState::default()),
            subscribers: Mutex::new(Vec::new()),
            faults: Mutex::new(Faults::default()),
            keep_window_open: AtomicBool::new(false),
        }
    }

    /// Build a history from fixture entries, aged relative to the clock.
    pub fn with_seed(clock: Arc<dyn ClockPort>, seeds: Vec<SeedClip>) -> Self {
        let history = Self::new(clock);
        let now = history.clock.now_secs();
        for seed in seeds {
            if let Some(id) = history.insert(seed.content.into(), now - seed.age_secs) {
                let mut state = lock(&history.state);
                if let Some(clip) = state.clips.iter_mut().find(|clip| clip.id == id) {
                    clip.is_pinned = seed.pinned;
                    clip.tags = seed.tags;
                }
            }
        }
        info!(clips = history.len(), "seeded in-memory history");
        history
    }

    /// Record new clipboard content and notify every subscriber.
    ///
    /// Content identical to an existing clip moves that clip to the top instead
    /// of adding a duplicate. Blank content is ignored and returns `None`.
    pub fn capture(&self, clip: NewClip) -> Option<ClipId> {
        let now = self.clock.now_secs();
        self.capture_at(clip, now)
    }

    pub fn capture_at(&self, clip: NewClip, created_at: i64) -> Option<ClipId> {
        let id = self.insert(clip, created_at)?;
        self.broadcast(HistoryEvent::HistoryChanged);
        Some(id)
    }

    pub fn tag(&self, id: ClipId, tag: impl Into<String>) -> bool {
        let mut state = lock(&self.state);
        match state.clips.iter_mut().find(|clip| clip.id == id) {
            Some(clip) => {
                clip.tags.push(tag.into());
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.state).clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_pinned(&self, id: ClipId) -> Option<bool> {
        lock(&self.state).clips.iter().find(|clip| clip.id == id).map(|clip| clip.is_pinned)
    }

    pub fn keep_window_open(&self) -> bool {
        self.keep_window_open.load(Ordering::SeqCst)
    }

    /// Push an arbitrary event to every live subscriber.
    pub fn broadcast(&self, event: HistoryEvent) {
        let mut subscribers = lock(&self.subscribers);
        subscribers.retain(|tx| !tx.is_closed());
        for tx in subscribers.iter() {
            if tx.try_send(event.clone()).is_err() {
                debug!("subscriber buffer full, dropping event");
            }
        }
    }

    /// Subscriptions whose receiver is still alive.
    pub fn active_subscribers(&self) -> usize {
        lock(&self.subscribers).iter().filter(|tx| !tx.is_closed()).count()
    }

    /// Close every subscription, as a service restart would.
    pub fn disconnect_all(&self) {
        lock(&self.subscribers).clear();
    }

    /// Fail the next call of `op` with `error`.
    pub fn fail_next(&self, op: FaultOp, error: HistoryServiceError) {
        lock(&self.faults).fail_next(op, error);
    }

    /// Hold the response of the next call of `op` until the gate is released.
    pub fn hold_next(&self, op: FaultOp) -> ResponseGate {
        lock(&self.faults).hold_next(op)
    }

    /// How many calls of `op` arrived so far.
    pub fn calls(&self, op: FaultOp) -> usize {
        lock(&self.faults).calls(op)
    }

    fn insert(&self, clip: NewClip, created_at: i64) -> Option<ClipId> {
        let clip = clip.normalized()?;
        let mut state = lock(&self.state);
        if let Some(existing) = state.clips.iter_mut().find(|stored| stored.content == clip) {
            existing.created_at = created_at;
            debug!(clip_id = %existing.id, "duplicate capture, touched existing clip");
            return Some(existing.id);
        }
        state.next_id += 1;
        let id = ClipId::new(state.next_id);
        state.clips.push(StoredClip {
            id,
            content: clip,
            created_at,
            is_pinned: false,
            tags: Vec::new(),
        });
        Some(id)
    }

    /// Compute the answer on arrival (or take an armed failure), then wait on
    /// an armed gate before delivering it.
    async fn answer<T>(
        &self,
        op: FaultOp,
        compute: impl FnOnce(&Self) -> Result<T, HistoryServiceError>,
    ) -> Result<T, HistoryServiceError> {
        let (failure, gate) = lock(&self.faults).arrive(op);
        let result = match failure {
            Some(error) => Err(error),
            None => compute(self),
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        result
    }

    fn set_pinned(&self, id: ClipId, pinned: bool) -> Result<(), HistoryServiceError> {
        let mut state = lock(&self.state);
        let clip = state
            .clips
            .iter_mut()
            .find(|clip| clip.id == id)
            .ok_or(HistoryServiceError::NotFound(id))?;
        clip.is_pinned = pinned;
        Ok(())
    }

    fn matching(&self, filter_type: FilterType, search_query: &str) -> Vec<StoredClip> {
        let needle = search_query.trim().to_lowercase();
        let state = lock(&self.state);
        let mut clips: Vec<StoredClip> = state
            .clips
            .iter()
            .filter(|clip| filter_type.matches(clip.content.content_type()) && clip.matches(&needle))
            .cloned()
            .collect();
        clips.sort_by(StoredClip::service_order);
        clips
    }
}

#[async_trait]
impl ClipHistoryPort for InMemoryClipHistory {
    async fn list_clips(
        &self,
        filter_type: FilterType,
        search_query: &str,
        offset: usize,
        limit: usize,
    ) -> Result<ClipPage, HistoryServiceError> {
        self.answer(FaultOp::List, |history| {
            let items = history
                .matching(filter_type, search_query)
                .iter()
                .skip(offset)
                .take(limit)
                .map(StoredClip::summary)
                .collect();
            Ok(ClipPage { items })
        })
        .await
    }

    async fn count_clips(&self, filter_type: FilterType, search_query: &str) -> Result<u64, HistoryServiceError> {
        self.answer(FaultOp::Count, |history| {
            Ok(history.matching(filter_type, search_query).len() as u64)
        })
        .await
    }

    async fn pin_clip(&self, id: ClipId) -> Result<(), HistoryServiceError> {
        self.answer(FaultOp::Pin, |history| history.set_pinned(id, true)).await
    }

    async fn unpin_clip(&self, id: ClipId) -> Result<(), HistoryServiceError> {
        self.answer(FaultOp::Unpin, |history| history.set_pinned(id, false)).await
    }

    async fn delete_clip(&self, id: ClipId) -> Result<(), HistoryServiceError> {
        self.answer(FaultOp::Delete, |history| {
            let mut state = lock(&history.state);
            let before = state.clips.len();
            state.clips.retain(|clip| clip.id != id);
            if state.clips.len() == before {
                return Err(HistoryServiceError::NotFound(id));
            }
            Ok(())
        })
        .await
    }

    async fn clear_unpinned_clips(&self) -> Result<u64, HistoryServiceError> {
        self.answer(FaultOp::ClearUnpinned, |history| {
            let mut state = lock(&history.state);
            let before = state.clips.len();
            state.clips.retain(|clip| clip.is_pinned);
            Ok((before - state.clips.len()) as u64)
        })
        .await
    }

    async fn fetch_preview(&self, id: ClipId) -> Result<PreviewPayload, HistoryServiceError> {
        self.answer(FaultOp::Preview, |history| {
            let state = lock(&history.state);
            let clip = state
                .clips
                .iter()
                .find(|clip| clip.id == id)
                .ok_or(HistoryServiceError::NotFound(id))?;
            clip.preview_payload()
                .ok_or_else(|| HistoryServiceError::Rejected(format!("clip {} has no deferred preview", id)))
        })
        .await
    }

    async fn set_keep_window_open(&self, keep: bool) -> Result<(), HistoryServiceError> {
        self.answer(FaultOp::KeepWindowOpen, |history| {
            history.keep_window_open.store(keep, Ordering::SeqCst);
            Ok(())
        })
        .await?;
        self.broadcast(HistoryEvent::KeepWindowOpenChanged { keep });
        Ok(())
    }
}

#[async_trait]
impl HistoryEventsPort for InMemoryClipHistory {
    async fn subscribe(&self) -> Result<HistorySubscription, HistoryServiceError> {
        self.answer(FaultOp::Subscribe, |history| {
            let (tx, rx) = mpsc::channel(SUBSCRIBER_CAPACITY);
            lock(&history.subscribers).push(tx);
            Ok(HistorySubscription::new(rx))
        })
        .await
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::FixedClock;
    use pt_core::ContentType;

    const NOW: i64 = 1_700_000_000;

    fn history() -> InMemoryClipHistory {
        InMemoryClipHistory::new(Arc::new(FixedClock::new(NOW)))
    }

    fn ids(page: &ClipPage) -> Vec<i64> {
        page.items.iter().map(|clip| clip.id.get()).collect()
    }

    #[tokio::test]
    async fn list_orders_pinned_first_then_newest() {
        let history = history();
        let a = history.capture_at(NewClip::Text("a".into()), NOW - 30).unwrap();
        let b = history.capture_at(NewClip::Text("b".into()), NOW - 20).unwrap();
        let c = history.capture_at(NewClip::Text("c".into()), NOW - 20).unwrap();
        history.pin_clip(a).await.unwrap();

        let page = history.list_clips(FilterType::All, "", 0, 10).await.unwrap();
        assert_eq!(ids(&page), vec![a.get(), c.get(), b.get()]);
    }

    #[tokio::test]
    async fn count_is_scoped_to_filter_and_search() {
        let history = history();
        history.capture(NewClip::Text("roadmap draft".into()));
        history.capture(NewClip::Text("grocery list".into()));
        history.capture(NewClip::Color("#ff0000".into()));

        assert_eq!(history.count_clips(FilterType::All, "").await.unwrap(), 3);
        assert_eq!(history.count_clips(FilterType::All, "ROAD").await.unwrap(), 1);
        assert_eq!(history.count_clips(FilterType::Only(ContentType::Color), "").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn duplicate_capture_touches_instead_of_adding() {
        let history = history();
        let first = history.capture_at(NewClip::Text("same".into()), NOW - 100).unwrap();
        history.capture_at(NewClip::Text("other".into()), NOW - 50);
        let again = history.capture_at(NewClip::Text(" same ".into()), NOW).unwrap();

        assert_eq!(first, again);
        assert_eq!(history.len(), 2);
        let page = history.list_clips(FilterType::All, "", 0, 10).await.unwrap();
        assert_eq!(page.items[0].id, first);
    }

    #[tokio::test]
    async fn clear_keeps_pinned_and_reports_count() {
        let history = history();
        let keep = history.capture(NewClip::Text("keep".into())).unwrap();
        history.capture(NewClip::Text("drop 1".into()));
        history.capture(NewClip::Text("drop 2".into()));
        history.pin_clip(keep).await.unwrap();

        assert_eq!(history.clear_unpinned_clips().await.unwrap(), 2);
        assert_eq!(history.len(), 1);
        assert_eq!(history.is_pinned(keep), Some(true));
    }

    #[tokio::test]
    async fn capture_notifies_live_subscribers() {
        let history = history();
        let mut first = history.subscribe().await.unwrap();
        let second = history.subscribe().await.unwrap();
        drop(second);

        history.capture(NewClip::Text("fresh".into()));

        assert_eq!(first.events.recv().await, Some(HistoryEvent::HistoryChanged));
        assert_eq!(history.active_subscribers(), 1);

        history.disconnect_all();
        assert_eq!(first.events.recv().await, None);
    }

    #[tokio::test]
    async fn injected_failure_applies_once() {
        let history = history();
        let id = history.capture(NewClip::Text("x".into())).unwrap();
        history.fail_next(FaultOp::Delete, HistoryServiceError::Rejected("locked".into()));

        assert_eq!(
            history.delete_clip(id).await,
            Err(HistoryServiceError::Rejected("locked".into()))
        );
        assert_eq!(history.delete_clip(id).await, Ok(()));
        assert_eq!(history.delete_clip(id).await, Err(HistoryServiceError::NotFound(id)));
        assert_eq!(history.calls(FaultOp::Delete), 3);
    }

    #[tokio::test]
    async fn preview_serves_image_bytes_only() {
        let history = history();
        let image = history
            .capture(NewClip::Image { mime_type: "image/png".into(), bytes: vec![9, 9] })
            .unwrap();
        let text = history.capture(NewClip::Text("plain".into())).unwrap();

        assert_eq!(
            history.fetch_preview(image).await.unwrap(),
            PreviewPayload::Bytes { mime_type: "image/png".into(), bytes: vec![9, 9] }
        );
        assert!(matches!(history.fetch_preview(text).await, Err(HistoryServiceError::Rejected(_))));
    }

    #[tokio::test]
    async fn held_response_reflects_state_at_arrival() {
        let history = Arc::new(history());
        history.capture(NewClip::Text("one".into()));
        let gate = history.hold_next(FaultOp::Count);

        let pending = tokio::spawn({
            let history = history.clone();
            async move { history.count_clips(FilterType::All, "").await }
        });
        tokio::task::yield_now().await;
        history.capture(NewClip::Text("two".into()));
        gate.release();

        assert_eq!(pending.await.unwrap(), Ok(1));
    }
}
