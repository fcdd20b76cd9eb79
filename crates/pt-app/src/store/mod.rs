//! ClipStore: single source of truth for the active query and its projection.
//! 剪贴板存储：当前查询及其投影的唯一数据源。

mod optimistic;
mod page_cache;

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use chrono::{Local, TimeZone};
use pt_core::ports::{ClipHistoryPort, ClockPort, HistoryEventsPort, HistoryServiceError};
use pt_core::{ClipId, ClipSummary, FilterType, QueryDescriptor, StoreSettings};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn, Instrument, Span};

use crate::error::{FetchOutcome, MutationAction, MutationOutcome, OffsetOutcome, RefreshOutcome, StoreError};
use crate::hydrator::PreviewHydrator;
use crate::listener::{EventListener, ListenerGuard, ListenerState};
use crate::projection::{group_clips, ClipGroup};
use crate::signals::{lock, StoreSignals};

use optimistic::{PendingChange, PendingMutations};
use page_cache::PageCache;

/// Point-in-time view of the store for status rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub query: QueryDescriptor,
    /// Count matching the current filter and search, `None` until one arrives.
    pub total_count: Option<u64>,
    pub is_loading: bool,
    pub error: Option<StoreError>,
    pub listener: ListenerState,
    pub revision: u64,
}

struct StoreState {
    query: QueryDescriptor,
    cache: PageCache,
    pending: PendingMutations,
    in_flight: usize,
    display: Option<(u64, Arc<[ClipSummary]>)>,
}

impl StoreState {
    fn visible(&self) -> Vec<ClipSummary> {
        self.pending.project(self.cache.items())
    }
}

struct StoreInner {
    history: Arc<dyn ClipHistoryPort>,
    clock: Arc<dyn ClockPort>,
    settings: StoreSettings,
    state: Mutex<StoreState>,
    hydrator: Arc<PreviewHydrator>,
    listener: Arc<EventListener>,
    sequence: AtomicU64,
    coalesce: AtomicU64,
    signals: Arc<StoreSignals>,
}

/// Counts one outstanding fetch in `in_flight`, released even if the fetch
/// future is dropped before the response arrives.
struct LoadingGuard<'a> {
    inner: &'a StoreInner,
    armed: bool,
}

impl<'a> LoadingGuard<'a> {
    fn start(inner: &'a StoreInner, state: &mut StoreState) -> Self {
        state.in_flight += 1;
        Self { inner, armed: true }
    }

    fn finish(mut self, state: &mut StoreState) {
        self.armed = false;
        state.in_flight = state.in_flight.saturating_sub(1);
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            {
                let mut state = lock(&self.inner.state);
                state.in_flight = state.in_flight.saturating_sub(1);
            }
            self.inner.signals.bump();
        }
    }
}

/// Cloneable handle; every clone drives the same store.
///
/// Service failures never surface as `Err`. They are recorded in
/// [`ClipStore::last_error`] and returned in the outcome of the operation.
///
/// # Example
///
/// ```ignore
/// let store = ClipStore::new(history.clone(), history.clone(), clock, settings.store);
/// let _listener = store.init_listener().await;
/// store.refresh().await;
/// for clip in store.display_list().iter() {
///     println!("{} {}", clip.id, clip.preview);
/// }
/// ```
#[derive(Clone)]
pub struct ClipStore {
    inner: Arc<StoreInner>,
}

impl ClipStore {
    pub fn new(
        history: Arc<dyn ClipHistoryPort>,
        events: Arc<dyn HistoryEventsPort>,
        clock: Arc<dyn ClockPort>,
        settings: StoreSettings,
    ) -> Self {
        let signals = Arc::new(StoreSignals::new());
        let hydrator = Arc::new(PreviewHydrator::new(history.clone(), signals.clone()));
        let listener = Arc::new(EventListener::new(events, signals.clone()));
        let state = StoreState {
            query: QueryDescriptor::first_page(settings.page_size),
            cache: PageCache::default(),
            pending: PendingMutations::default(),
            in_flight: 0,
            display: None,
        };
        Self {
            inner: Arc::new(StoreInner {
                history,
                clock,
                settings,
                state: Mutex::new(state),
                hydrator,
                listener,
                sequence: AtomicU64::new(0),
                coalesce: AtomicU64::new(0),
                signals,
            }),
        }
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.inner.settings
    }

    pub fn query(&self) -> QueryDescriptor {
        lock(&self.inner.state).query.clone()
    }

    /// Replace the filter, reset to the first page and refetch immediately.
    #[tracing::instrument(name = "store.set_filter_type", skip(self), fields(filter = %filter_type))]
    pub async fn set_filter_type(&self, filter_type: FilterType) -> RefreshOutcome {
        {
            let mut state = lock(&self.inner.state);
            state.query = state.query.with_filter(filter_type);
        }
        self.supersede_pending_refresh();
        self.inner.signals.bump();
        self.refresh().await
    }

    /// Replace the search text and refetch after the debounce window.
    ///
    /// Only the last call within the window fetches; earlier calls return
    /// [`RefreshOutcome::Superseded`].
    #[tracing::instrument(name = "store.set_search_query", skip(self))]
    pub async fn set_search_query(&self, text: &str) -> RefreshOutcome {
        {
            let mut state = lock(&self.inner.state);
            state.query = state.query.with_search(text);
        }
        self.inner.signals.bump();
        self.request_refresh().await
    }

    /// Move to the page containing `requested`. Disabled while searching.
    #[tracing::instrument(name = "store.set_offset", skip(self))]
    pub async fn set_offset(&self, requested: i64) -> OffsetOutcome {
        let offset = {
            let mut state = lock(&self.inner.state);
            if state.query.is_searching() {
                debug!("paging ignored while a search is active");
                return OffsetOutcome::Ignored;
            }
            let total = state.cache.total_count_for(&state.query.shape());
            let offset = state.query.clamp_offset(requested, total);
            if offset == state.query.offset {
                return OffsetOutcome::Unchanged;
            }
            state.query = state.query.with_offset(offset);
            offset
        };
        self.supersede_pending_refresh();
        self.inner.signals.bump();
        let refresh = self.refresh().await;
        OffsetOutcome::Moved { offset, refresh }
    }

    /// Fetch the page for the current descriptor.
    ///
    /// The response is applied only if the descriptor is still current and no
    /// newer page was applied meanwhile. On failure the previous page stays.
    #[tracing::instrument(name = "store.fetch_all_clips", skip(self))]
    pub async fn fetch_all_clips(&self) -> FetchOutcome {
        let search_limit = self.inner.settings.search_result_limit;
        let (seq, request, loading) = {
            let mut state = lock(&self.inner.state);
            let loading = LoadingGuard::start(&self.inner, &mut state);
            (self.next_sequence(), state.query.request(search_limit), loading)
        };
        self.inner.signals.bump();

        let result = self
            .inner
            .history
            .list_clips(request.filter_type, &request.search_query, request.offset, request.limit)
            .await;

        let (outcome, visible) = {
            let mut state = lock(&self.inner.state);
            loading.finish(&mut state);
            let current = state.query.request(search_limit);
            match result {
                Ok(page) => {
                    let received = page.items.len();
                    if state.cache.accept_page(seq, &request, &current, page.items) {
                        info!(seq, received, offset = request.offset, "page applied");
                        (FetchOutcome::Applied, Some(state.visible()))
                    } else {
                        debug!(seq, "discarding superseded page");
                        (FetchOutcome::Discarded, None)
                    }
                }
                Err(err) if request == current => {
                    (FetchOutcome::Failed(StoreError::TransientFetch(err.to_string())), None)
                }
                Err(err) => {
                    debug!(seq, error = %err, "discarding failure for a superseded query");
                    (FetchOutcome::Discarded, None)
                }
            }
        };

        if let Some(items) = visible {
            let ids: HashSet<ClipId> = items.iter().map(|clip| clip.id).collect();
            self.inner.hydrator.retain_visible(&ids);
            self.inner.hydrator.hydrate(&items);
        }
        match &outcome {
            FetchOutcome::Failed(err) => self.inner.signals.report(err.clone()),
            _ => self.inner.signals.bump(),
        }
        outcome
    }

    /// Fetch the count scoped to the current filter and search.
    #[tracing::instrument(name = "store.fetch_total_count", skip(self))]
    pub async fn fetch_total_count(&self) -> FetchOutcome {
        let (seq, shape, loading) = {
            let mut state = lock(&self.inner.state);
            let loading = LoadingGuard::start(&self.inner, &mut state);
            (self.next_sequence(), state.query.shape(), loading)
        };
        self.inner.signals.bump();

        let result = self
            .inner
            .history
            .count_clips(shape.filter_type, &shape.search_query)
            .await;

        let outcome = {
            let mut state = lock(&self.inner.state);
            loading.finish(&mut state);
            let current = state.query.shape();
            match result {
                Ok(count) if state.cache.accept_count(seq, &shape, &current, count) => {
                    debug!(seq, count, "total count applied");
                    FetchOutcome::Applied
                }
                Ok(_) => FetchOutcome::Discarded,
                Err(err) if shape == current => FetchOutcome::Failed(StoreError::TransientFetch(err.to_string())),
                Err(_) => FetchOutcome::Discarded,
            }
        };

        match &outcome {
            FetchOutcome::Failed(err) => self.inner.signals.report(err.clone()),
            _ => self.inner.signals.bump(),
        }
        outcome
    }

    /// List and count concurrently.
    pub async fn refresh(&self) -> RefreshOutcome {
        let (list, count) = tokio::join!(self.fetch_all_clips(), self.fetch_total_count());
        RefreshOutcome::Completed { list, count }
    }

    /// Coalesced refresh: waits the debounce window and runs only if no later
    /// request arrived in the meantime. Push notifications use this path too.
    pub async fn request_refresh(&self) -> RefreshOutcome {
        let generation = self.inner.coalesce.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.inner.settings.search_debounce()).await;
        if self.inner.coalesce.load(Ordering::SeqCst) != generation {
            debug!(generation, "refresh superseded within the debounce window");
            return RefreshOutcome::Superseded;
        }
        self.refresh().await
    }

    /// Current page merged with pending mutations and hydration state.
    ///
    /// Returns the same `Arc` until something visible changes.
    pub fn display_list(&self) -> Arc<[ClipSummary]> {
        let mut state = lock(&self.inner.state);
        let revision = self.inner.signals.revision();
        if let Some((memo_revision, list)) = &state.display {
            if *memo_revision == revision {
                return Arc::clone(list);
            }
        }

        let merged = self.inner.hydrator.merge(state.visible());
        let list = match state.display.take() {
            Some((_, previous)) if previous[..] == merged[..] => previous,
            _ => Arc::from(merged),
        };
        state.display = Some((revision, Arc::clone(&list)));
        list
    }

    /// Display list grouped into pinned / today / yesterday / earlier.
    pub fn grouped_display(&self) -> Vec<ClipGroup> {
        let now_secs = self.inner.clock.now_secs();
        let now = Local.timestamp_opt(now_secs, 0).single().unwrap_or_else(Local::now);
        group_clips(&self.display_list(), now)
    }

    /// Toggle the pin flag of a visible item.
    ///
    /// The item moves immediately; a rejection moves it back.
    #[tracing::instrument(name = "store.handle_pin", skip(self), fields(clip_id = %id))]
    pub async fn handle_pin(&self, id: ClipId) -> MutationOutcome {
        let (ticket, pinned) = {
            let mut state = lock(&self.inner.state);
            if state.pending.touches(id) {
                debug!("mutation already pending");
                return MutationOutcome::NoOp;
            }
            let Some(clip) = state.visible().into_iter().find(|clip| clip.id == id) else {
                debug!("clip not in the current page");
                return MutationOutcome::NoOp;
            };
            let pinned = !clip.is_pinned;
            (state.pending.push(PendingChange::Pin { id, pinned }), pinned)
        };
        self.inner.signals.bump();

        let action = if pinned {
            MutationAction::Pin(id)
        } else {
            MutationAction::Unpin(id)
        };
        let store = self.clone();
        self.reconcile(ticket, action, async move {
            let call = if pinned {
                store.inner.history.pin_clip(id)
            } else {
                store.inner.history.unpin_clip(id)
            };
            match store.acknowledge(call).await {
                Ok(()) => {
                    {
                        let mut state = lock(&store.inner.state);
                        state.pending.resolve(ticket);
                        state.cache.set_pinned(id, pinned);
                        state.cache.invalidate();
                    }
                    store.inner.signals.bump();
                    info!(pinned, "pin committed");
                    store.refresh().await;
                    MutationOutcome::Committed { affected: 1 }
                }
                Err(err) => store.roll_back(ticket, action, err),
            }
        })
        .await
    }

    /// Remove a visible item. A rejection restores it at its original position.
    #[tracing::instrument(name = "store.handle_delete", skip(self), fields(clip_id = %id))]
    pub async fn handle_delete(&self, id: ClipId) -> MutationOutcome {
        let ticket = {
            let mut state = lock(&self.inner.state);
            if state.pending.touches(id) {
                debug!("mutation already pending");
                return MutationOutcome::NoOp;
            }
            if !state.visible().iter().any(|clip| clip.id == id) {
                debug!("clip not in the current page");
                return MutationOutcome::NoOp;
            }
            state.pending.push(PendingChange::Delete { id })
        };
        self.inner.hydrator.cancel(id);
        self.inner.signals.bump();

        let action = MutationAction::Delete(id);
        let store = self.clone();
        self.reconcile(ticket, action, async move {
            match store.acknowledge(store.inner.history.delete_clip(id)).await {
                // Already gone on the service side: the optimistic state is the truth.
                Ok(()) | Err(HistoryServiceError::NotFound(_)) => {
                    {
                        let mut state = lock(&store.inner.state);
                        state.pending.resolve(ticket);
                        state.cache.remove(id);
                        state.cache.invalidate();
                    }
                    store.inner.hydrator.forget(id);
                    store.inner.signals.bump();
                    info!("delete committed");
                    store.refresh().await;
                    MutationOutcome::Committed { affected: 1 }
                }
                Err(err) => store.roll_back(ticket, action, err),
            }
        })
        .await
    }

    /// Remove every unpinned clip. Returns the deleted count on commit.
    #[tracing::instrument(name = "store.clear_unpinned", skip(self))]
    pub async fn clear_unpinned(&self) -> MutationOutcome {
        let (ticket, visible) = {
            let mut state = lock(&self.inner.state);
            if state.pending.has_clear() {
                return MutationOutcome::NoOp;
            }
            let ticket = state.pending.push(PendingChange::ClearUnpinned);
            (ticket, state.visible())
        };
        let ids: HashSet<ClipId> = visible.iter().map(|clip| clip.id).collect();
        self.inner.hydrator.retain_visible(&ids);
        self.inner.signals.bump();

        let store = self.clone();
        self.reconcile(ticket, MutationAction::ClearUnpinned, async move {
            match store.acknowledge(store.inner.history.clear_unpinned_clips()).await {
                Ok(deleted) => {
                    {
                        let mut state = lock(&store.inner.state);
                        state.pending.resolve(ticket);
                        state.cache.remove_unpinned(deleted);
                        state.cache.invalidate();
                    }
                    store.inner.signals.bump();
                    info!(deleted, "clear committed");
                    store.refresh().await;
                    MutationOutcome::Committed { affected: deleted }
                }
                Err(err) => store.roll_back(ticket, MutationAction::ClearUnpinned, err),
            }
        })
        .await
    }

    /// Forward the keep-window-open preference. Touches no clips.
    #[tracing::instrument(name = "store.set_keep_window_open", skip(self))]
    pub async fn set_keep_window_open(&self, keep: bool) -> MutationOutcome {
        match self.acknowledge(self.inner.history.set_keep_window_open(keep)).await {
            Ok(()) => MutationOutcome::Committed { affected: 0 },
            Err(err) => {
                let error = StoreError::MutationRejected {
                    action: MutationAction::KeepWindowOpen(keep),
                    reason: err.to_string(),
                };
                self.inner.signals.report(error.clone());
                MutationOutcome::RolledBack(error)
            }
        }
    }

    /// Subscribe to push notifications.
    ///
    /// Returns `None` when a subscription is already starting or live, or when
    /// subscribing failed (recorded as [`StoreError::SubscriptionLost`]).
    #[tracing::instrument(name = "store.init_listener", skip(self))]
    pub async fn init_listener(&self) -> Option<ListenerGuard> {
        let store: Weak<StoreInner> = Arc::downgrade(&self.inner);
        let on_change = Arc::new(move || {
            if let Some(inner) = store.upgrade() {
                let store = ClipStore { inner };
                tokio::spawn(async move {
                    store.request_refresh().await;
                });
            }
        });
        self.inner.listener.acquire(on_change).await
    }

    pub fn state(&self) -> StoreSnapshot {
        let state = lock(&self.inner.state);
        let hidden = state.pending.hidden_deletes(state.cache.items());
        StoreSnapshot {
            query: state.query.clone(),
            total_count: state
                .cache
                .total_count_for(&state.query.shape())
                .map(|total| total.saturating_sub(hidden)),
            is_loading: state.in_flight > 0 || state.cache.is_stale(),
            error: self.inner.signals.last_error(),
            listener: self.inner.listener.state(),
            revision: self.inner.signals.revision(),
        }
    }

    pub fn last_error(&self) -> Option<StoreError> {
        self.inner.signals.last_error()
    }

    pub fn clear_error(&self) {
        self.inner.signals.clear_error();
    }

    /// Revision channel; the value changes on every observable change.
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.inner.signals.subscribe()
    }

    /// Wait until no preview hydration is in flight.
    pub async fn hydration_idle(&self) {
        self.inner.hydrator.idle().await;
    }

    fn next_sequence(&self) -> u64 {
        self.inner.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn supersede_pending_refresh(&self) {
        self.inner.coalesce.fetch_add(1, Ordering::SeqCst);
    }

    async fn acknowledge<T, F>(&self, call: F) -> Result<T, HistoryServiceError>
    where
        F: Future<Output = Result<T, HistoryServiceError>>,
    {
        let limit = self.inner.settings.mutation_timeout();
        match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(HistoryServiceError::Timeout(limit.as_millis() as u64)),
        }
    }

    /// Acknowledge and fold a pending change on its own task, so the change is
    /// resolved within the mutation timeout even if the caller stops waiting.
    async fn reconcile<F>(&self, ticket: u64, action: MutationAction, work: F) -> MutationOutcome
    where
        F: Future<Output = MutationOutcome> + Send + 'static,
    {
        let task = tokio::spawn(work.instrument(Span::current()));
        match task.await {
            Ok(outcome) => outcome,
            Err(err) => self.roll_back(ticket, action, HistoryServiceError::Unavailable(err.to_string())),
        }
    }

    fn roll_back(&self, ticket: u64, action: MutationAction, err: HistoryServiceError) -> MutationOutcome {
        warn!(action = %action, error = %err, "rolling back optimistic change");
        let visible = {
            let mut state = lock(&self.inner.state);
            state.pending.resolve(ticket);
            state.visible()
        };
        // Restored images may have had their hydration cancelled.
        self.inner.hydrator.hydrate(&visible);

        let error = StoreError::MutationRejected {
            action,
            reason: err.to_string(),
        };
        self.inner.signals.report(error.clone());
        MutationOutcome::RolledBack(error)
    }
}
