//! Lazy image preview hydration.
//! 图片预览的延迟加载。
//!
//! Hydration state is a side map keyed by clip id, so paging back and forth never
//! loses a resolved preview and never refetches one.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use pt_core::clip::IMAGE_PLACEHOLDER;
use pt_core::ports::{ClipHistoryPort, HistoryServiceError};
use pt_core::{ClipId, ClipSummary, PreviewPayload};
use tokio_util::sync::CancellationToken;
use tracing::{debug, Instrument};

use crate::error::StoreError;
use crate::signals::{lock, StoreSignals};

struct InFlight {
    ticket: u64,
    cancel: CancellationToken,
}

#[derive(Default)]
struct HydrationState {
    resolved: HashMap<ClipId, String>,
    failed: HashSet<ClipId>,
    in_flight: HashMap<ClipId, InFlight>,
    next_ticket: u64,
}

pub struct PreviewHydrator {
    history: Arc<dyn ClipHistoryPort>,
    signals: Arc<StoreSignals>,
    state: Mutex<HydrationState>,
}

impl PreviewHydrator {
    pub(crate) fn new(history: Arc<dyn ClipHistoryPort>, signals: Arc<StoreSignals>) -> Self {
        Self {
            history,
            signals,
            state: Mutex::new(HydrationState::default()),
        }
    }

    /// Start hydration for every deferred preview not yet resolved or in flight.
    ///
    /// Previously failed items are retried. Returns how many fetches started.
    pub fn hydrate(self: &Arc<Self>, items: &[ClipSummary]) -> usize {
        let mut started = Vec::new();
        {
            let mut state = lock(&self.state);
            for clip in items.iter().filter(|c| c.content_type.has_deferred_preview()) {
                if state.resolved.contains_key(&clip.id) || state.in_flight.contains_key(&clip.id) {
                    continue;
                }
                state.failed.remove(&clip.id);
                state.next_ticket += 1;
                let ticket = state.next_ticket;
                let cancel = CancellationToken::new();
                state.in_flight.insert(
                    clip.id,
                    InFlight {
                        ticket,
                        cancel: cancel.clone(),
                    },
                );
                started.push((clip.id, ticket, cancel));
            }
        }

        let count = started.len();
        for (id, ticket, cancel) in started {
            let hydrator = Arc::clone(self);
            tokio::spawn(
                async move {
                    let result = tokio::select! {
                        _ = cancel.cancelled() => {
                            debug!("preview hydration cancelled");
                            return;
                        }
                        result = hydrator.history.fetch_preview(id) => result,
                    };
                    hydrator.complete(id, ticket, result);
                }
                .instrument(tracing::debug_span!("hydrator.fetch_preview", clip_id = %id)),
            );
        }
        if count > 0 {
            self.signals.bump();
        }
        count
    }

    /// Cancel in-flight hydrations for items that left the current page.
    pub fn retain_visible(&self, visible: &HashSet<ClipId>) {
        let cancelled = {
            let mut state = lock(&self.state);
            let gone: Vec<ClipId> = state
                .in_flight
                .keys()
                .filter(|id| !visible.contains(id))
                .copied()
                .collect();
            for id in &gone {
                if let Some(flight) = state.in_flight.remove(id) {
                    flight.cancel.cancel();
                }
            }
            !gone.is_empty()
        };
        if cancelled {
            self.signals.bump();
        }
    }

    /// Cancel an in-flight hydration; its result is ignored if it still arrives.
    pub fn cancel(&self, id: ClipId) {
        let removed = lock(&self.state).in_flight.remove(&id);
        if let Some(flight) = removed {
            flight.cancel.cancel();
            self.signals.bump();
        }
    }

    /// Drop everything known about a deleted clip.
    pub fn forget(&self, id: ClipId) {
        self.cancel(id);
        let mut state = lock(&self.state);
        state.resolved.remove(&id);
        state.failed.remove(&id);
    }

    pub fn is_resolved(&self, id: ClipId) -> bool {
        lock(&self.state).resolved.contains_key(&id)
    }

    pub fn in_flight_count(&self) -> usize {
        lock(&self.state).in_flight.len()
    }

    /// Merge loading flags and resolved previews into a list of summaries.
    pub fn merge(&self, items: Vec<ClipSummary>) -> Vec<ClipSummary> {
        let state = lock(&self.state);
        items
            .into_iter()
            .map(|mut clip| {
                if !clip.content_type.has_deferred_preview() {
                    return clip;
                }
                if let Some(rendered) = state.resolved.get(&clip.id) {
                    clip.preview = rendered.clone();
                    clip.loading = false;
                } else if state.in_flight.contains_key(&clip.id) {
                    clip.loading = true;
                } else if state.failed.contains(&clip.id) {
                    clip.preview = IMAGE_PLACEHOLDER.to_string();
                    clip.loading = false;
                }
                clip
            })
            .collect()
    }

    /// Resolves once no hydration is in flight.
    pub async fn idle(&self) {
        let mut changes = self.signals.subscribe();
        loop {
            if lock(&self.state).in_flight.is_empty() {
                return;
            }
            if changes.changed().await.is_err() {
                return;
            }
        }
    }

    fn complete(&self, id: ClipId, ticket: u64, result: Result<PreviewPayload, HistoryServiceError>) {
        let failure = {
            let mut state = lock(&self.state);
            match state.in_flight.get(&id) {
                Some(flight) if flight.ticket == ticket => {}
                _ => {
                    debug!(clip_id = %id, "ignoring preview for a clip no longer hydrating");
                    return;
                }
            }
            state.in_flight.remove(&id);
            match result {
                Ok(payload) => {
                    state.resolved.insert(id, render(payload));
                    None
                }
                Err(err) => {
                    state.failed.insert(id);
                    Some(err)
                }
            }
        };

        match failure {
            None => {
                debug!(clip_id = %id, "preview hydrated");
                self.signals.bump();
            }
            Some(err) => self.signals.report(StoreError::HydrationFailed {
                id,
                reason: err.to_string(),
            }),
        }
    }
}

/// Renderable representation of a preview payload.
pub fn render(payload: PreviewPayload) -> String {
    match payload {
        PreviewPayload::Bytes { mime_type, bytes } => {
            format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
        }
        PreviewPayload::Reference { url } => url,
    }
}
