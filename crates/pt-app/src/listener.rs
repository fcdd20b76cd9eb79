//! Push channel subscription.
//!
//! ```text
//! Unsubscribed ──▶ Subscribing ──▶ Subscribed ──▶ Unsubscribed   (guard released)
//!                       │               │
//!                       └──▶ Error ◀────┘                        (subscribe failed / channel closed)
//! ```
//!
//! `Error` is a resting state: it is released to `Unsubscribed` by the guard and
//! a new `init_listener` may start from it.

use std::sync::{Arc, Mutex};

use pt_core::ports::{HistoryEvent, HistoryEventsPort, HistorySubscription};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};

use crate::error::StoreError;
use crate::signals::{lock, StoreSignals};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerState {
    Unsubscribed,
    Subscribing,
    Subscribed,
    Error,
}

struct Slot {
    state: ListenerState,
    epoch: u64,
    cancel: Option<CancellationToken>,
}

pub(crate) type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

pub(crate) struct EventListener {
    events: Arc<dyn HistoryEventsPort>,
    signals: Arc<StoreSignals>,
    slot: Mutex<Slot>,
}

impl EventListener {
    pub(crate) fn new(events: Arc<dyn HistoryEventsPort>, signals: Arc<StoreSignals>) -> Self {
        Self {
            events,
            signals,
            slot: Mutex::new(Slot {
                state: ListenerState::Unsubscribed,
                epoch: 0,
                cancel: None,
            }),
        }
    }

    pub(crate) fn state(&self) -> ListenerState {
        lock(&self.slot).state
    }

    /// At most one subscription per listener: returns `None` while one is
    /// starting or live.
    pub(crate) async fn acquire(self: &Arc<Self>, on_change: ChangeCallback) -> Option<ListenerGuard> {
        let (epoch, cancel) = {
            let mut slot = lock(&self.slot);
            if matches!(slot.state, ListenerState::Subscribing | ListenerState::Subscribed) {
                debug!(state = ?slot.state, "listener already active");
                return None;
            }
            slot.epoch += 1;
            let cancel = CancellationToken::new();
            slot.state = ListenerState::Subscribing;
            slot.cancel = Some(cancel.clone());
            (slot.epoch, cancel)
        };
        self.signals.bump();

        let subscription = match self.events.subscribe().await {
            Ok(subscription) => subscription,
            Err(err) => {
                {
                    let mut slot = lock(&self.slot);
                    if slot.epoch == epoch {
                        slot.state = ListenerState::Error;
                        slot.cancel = None;
                    }
                }
                self.signals.report(StoreError::SubscriptionLost(err.to_string()));
                return None;
            }
        };

        {
            let mut slot = lock(&self.slot);
            if slot.epoch == epoch {
                slot.state = ListenerState::Subscribed;
            }
        }
        self.signals.bump();
        info!(epoch, "subscribed to history events");

        let listener = Arc::clone(self);
        tokio::spawn(
            listener
                .clone()
                .pump(subscription, cancel, epoch, on_change)
                .instrument(info_span!("listener.pump", epoch)),
        );

        Some(ListenerGuard {
            listener,
            epoch,
            released: false,
        })
    }

    async fn pump(
        self: Arc<Self>,
        mut subscription: HistorySubscription,
        cancel: CancellationToken,
        epoch: u64,
        on_change: ChangeCallback,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("subscription released");
                    return;
                }
                event = subscription.events.recv() => match event {
                    Some(HistoryEvent::HistoryChanged) => {
                        debug!("history changed, scheduling refresh");
                        on_change();
                    }
                    Some(HistoryEvent::KeepWindowOpenChanged { keep }) => {
                        debug!(keep, "keep-window-open changed, ignored");
                    }
                    None => {
                        self.lost(epoch);
                        return;
                    }
                },
            }
        }
    }

    fn lost(&self, epoch: u64) {
        {
            let mut slot = lock(&self.slot);
            if slot.epoch != epoch || slot.state != ListenerState::Subscribed {
                return;
            }
            slot.state = ListenerState::Error;
            slot.cancel = None;
        }
        self.signals
            .report(StoreError::SubscriptionLost("history event channel closed".to_string()));
    }

    fn release(&self, epoch: u64) {
        {
            let mut slot = lock(&self.slot);
            if slot.epoch != epoch {
                return;
            }
            if let Some(cancel) = slot.cancel.take() {
                cancel.cancel();
            }
            slot.state = ListenerState::Unsubscribed;
        }
        info!(epoch, "history subscription released");
        self.signals.bump();
    }
}

/// Releases the subscription exactly once, on [`ListenerGuard::dispose`] or drop.
pub struct ListenerGuard {
    listener: Arc<EventListener>,
    epoch: u64,
    released: bool,
}

impl ListenerGuard {
    pub fn dispose(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.listener.release(self.epoch);
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ListenerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerGuard")
            .field("epoch", &self.epoch)
            .field("released", &self.released)
            .finish()
    }
}
