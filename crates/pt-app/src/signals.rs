use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use crate::error::StoreError;

/// Shared change revision and error slot for the store and its components.
pub(crate) struct StoreSignals {
    changes: watch::Sender<u64>,
    error: Mutex<Option<StoreError>>,
}

impl StoreSignals {
    pub(crate) fn new() -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            changes,
            error: Mutex::new(None),
        }
    }

    pub(crate) fn revision(&self) -> u64 {
        *self.changes.borrow()
    }

    /// Call after every observable change.
    pub(crate) fn bump(&self) {
        self.changes.send_modify(|rev| *rev += 1);
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    pub(crate) fn report(&self, error: StoreError) {
        tracing::warn!(error = %error, "store error recorded");
        *lock(&self.error) = Some(error);
        self.bump();
    }

    pub(crate) fn last_error(&self) -> Option<StoreError> {
        lock(&self.error).clone()
    }

    pub(crate) fn clear_error(&self) {
        if lock(&self.error).take().is_some() {
            self.bump();
        }
    }
}

/// Lock ignoring poisoning; store state stays usable after a panicked holder.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
