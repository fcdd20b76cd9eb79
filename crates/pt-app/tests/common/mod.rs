//! Shared fixtures for the store integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use pt_app::ClipStore;
use pt_core::{ClipId, ClipSummary, StoreSettings};
use pt_infra::{FixedClock, InMemoryClipHistory, NewClip};

/// 2025-10-14 12:00:00 UTC
pub const NOW: i64 = 1_760_443_200;

pub struct Harness {
    pub history: Arc<InMemoryClipHistory>,
    pub clock: Arc<FixedClock>,
    pub store: ClipStore,
}

pub fn settings() -> StoreSettings {
    StoreSettings {
        page_size: 20,
        search_debounce_ms: 150,
        mutation_timeout_ms: 5000,
        search_result_limit: 500,
    }
}

pub fn harness() -> Harness {
    let clock = Arc::new(FixedClock::new(NOW));
    let history = Arc::new(InMemoryClipHistory::new(clock.clone()));
    let store = ClipStore::new(history.clone(), history.clone(), clock.clone(), settings());
    Harness { history, clock, store }
}

/// Capture `count` text clips, oldest first, one second apart. Returns ids oldest first.
pub fn seed_texts(history: &InMemoryClipHistory, count: usize) -> Vec<ClipId> {
    (0..count)
        .map(|i| {
            history
                .capture_at(NewClip::Text(format!("clip {}", i)), NOW - (count - i) as i64)
                .expect("non-empty text is captured")
        })
        .collect()
}

pub fn ids(list: &[ClipSummary]) -> Vec<i64> {
    list.iter().map(|clip| clip.id.get()).collect()
}

/// Let spawned tasks run until they park.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

/// Opt-in log output: `RUST_LOG=pt_app=debug cargo test`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
