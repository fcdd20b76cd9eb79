//! # Dependency Injection / 依赖注入模块
//!
//! The only place that knows both `pt-infra` and `pt-app`. Assembly only:
//! the store receives its collaborators through port traits.
//! 仅用于装配，不做决策。

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use pt_app::ClipStore;
use pt_core::ports::ClockPort;
use pt_core::Settings;
use pt_infra::{load_seed_file, InMemoryClipHistory, SeedClip, SystemClock};
use tracing::info;

/// Fixture used when no `--seed` file is given.
const SAMPLE_HISTORY: &str = include_str!("../../fixtures/sample_history.json");

pub struct PasteeDeps {
    pub history: Arc<InMemoryClipHistory>,
    pub store: ClipStore,
}

pub fn wire_dependencies(settings: &Settings, seed: Option<&Path>) -> anyhow::Result<PasteeDeps> {
    let clock: Arc<dyn ClockPort> = Arc::new(SystemClock);
    wire_with_clock(settings, seed, clock)
}

pub fn wire_with_clock(settings: &Settings, seed: Option<&Path>, clock: Arc<dyn ClockPort>) -> anyhow::Result<PasteeDeps> {
    let seeds = match seed {
        Some(path) => load_seed_file(path)?,
        None => serde_json::from_str::<Vec<SeedClip>>(SAMPLE_HISTORY).context("Failed to parse bundled sample history")?,
    };
    info!(seeds = seeds.len(), "wiring in-memory history");

    let history = Arc::new(InMemoryClipHistory::with_seed(clock.clone(), seeds));
    let store = ClipStore::new(history.clone(), history.clone(), clock, settings.store.clone());
    Ok(PasteeDeps { history, store })
}
