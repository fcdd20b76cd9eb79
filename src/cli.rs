//! Command line probe: drives one store session against the in-memory history
//! and prints what a panel would render.
//! 命令行探针：运行一次会话并输出 JSON。

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use pt_app::{ClipGroup, ClipStore, MutationOutcome, StoreSnapshot};
use pt_core::{ClipId, FilterChip, FilterType};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "pastee", about = "Clipboard history sync probe")]
pub struct Cli {
    /// Settings file (TOML). Defaults to the user config directory.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// JSON fixture used to seed the history. Defaults to the bundled sample.
    #[arg(long)]
    pub seed: Option<PathBuf>,

    /// Content filter: text, html, color, image, files. Empty means all.
    #[arg(long)]
    pub filter: Option<String>,

    #[arg(long)]
    pub search: Option<String>,

    /// Requested page offset, clamped to the available range.
    #[arg(long, allow_hyphen_values = true)]
    pub offset: Option<i64>,

    /// Toggle the pin of a clip before rendering. Repeatable.
    #[arg(long = "pin")]
    pub pin: Vec<i64>,

    /// Delete a clip before rendering. Repeatable.
    #[arg(long = "delete")]
    pub delete: Vec<i64>,

    #[arg(long)]
    pub clear_unpinned: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeReport {
    pub state: StoreSnapshot,
    pub groups: Vec<ClipGroup>,
    pub filters: Vec<FilterChip>,
    pub mutations: Vec<MutationOutcome>,
}

pub async fn run(cli: &Cli, store: &ClipStore) -> anyhow::Result<ProbeReport> {
    store.refresh().await;

    if let Some(raw) = &cli.filter {
        let filter: FilterType = raw.parse().with_context(|| format!("Invalid --filter value: {}", raw))?;
        store.set_filter_type(filter).await;
    }
    if let Some(text) = &cli.search {
        store.set_search_query(text).await;
    }
    if let Some(offset) = cli.offset {
        store.set_offset(offset).await;
    }

    let mut mutations = Vec::new();
    for id in &cli.pin {
        mutations.push(store.handle_pin(ClipId::new(*id)).await);
    }
    for id in &cli.delete {
        mutations.push(store.handle_delete(ClipId::new(*id)).await);
    }
    if cli.clear_unpinned {
        mutations.push(store.clear_unpinned().await);
    }
    for outcome in &mutations {
        if let MutationOutcome::RolledBack(err) = outcome {
            warn!(error = %err, "mutation rolled back");
        }
    }

    store.hydration_idle().await;

    let state = store.state();
    info!(total = ?state.total_count, revision = state.revision, "probe finished");
    Ok(ProbeReport {
        state,
        groups: store.grouped_display(),
        filters: FilterChip::ALL.to_vec(),
        mutations,
    })
}
