//! # Configuration Loader / 配置加载器
//!
//! Thin wrapper over `pt_infra::load_settings` so the binary reports which
//! file it tried. Values are accepted as-is; the store clamps what it must.

use std::path::Path;

use anyhow::Context;
use pt_core::Settings;

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Settings> {
    let described = match path {
        Some(path) => path.display().to_string(),
        None => pt_infra::default_config_path()
            .map(|p| format!("{} (optional)", p.display()))
            .unwrap_or_else(|| "built-in defaults".to_string()),
    };
    pt_infra::load_settings(path).with_context(|| format!("Failed to load configuration: {}", described))
}
