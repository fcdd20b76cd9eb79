//! # Settings Loader / 设置加载器
//!
//! Layers, lowest priority first / 按优先级从低到高：
//!
//! 1. Built-in defaults (`Settings::default()`)
//! 2. Optional TOML file
//! 3. `PASTEE__SECTION__KEY` environment variables
//!
//! Pure data loading: values are not validated here.
//! 仅加载数据，不做校验。

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use config::{Config, Environment, File, FileFormat};
use pt_core::Settings;
use tracing::debug;

const ENV_PREFIX: &str = "PASTEE";
const APP_DIR: &str = "pastee";
const CONFIG_FILE: &str = "pastee.toml";

/// `<config dir>/pastee/pastee.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

/// Load settings from defaults, a TOML file and the process environment.
///
/// An explicit `path` must exist; the default location is optional.
///
/// # Errors / 错误
///
/// Returns error if the file cannot be read or parsed, or a value has the
/// wrong type.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    load_layered(path, None)
}

fn load_layered(path: Option<&Path>, env: Option<HashMap<String, String>>) -> anyhow::Result<Settings> {
    let defaults = Config::try_from(&Settings::default()).context("Failed to serialize default settings")?;
    let mut builder = Config::builder().add_source(defaults);

    match path {
        Some(explicit) => {
            debug!(path = %explicit.display(), "loading settings file");
            builder = builder.add_source(File::from(explicit).format(FileFormat::Toml).required(true));
        }
        None => {
            if let Some(fallback) = default_config_path() {
                debug!(path = %fallback.display(), "looking for optional settings file");
                builder = builder.add_source(File::from(fallback).format(FileFormat::Toml).required(false));
            }
        }
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .source(env),
    );

    let source = path.map(|p| p.display().to_string()).unwrap_or_else(|| "defaults".to_string());
    builder
        .build()
        .with_context(|| format!("Failed to load settings from {}", source))?
        .try_deserialize::<Settings>()
        .context("Failed to map settings onto the settings schema")
}
