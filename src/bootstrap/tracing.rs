//! Tracing configuration for Pastee
//!
//! ## Behavior / 行为
//!
//! - **Development**: debug level for workspace crates
//! - **Production**: info level
//! - **Environment filter**: `RUST_LOG` wins, then `logging.level`, then the build default
//! - **File output**: only when `logging.file_name` is set, written non-blocking
//!
//! Log lines go to stderr; stdout carries the probe's JSON report.

use std::{fs, io, path::PathBuf, sync::OnceLock};

use pt_core::LoggingSettings;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, fmt::writer::BoxMakeWriter, prelude::*, registry, EnvFilter};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

fn is_development() -> bool {
    cfg!(debug_assertions)
}

fn build_filter_directives(is_dev: bool) -> Vec<String> {
    let level = if is_dev { "debug" } else { "info" };
    vec![
        "warn".to_string(),
        format!("pastee={}", level),
        format!("pastee_lib={}", level),
        format!("pt_core={}", level),
        format!("pt_app={}", level),
        format!("pt_infra={}", level),
    ]
}

fn build_env_filter(logging: &LoggingSettings) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if logging.level.trim().is_empty() {
            EnvFilter::new(build_filter_directives(is_development()).join(","))
        } else {
            EnvFilter::new(logging.level.trim())
        }
    })
}

/// Initialize the global tracing subscriber.
///
/// ## Errors / 错误
///
/// Returns `Err` if a subscriber is already registered.
pub fn init_tracing_subscriber(logging: &LoggingSettings) -> anyhow::Result<()> {
    let env_filter = build_env_filter(logging);

    let stderr_writer: BoxMakeWriter = BoxMakeWriter::new(io::stderr);
    let file_writer = if logging.file_name.trim().is_empty() {
        None
    } else {
        match build_file_writer(logging.file_name.trim()) {
            Ok(writer) => Some(writer),
            Err(err) => {
                eprintln!("Failed to initialize file logging, falling back to stderr: {err}");
                None
            }
        }
    };

    // "2025-01-15 10:30:45.123 INFO [file.rs:42] [target] message"
    let stderr_layer = fmt::layer()
        .with_timer(fmt::time::ChronoUtc::new(TIME_FORMAT.to_string()))
        .with_level(true)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_ansi(cfg!(not(test)))
        .with_writer(stderr_writer);

    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_timer(fmt::time::ChronoUtc::new(TIME_FORMAT.to_string()))
            .with_level(true)
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_ansi(false)
            .with_writer(writer)
    });

    registry().with(env_filter).with(stderr_layer).with(file_layer).try_init()?;
    Ok(())
}

/// `<local data dir>/pastee/logs`, falling back to the working directory.
pub fn logs_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("pastee").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

fn build_file_writer(file_name: &str) -> anyhow::Result<NonBlocking> {
    let dir = logs_dir();
    fs::create_dir_all(&dir)?;

    let file_appender = tracing_appender::rolling::never(&dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    LOG_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("Tracing log guard already initialized"))?;

    Ok(non_blocking)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_filter_directives() {
        let dev = build_filter_directives(true);
        assert!(dev.contains(&"pt_app=debug".to_string()));
        assert!(dev.contains(&"pt_core=debug".to_string()));
        assert!(dev.contains(&"warn".to_string()));

        let prod = build_filter_directives(false);
        assert!(prod.contains(&"pt_app=info".to_string()));
        assert!(prod.contains(&"pt_infra=info".to_string()));
    }

    #[test]
    fn test_logs_dir_ends_with_app_folder() {
        assert!(logs_dir().ends_with("logs"));
    }
}
