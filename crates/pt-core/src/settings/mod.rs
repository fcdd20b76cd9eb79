//! # Settings DTOs / 设置数据结构
//!
//! Pure data. Loading and layering (file, environment) happen in `pt-infra`.
//! 纯数据；加载与分层由 `pt-infra` 负责。

mod defaults;

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub store: StoreSettings,
    pub logging: LoggingSettings,
}

/// Tuning for the clip store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Items per page when browsing (not searching).
    pub page_size: usize,
    /// Coalescing window for search text and push-triggered refetches.
    pub search_debounce_ms: u64,
    /// Upper bound on waiting for a pin/delete/clear acknowledgment.
    pub mutation_timeout_ms: u64,
    /// Matches requested for a search; search results are not paginated.
    pub search_result_limit: usize,
}

impl StoreSettings {
    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn mutation_timeout(&self) -> Duration {
        Duration::from_millis(self.mutation_timeout_ms)
    }
}

/// Logging output. Empty strings are valid facts meaning "use the build default".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directives; `RUST_LOG` still wins when set.
    pub level: String,
    /// Log file name inside the log directory; empty disables file output.
    pub file_name: String,
}
