//! # pt-infra
//!
//! Adapters behind the `pt-core` ports: settings loading, the system clock and
//! an in-memory Clipboard History Service used by the probe binary and tests.

pub mod history;
pub mod settings;
pub mod time;

pub use history::{load_seed_file, FaultOp, InMemoryClipHistory, NewClip, ResponseGate, SeedClip};
pub use settings::{default_config_path, load_settings};
pub use time::{FixedClock, SystemClock};
