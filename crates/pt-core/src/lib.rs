//! # pt-core
//!
//! Core domain models and ports for the Pastee clipboard history panel.
//!
//! This crate contains pure data and contracts without any infrastructure dependencies.
//! The clipboard history itself lives in an external service reached through [`ports`].

pub mod clip;
pub mod ports;
pub mod query;
pub mod settings;

// Re-export commonly used types at the crate root
pub use clip::{ClipId, ClipPage, ClipSummary, ContentType, DisplayKind, PreviewPayload};
pub use query::{FilterChip, FilterParseError, FilterType, QueryDescriptor, QueryShape};
pub use settings::{LoggingSettings, Settings, StoreSettings};
