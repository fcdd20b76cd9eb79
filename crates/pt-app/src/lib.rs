//! Pastee application layer
//!
//! The clip store keeps a paginated, filtered, searchable projection of the
//! external clipboard history consistent with user mutations, push notifications
//! and deferred preview hydration.
//!
//! ```text
//! intent ──▶ ClipStore ──▶ PageCache (sequence gated) ──▶ PreviewHydrator
//!               ▲                                              │
//!               └──── EventListener ◀── history push channel   ▼
//!                                                         display_list()
//! ```

pub mod error;
pub mod hydrator;
pub mod listener;
pub mod projection;
mod signals;
pub mod store;

pub use error::{FetchOutcome, MutationAction, MutationOutcome, OffsetOutcome, RefreshOutcome, StoreError};
pub use hydrator::PreviewHydrator;
pub use listener::{ListenerGuard, ListenerState};
pub use projection::{group_clips, relative_age, ClipGroup, GroupKind, GroupedClip};
pub use store::{ClipStore, StoreSnapshot};
