//! Clip domain models as the history service reports them.
//! 历史服务返回的剪贴条目领域模型。

mod content_type;
mod preview;
mod summary;

pub use content_type::{ContentType, DisplayKind, UnknownContentType};
pub use preview::{PreviewPayload, IMAGE_PLACEHOLDER, PREVIEW_SCHEME};
pub use summary::{ClipId, ClipPage, ClipSummary};
