use serde::{Deserialize, Serialize};

/// Scheme used by the history service for deferred preview references.
pub const PREVIEW_SCHEME: &str = "pastee://preview/";

/// Rendered in place of an image whose preview could not be resolved.
pub const IMAGE_PLACEHOLDER: &str = "[image]";

/// Heavy preview payload returned by `fetch_preview`.
/// `fetch_preview` 返回的预览负载。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PreviewPayload {
    /// Raw thumbnail bytes with their MIME type.
    Bytes { mime_type: String, bytes: Vec<u8> },
    /// A URL the view can render directly.
    Reference { url: String },
}
