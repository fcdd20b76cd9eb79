use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Content type vocabulary of the history service.
///
/// The set is closed on the client; new kinds arrive through the service vocabulary.
/// 客户端不自行扩展类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Html,
    Color,
    Image,
    Files,
}

impl ContentType {
    pub const ALL: [ContentType; 5] = [
        ContentType::Text,
        ContentType::Html,
        ContentType::Color,
        ContentType::Image,
        ContentType::Files,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Html => "html",
            ContentType::Color => "color",
            ContentType::Image => "image",
            ContentType::Files => "files",
        }
    }

    /// Whether the summary preview is an opaque reference that needs hydration.
    pub fn has_deferred_preview(&self) -> bool {
        matches!(self, ContentType::Image)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown content type: {0}")]
pub struct UnknownContentType(pub String);

impl FromStr for ContentType {
    type Err = UnknownContentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentType::ALL
            .into_iter()
            .find(|ct| ct.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownContentType(s.to_string()))
    }
}

/// How an item card renders, derived from the content type and preview.
///
/// `Link` is a text clip whose preview is a web URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayKind {
    Text,
    Link,
    Html,
    Color,
    Image,
    File,
}
