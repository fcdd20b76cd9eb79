use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ContentType, DisplayKind};

/// Service-assigned clip identifier, unique across the whole history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(i64);

impl ClipId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for ClipId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of the history list.
/// 列表中的一行（轻量级，用于 UI 展示）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipSummary {
    pub id: ClipId,
    pub content_type: ContentType,
    /// Literal text/color content, or an opaque reference for images.
    pub preview: String,
    /// Unix seconds, service-assigned.
    pub created_at: i64,
    pub is_pinned: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Client-only: true while the preview is being hydrated.
    #[serde(skip)]
    pub loading: bool,
}

impl ClipSummary {
    pub fn new(id: ClipId, content_type: ContentType, preview: impl Into<String>, created_at: i64) -> Self {
        Self {
            id,
            content_type,
            preview: preview.into(),
            created_at,
            is_pinned: false,
            tags: Vec::new(),
            loading: false,
        }
    }

    pub fn pinned(mut self, is_pinned: bool) -> Self {
        self.is_pinned = is_pinned;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `self` sorts strictly before `other`: pinned first, then newest first.
    pub fn ranks_before(&self, other: &ClipSummary) -> bool {
        match (self.is_pinned, other.is_pinned) {
            (true, false) => true,
            (false, true) => false,
            _ => self.created_at > other.created_at,
        }
    }

    pub fn display_kind(&self) -> DisplayKind {
        match self.content_type {
            ContentType::Text if is_web_url(&self.preview) => DisplayKind::Link,
            ContentType::Text => DisplayKind::Text,
            ContentType::Html => DisplayKind::Html,
            ContentType::Color => DisplayKind::Color,
            ContentType::Image => DisplayKind::Image,
            ContentType::Files => DisplayKind::File,
        }
    }
}

fn is_web_url(text: &str) -> bool {
    let text = text.trim();
    (text.starts_with("https://") || text.starts_with("http://")) && !text.contains(char::is_whitespace)
}

/// Page of summaries returned by `list_clips`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipPage {
    pub items: Vec<ClipSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(id: i64, created_at: i64) -> ClipSummary {
        ClipSummary::new(ClipId::new(id), ContentType::Text, "x", created_at)
    }

    #[test]
    fn pinned_ranks_before_unpinned_regardless_of_age() {
        let old_pinned = clip(1, 10).pinned(true);
        let new_unpinned = clip(2, 99);
        assert!(old_pinned.ranks_before(&new_unpinned));
        assert!(!new_unpinned.ranks_before(&old_pinned));
    }

    #[test]
    fn same_timestamp_same_pin_state_is_not_strictly_before() {
        let a = clip(1, 50);
        let b = clip(2, 50);
        assert!(!a.ranks_before(&b));
        assert!(!b.ranks_before(&a));
    }

    #[test]
    fn loading_flag_is_never_serialized() {
        let mut summary = ClipSummary::new(ClipId::new(7), ContentType::Image, "pastee://preview/7", 1);
        summary.loading = true;
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("loading").is_none());
        assert_eq!(json["contentType"], "image");
        assert_eq!(json["isPinned"], false);
    }

    #[test]
    fn text_urls_display_as_links() {
        let link = ClipSummary::new(
            ClipId::new(1),
            ContentType::Text,
            "https://tailwindcss.com/docs/grid-template-columns",
            0,
        );
        assert_eq!(link.display_kind(), DisplayKind::Link);

        let sentence = ClipSummary::new(ClipId::new(2), ContentType::Text, "see https://x.io please", 0);
        assert_eq!(sentence.display_kind(), DisplayKind::Text);
    }
}
