use pt_core::clip::PREVIEW_SCHEME;
use pt_core::{ClipId, ClipSummary, ContentType, PreviewPayload};

/// Preview text is cut to this many characters.
const PREVIEW_CHARS: usize = 100;

/// Clipboard content handed to [`super::InMemoryClipHistory::capture`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewClip {
    Text(String),
    /// Rich text; `text` is the plain-text rendition used for previews and search.
    Html { text: String, html: String },
    Color(String),
    Image { mime_type: String, bytes: Vec<u8> },
    Files(Vec<String>),
}

impl NewClip {
    pub fn content_type(&self) -> ContentType {
        match self {
            NewClip::Text(_) => ContentType::Text,
            NewClip::Html { .. } => ContentType::Html,
            NewClip::Color(_) => ContentType::Color,
            NewClip::Image { .. } => ContentType::Image,
            NewClip::Files(_) => ContentType::Files,
        }
    }

    /// Trim and reject empty content, as the capture side does.
    pub(crate) fn normalized(self) -> Option<Self> {
        match self {
            NewClip::Text(text) => {
                let text = text.trim().to_string();
                (!text.is_empty()).then_some(NewClip::Text(text))
            }
            NewClip::Color(value) => {
                let value = value.trim().to_string();
                (!value.is_empty()).then_some(NewClip::Color(value))
            }
            NewClip::Files(paths) if paths.is_empty() => None,
            NewClip::Image { bytes, .. } if bytes.is_empty() => None,
            other => Some(other),
        }
    }

    /// Text matched by search.
    fn searchable(&self) -> String {
        match self {
            NewClip::Text(text) | NewClip::Color(text) => text.clone(),
            NewClip::Html { text, .. } => text.clone(),
            NewClip::Image { .. } => String::new(),
            NewClip::Files(paths) => paths.join("\n"),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct StoredClip {
    pub(crate) id: ClipId,
    pub(crate) content: NewClip,
    pub(crate) created_at: i64,
    pub(crate) is_pinned: bool,
    pub(crate) tags: Vec<String>,
}

impl StoredClip {
    pub(crate) fn summary(&self) -> ClipSummary {
        ClipSummary::new(self.id, self.content.content_type(), self.preview(), self.created_at)
            .pinned(self.is_pinned)
            .with_tags(self.tags.iter().cloned())
    }

    fn preview(&self) -> String {
        match &self.content {
            NewClip::Text(text) | NewClip::Html { text, .. } => {
                text.chars().take(PREVIEW_CHARS).collect::<String>().replace('\n', " ")
            }
            NewClip::Color(value) => value.clone(),
            NewClip::Image { .. } => format!("{}{}", PREVIEW_SCHEME, self.id),
            NewClip::Files(paths) => {
                let first = paths.first().map(String::as_str).unwrap_or("");
                format!("[Files] {} items: {}", paths.len(), first)
            }
        }
    }

    /// Case-insensitive substring match over content text and tags.
    pub(crate) fn matches(&self, needle_lower: &str) -> bool {
        if needle_lower.is_empty() {
            return true;
        }
        self.content.searchable().to_lowercase().contains(needle_lower)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(needle_lower))
    }

    pub(crate) fn preview_payload(&self) -> Option<PreviewPayload> {
        match &self.content {
            NewClip::Image { mime_type, bytes } => Some(PreviewPayload::Bytes {
                mime_type: mime_type.clone(),
                bytes: bytes.clone(),
            }),
            _ => None,
        }
    }

    /// Service ordering: pinned first, newest first, higher id on ties.
    pub(crate) fn service_order(a: &StoredClip, b: &StoredClip) -> std::cmp::Ordering {
        b.is_pinned
            .cmp(&a.is_pinned)
            .then(b.created_at.cmp(&a.created_at))
            .then(b.id.cmp(&a.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(id: i64, content: NewClip) -> StoredClip {
        StoredClip {
            id: ClipId::new(id),
            content,
            created_at: 0,
            is_pinned: false,
            tags: vec!["Work".to_string()],
        }
    }

    #[test]
    fn text_preview_is_single_line_and_truncated() {
        let long = format!("line one\nline two {}", "x".repeat(200));
        let preview = stored(1, NewClip::Text(long)).summary().preview;
        assert_eq!(preview.chars().count(), PREVIEW_CHARS);
        assert!(preview.starts_with("line one line two"));
    }

    #[test]
    fn files_and_images_get_summaries() {
        let files = stored(2, NewClip::Files(vec!["/tmp/a.png".into(), "/tmp/b.png".into()]));
        assert_eq!(files.summary().preview, "[Files] 2 items: /tmp/a.png");

        let image = stored(3, NewClip::Image { mime_type: "image/png".into(), bytes: vec![1] });
        assert_eq!(image.summary().preview, "pastee://preview/3");
    }

    #[test]
    fn search_covers_text_and_tags() {
        let clip = stored(4, NewClip::Html { text: "Quarterly Roadmap".into(), html: "<b>Q</b>".into() });
        assert!(clip.matches("roadmap"));
        assert!(clip.matches("work"));
        assert!(!clip.matches("<b>"));
    }

    #[test]
    fn blank_content_is_rejected() {
        assert_eq!(NewClip::Text("   ".into()).normalized(), None);
        assert_eq!(NewClip::Files(vec![]).normalized(), None);
        assert_eq!(NewClip::Text(" hi ".into()).normalized(), Some(NewClip::Text("hi".into())));
    }
}
