use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use super::content::NewClip;

/// One fixture entry.
///
/// ```json
/// { "kind": "text", "text": "hello", "ageSecs": 120, "pinned": true, "tags": ["greeting"] }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedClip {
    #[serde(flatten)]
    pub content: SeedContent,
    /// Seconds before "now" the clip was captured.
    #[serde(default)]
    pub age_secs: i64,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SeedContent {
    Text { text: String },
    Html { text: String, html: String },
    Color { value: String },
    /// Bytes as a JSON number array.
    Image {
        #[serde(rename = "mimeType")]
        mime_type: String,
        bytes: Vec<u8>,
    },
    Files { paths: Vec<String> },
}

impl From<SeedContent> for NewClip {
    fn from(content: SeedContent) -> Self {
        match content {
            SeedContent::Text { text } => NewClip::Text(text),
            SeedContent::Html { text, html } => NewClip::Html { text, html },
            SeedContent::Color { value } => NewClip::Color(value),
            SeedContent::Image { mime_type, bytes } => NewClip::Image { mime_type, bytes },
            SeedContent::Files { paths } => NewClip::Files(paths),
        }
    }
}

pub fn load_seed_file(path: &Path) -> anyhow::Result<Vec<SeedClip>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse seed file: {}", path.display()))
}
