use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnippetId(String);

impl SnippetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Millisecond timestamp id, bumped until `is_taken` rejects it.
    pub fn generate(now: DateTime<Utc>, is_taken: impl Fn(&str) -> bool) -> Self {
        let mut millis = now.timestamp_millis();
        loop {
            let candidate = millis.to_string();
            if !is_taken(&candidate) {
                return Self(candidate);
            }
            millis += 1;
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnippetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SnippetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageKind {
    #[serde(rename = "dataUrl")]
    DataUrl,
    #[serde(rename = "url")]
    Url,
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageKind::DataUrl => write!(f, "embedded"),
            ImageKind::Url => write!(f, "url"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SnippetBody {
    Text {
        #[serde(default)]
        content: String,
    },
    Image {
        #[serde(rename = "imageSrc")]
        image_src: String,
        #[serde(rename = "imageKind")]
        image_kind: ImageKind,
    },
}

impl SnippetBody {
    pub fn kind(&self) -> SnippetKind {
        match self {
            SnippetBody::Text { .. } => SnippetKind::Text,
            SnippetBody::Image { .. } => SnippetKind::Image,
        }
    }

    /// The string search matches against besides the title.
    pub fn searchable_text(&self) -> &str {
        match self {
            SnippetBody::Text { content } => content,
            SnippetBody::Image { image_src, .. } => image_src,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnippetKind {
    #[default]
    Text,
    Image,
}

impl SnippetKind {
    pub fn toggle(&self) -> Self {
        match self {
            SnippetKind::Text => SnippetKind::Image,
            SnippetKind::Image => SnippetKind::Text,
        }
    }
}

impl fmt::Display for SnippetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnippetKind::Text => write!(f, "text"),
            SnippetKind::Image => write!(f, "image"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub id: SnippetId,
    pub title: String,
    #[serde(flatten)]
    pub body: SnippetBody,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Snippet {
    pub fn new(id: SnippetId, title: String, body: SnippetBody, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title,
            body,
            created_at: Some(created_at),
        }
    }

    pub fn kind(&self) -> SnippetKind {
        self.body.kind()
    }

    pub fn is_image(&self) -> bool {
        matches!(self.body, SnippetBody::Image { .. })
    }
}
