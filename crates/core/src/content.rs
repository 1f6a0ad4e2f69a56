use std::fmt;

use serde::{Deserialize, Serialize};

/// The kind of content a shadow record protects.
///
/// Each kind owns one partition of the shadow store and has its own
/// monitoring switch. Adding a kind here forces every `match` over it
/// (ingestion, rendering, default extensions) to be revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Inline text, stored without touching the filesystem.
    Text,
    /// An image materialized into the cache directory.
    Image,
    /// A voice clip materialized into the cache directory.
    Audio,
}

impl ContentKind {
    /// All kinds, in partition scan order.
    pub const ALL: [Self; 3] = [Self::Text, Self::Image, Self::Audio];

    /// Extension (with leading dot) used when the fetched file has none.
    pub fn default_extension(self) -> Option<&'static str> {
        match self {
            Self::Text => None,
            Self::Image => Some(".png"),
            Self::Audio => Some(".mp3"),
        }
    }

    /// Stable lower-case label, used in logs and prompt templates.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ordered component of an inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Component {
    /// A run of plain text.
    Text {
        /// The text content.
        text: String,
    },
    /// An image, addressed by an opaque platform file reference.
    Image {
        /// Platform file reference, resolved through the platform API.
        file: String,
    },
    /// A voice clip, addressed by an opaque platform file reference.
    Audio {
        /// Platform file reference, resolved through the platform API.
        file: String,
    },
}

impl Component {
    /// The content kind this component belongs to.
    pub fn kind(&self) -> ContentKind {
        match self {
            Self::Text { .. } => ContentKind::Text,
            Self::Image { .. } => ContentKind::Image,
            Self::Audio { .. } => ContentKind::Audio,
        }
    }

    /// Build a text component.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Build an image component.
    pub fn image(file: impl Into<String>) -> Self {
        Self::Image { file: file.into() }
    }

    /// Build an audio component.
    pub fn audio(file: impl Into<String>) -> Self {
        Self::Audio { file: file.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_kinds_have_default_extensions() {
        assert_eq!(ContentKind::Text.default_extension(), None);
        assert_eq!(ContentKind::Image.default_extension(), Some(".png"));
        assert_eq!(ContentKind::Audio.default_extension(), Some(".mp3"));
    }

    #[test]
    fn component_kind_matches_variant() {
        assert_eq!(Component::text("hi").kind(), ContentKind::Text);
        assert_eq!(Component::image("abc.image").kind(), ContentKind::Image);
        assert_eq!(Component::audio("abc.amr").kind(), ContentKind::Audio);
    }

    #[test]
    fn component_serde_is_tagged() {
        let json = serde_json::to_value(Component::image("f.jpg")).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["file"], "f.jpg");
    }

    #[test]
    fn kind_display_is_lowercase() {
        assert_eq!(ContentKind::Audio.to_string(), "audio");
    }
}
