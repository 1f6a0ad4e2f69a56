use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use recallguard_platform::{ForwardNode, Segment};

/// Envelope of every OneBot API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    /// `"ok"`, `"async"` or `"failed"`.
    pub status: String,
    /// Zero on success.
    pub retcode: i64,
    /// Call result.
    pub data: Option<T>,
    /// Error message, when the implementation supplies one.
    #[serde(default)]
    pub message: Option<String>,
    /// Human-readable error message (go-cqhttp style).
    #[serde(default)]
    pub wording: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Whether the call succeeded.
    pub fn is_ok(&self) -> bool {
        self.retcode == 0 && (self.status == "ok" || self.status == "async")
    }

    /// Best available error description.
    pub fn error_message(&self) -> &str {
        self.wording
            .as_deref()
            .or(self.message.as_deref())
            .filter(|m| !m.is_empty())
            .unwrap_or("no message")
    }
}

/// Data returned by `get_image` and `get_record`.
#[derive(Debug, Clone, Deserialize)]
pub struct FileData {
    /// Local path of the downloaded file on the OneBot host.
    pub file: String,
}

/// A message segment in OneBot array format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum WireSegment {
    /// Plain text.
    Text {
        /// Text content.
        text: String,
    },
    /// An image by file URI.
    Image {
        /// `file://` URI of the image.
        file: String,
    },
    /// A voice clip by file URI.
    Record {
        /// `file://` URI of the clip.
        file: String,
    },
}

impl From<&Segment> for WireSegment {
    fn from(segment: &Segment) -> Self {
        match segment {
            Segment::Text(text) => Self::Text { text: text.clone() },
            Segment::Image(path) => Self::Image {
                file: file_uri(path),
            },
            Segment::Audio(path) => Self::Record {
                file: file_uri(path),
            },
        }
    }
}

/// Convert segments to their wire form.
pub fn wire_segments(segments: &[Segment]) -> Vec<WireSegment> {
    segments.iter().map(WireSegment::from).collect()
}

/// Data of a `node` entry in `send_group_forward_msg`.
#[derive(Debug, Clone, Serialize)]
pub struct NodeData {
    /// Displayed sender id.
    pub user_id: serde_json::Value,
    /// Displayed sender name.
    pub nickname: String,
    /// Entry content.
    pub content: Vec<WireSegment>,
}

/// A `node` entry of a combined forward.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum WireNode {
    /// A custom node.
    Node(NodeData),
}

impl From<&ForwardNode> for WireNode {
    fn from(node: &ForwardNode) -> Self {
        Self::Node(NodeData {
            user_id: id_value(node.actor_id.as_str()),
            nickname: node.actor_name.clone(),
            content: wire_segments(&node.content),
        })
    }
}

/// Encode an id as a JSON number when it is numeric, else as a string.
///
/// OneBot implementations expect numeric ids, but the core keeps them as
/// opaque strings.
pub fn id_value(id: &str) -> serde_json::Value {
    id.parse::<i64>()
        .map_or_else(|_| serde_json::Value::String(id.to_owned()), Into::into)
}

/// `file://` URI for a local path, made absolute when possible.
pub fn file_uri(path: &Path) -> String {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", absolute.display())
}

/// Deserialize an id that may be a JSON number or string.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i64),
        Str(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Int(n) => n.to_string(),
        RawId::Str(s) => s,
    })
}

/// Deserialize an optional id that may be a JSON number or string.
pub fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deserialize_id")] String);

    Ok(Option::<Wrapper>::deserialize(deserializer)?
        .map(|Wrapper(id)| id)
        .filter(|id| id != "0"))
}
