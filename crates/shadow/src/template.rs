//! Prompt rendering for forwarded recalls.
//!
//! Prompts are rendered with `MiniJinja` against a flat context of named
//! fields: `sender_name`, `sender_id`, `origin_name`, `origin_id` and `kind`.
//! Fields that are absent for a record (a private chat has no origin)
//! substitute a fallback label, so a template never fails on a missing value.

use serde::Serialize;

use recallguard_core::ShadowRecord;

use crate::error::ShadowError;

/// Template used when none is configured.
pub const DEFAULT_TEMPLATE: &str = "{{ sender_name }} ({{ sender_id }}) recalled a message in {{ origin_name }} ({{ origin_id }}) [{{ kind }}]:";

/// Label substituted for the origin name of a private chat.
pub const PRIVATE_ORIGIN_LABEL: &str = "private chat";

/// Label substituted for a group that has no known display name.
pub const UNNAMED_ORIGIN_LABEL: &str = "unknown group";

/// Label substituted for any missing identifier.
pub const MISSING_ID_LABEL: &str = "-";

/// Maximum rendered prompt size (64 KB).
const MAX_RENDERED_BYTES: usize = 64 * 1_024;

/// Fuel limit for `MiniJinja` evaluation.
const FUEL_LIMIT: u64 = 50_000;

/// The values a prompt template can reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptFields {
    pub sender_name: String,
    pub sender_id: String,
    pub origin_name: String,
    pub origin_id: String,
    pub kind: String,
}

impl PromptFields {
    /// Extract prompt fields from a record, applying fallback labels.
    pub fn from_record(record: &ShadowRecord) -> Self {
        let (origin_name, origin_id) = match &record.origin {
            Some(origin) => (
                origin
                    .name
                    .clone()
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| UNNAMED_ORIGIN_LABEL.to_owned()),
                origin.id.to_string(),
            ),
            None => (
                PRIVATE_ORIGIN_LABEL.to_owned(),
                MISSING_ID_LABEL.to_owned(),
            ),
        };
        let sender_name = if record.sender_name.trim().is_empty() {
            record.sender_id.to_string()
        } else {
            record.sender_name.clone()
        };

        Self {
            sender_name,
            sender_id: record.sender_id.to_string(),
            origin_name,
            origin_id,
            kind: record.kind.to_string(),
        }
    }
}

/// A compiled-on-demand prompt template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
}

impl PromptTemplate {
    /// Create a template, rejecting sources that do not parse.
    pub fn new(source: impl Into<String>) -> Result<Self, ShadowError> {
        let source = source.into();
        {
            let mut env = minijinja::Environment::new();
            env.add_template("prompt", &source)?;
        }
        Ok(Self { source })
    }

    /// The template source.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render the template against `fields`.
    pub fn render(&self, fields: &PromptFields) -> Result<String, ShadowError> {
        let mut env = minijinja::Environment::new();
        env.set_fuel(Some(FUEL_LIMIT));
        let rendered = env.render_str(&self.source, minijinja::Value::from_serialize(fields))?;
        if rendered.len() > MAX_RENDERED_BYTES {
            return Err(ShadowError::Template(format!(
                "rendered prompt exceeds maximum size of {MAX_RENDERED_BYTES} bytes"
            )));
        }
        Ok(rendered)
    }

    /// Render the prompt for `record`.
    ///
    /// A configured template that fails to render falls back to
    /// [`DEFAULT_TEMPLATE`] so a bad template never suppresses a forward.
    pub fn render_record(&self, record: &ShadowRecord) -> String {
        let fields = PromptFields::from_record(record);
        match self.render(&fields) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "prompt template failed, using default");
                Self::default().render(&fields).unwrap_or_else(|_| {
                    format!(
                        "{} ({}) recalled a message:",
                        fields.sender_name, fields.sender_id
                    )
                })
            }
        }
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            source: DEFAULT_TEMPLATE.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use recallguard_core::{ContentKind, MessageId, Origin, OriginId, UserId};

    use super::*;

    fn group_record(name: Option<&str>) -> ShadowRecord {
        let mut origin = Origin::new(OriginId::new("g1"));
        if let Some(name) = name {
            origin = origin.with_name(name);
        }
        ShadowRecord::file(
            MessageId::new("1"),
            ContentKind::Image,
            UserId::new("42"),
            "alice",
            Some(origin),
            "/c/1.png",
        )
    }

    #[test]
    fn default_template_group() {
        let text = PromptTemplate::default().render_record(&group_record(Some("Friends")));
        assert_eq!(text, "alice (42) recalled a message in Friends (g1) [image]:");
    }

    #[test]
    fn private_chat_uses_fallback_labels() {
        let record = ShadowRecord::text(MessageId::new("1"), UserId::new("42"), "alice", None, "x");
        let text = PromptTemplate::default().render_record(&record);
        assert_eq!(text, "alice (42) recalled a message in private chat (-) [text]:");
    }

    #[test]
    fn unnamed_group_uses_fallback_label() {
        let fields = PromptFields::from_record(&group_record(None));
        assert_eq!(fields.origin_name, UNNAMED_ORIGIN_LABEL);
        assert_eq!(fields.origin_id, "g1");
    }

    #[test]
    fn blank_sender_name_falls_back_to_id() {
        let record = ShadowRecord::text(MessageId::new("1"), UserId::new("42"), " ", None, "x");
        assert_eq!(PromptFields::from_record(&record).sender_name, "42");
    }

    #[test]
    fn custom_template() {
        let template = PromptTemplate::new("[{{ origin_name }}] {{ sender_name }}").unwrap();
        assert_eq!(
            template.render_record(&group_record(Some("Friends"))),
            "[Friends] alice"
        );
    }

    #[test]
    fn invalid_template_is_rejected() {
        assert!(matches!(
            PromptTemplate::new("{{ unclosed"),
            Err(ShadowError::Template(_))
        ));
    }

    #[test]
    fn runaway_template_falls_back_to_default() {
        let template =
            PromptTemplate::new("{% for i in range(100000) %}{{ i }}{% endfor %}").unwrap();
        let text = template.render_record(&group_record(Some("Friends")));
        assert!(text.starts_with("alice (42) recalled"));
    }
}
