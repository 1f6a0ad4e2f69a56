//! Parsing of OneBot v11 event reports into core events.
//!
//! Only `message` events and the `group_recall` / `friend_recall` notices are
//! of interest; every other report parses to `None`.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

use recallguard_core::{
    Component, InboundMessage, Origin, OriginId, PlatformEvent, RecallNotice, RecallScope, UserId,
};

use crate::error::OneBotError;
use crate::types::{deserialize_id, deserialize_opt_id};

#[derive(Debug, Deserialize)]
struct Envelope {
    post_type: String,
}

#[derive(Debug, Default, Deserialize)]
struct Sender {
    #[serde(default)]
    nickname: Option<String>,
    #[serde(default)]
    card: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSegment {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageBody {
    Segments(Vec<RawSegment>),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct MessageEvent {
    #[serde(deserialize_with = "deserialize_id")]
    message_id: String,
    #[serde(deserialize_with = "deserialize_id")]
    user_id: String,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    group_id: Option<String>,
    #[serde(default)]
    group_name: Option<String>,
    #[serde(default)]
    sender: Sender,
    message: MessageBody,
    #[serde(default)]
    time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RecallEvent {
    notice_type: String,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    message_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    user_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    operator_id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_id")]
    group_id: Option<String>,
}

/// Parse a raw OneBot event report.
///
/// Returns `Ok(None)` for reports that carry nothing of interest (meta
/// events, requests, unrelated notices, the bot's own sent messages).
pub fn parse_event(report: &serde_json::Value) -> Result<Option<PlatformEvent>, OneBotError> {
    let envelope = Envelope::deserialize(report)
        .map_err(|e| OneBotError::InvalidEvent(format!("missing post_type: {e}")))?;

    match envelope.post_type.as_str() {
        "message" => parse_message(report).map(|m| Some(PlatformEvent::Message(m))),
        "notice" => parse_notice(report),
        _ => Ok(None),
    }
}

fn parse_message(report: &serde_json::Value) -> Result<InboundMessage, OneBotError> {
    let event = MessageEvent::deserialize(report)
        .map_err(|e| OneBotError::InvalidEvent(format!("malformed message event: {e}")))?;

    let sender_name = event
        .sender
        .card
        .filter(|c| !c.is_empty())
        .or(event.sender.nickname)
        .unwrap_or_default();
    let origin = event.group_id.map(|id| {
        let origin = Origin::new(OriginId::new(id));
        match event.group_name {
            Some(name) if !name.is_empty() => origin.with_name(name),
            _ => origin,
        }
    });
    let components = match event.message {
        MessageBody::Segments(segments) => segments.iter().filter_map(component).collect(),
        MessageBody::Text(raw) => parse_cq_string(&raw),
    };

    let mut message = InboundMessage::new(
        event.message_id,
        event.user_id,
        sender_name,
        origin,
        components,
    );
    if let Some(received_at) = event.time.and_then(timestamp) {
        message.received_at = received_at;
    }
    Ok(message)
}

fn parse_notice(report: &serde_json::Value) -> Result<Option<PlatformEvent>, OneBotError> {
    let Some(notice_type) = report.get("notice_type").and_then(|v| v.as_str()) else {
        return Ok(None);
    };
    if notice_type != "group_recall" && notice_type != "friend_recall" {
        return Ok(None);
    }

    let event = RecallEvent::deserialize(report)
        .map_err(|e| OneBotError::InvalidEvent(format!("malformed recall notice: {e}")))?;
    let message_id = event
        .message_id
        .ok_or_else(|| OneBotError::InvalidEvent("recall notice without message_id".into()))?;

    let scope = if event.notice_type == "group_recall" {
        let group = event
            .group_id
            .ok_or_else(|| OneBotError::InvalidEvent("group recall without group_id".into()))?;
        RecallScope::Group(OriginId::new(group))
    } else {
        RecallScope::Private
    };
    let actor = event.operator_id.or(event.user_id).map(UserId::new);

    Ok(Some(PlatformEvent::Recall(RecallNotice::new(
        message_id, actor, scope,
    ))))
}

fn component(segment: &RawSegment) -> Option<Component> {
    let field = |name: &str| {
        segment
            .data
            .get(name)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    };
    match segment.kind.as_str() {
        "text" => field("text").map(Component::text),
        "image" => field("file").or_else(|| field("url")).map(Component::image),
        "record" => field("file").or_else(|| field("url")).map(Component::audio),
        _ => None,
    }
}

fn timestamp(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

/// Parse a CQ-code message string into components.
///
/// Plain text between codes becomes text components; `[CQ:image,...]` and
/// `[CQ:record,...]` become file components; other codes are dropped.
pub fn parse_cq_string(raw: &str) -> Vec<Component> {
    let mut components = Vec::new();
    let mut rest = raw;

    while let Some(start) = rest.find("[CQ:") {
        push_text(&mut components, &rest[..start]);
        let after = &rest[start + 4..];
        let Some(end) = after.find(']') else {
            push_text(&mut components, &rest[start..]);
            return components;
        };
        if let Some(component) = cq_component(&after[..end]) {
            components.push(component);
        }
        rest = &after[end + 1..];
    }
    push_text(&mut components, rest);
    components
}

fn push_text(components: &mut Vec<Component>, text: &str) {
    if !text.is_empty() {
        components.push(Component::text(unescape_cq(text, false)));
    }
}

fn cq_component(body: &str) -> Option<Component> {
    let mut parts = body.split(',');
    let kind = parts.next()?;
    let file = parts.find_map(|p| p.strip_prefix("file="))?;
    let file = unescape_cq(file, true);
    match kind {
        "image" => Some(Component::image(file)),
        "record" => Some(Component::audio(file)),
        _ => None,
    }
}

fn unescape_cq(text: &str, in_param: bool) -> String {
    let text = text
        .replace("&#91;", "[")
        .replace("&#93;", "]");
    let text = if in_param {
        text.replace("&#44;", ",")
    } else {
        text
    };
    text.replace("&amp;", "&")
}
