use serde::Deserialize;

use recallguard_core::{KindToggles, MonitorPolicy, OriginId, RecallActorPolicy, UserId};

use crate::error::ServerError;

/// Which senders and content kinds are shadowed.
#[derive(Debug, Clone, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct MonitorConfig {
    /// Monitored user ids.
    #[serde(default)]
    pub users: Vec<String>,
    /// User ids that are never shadowed.
    #[serde(default)]
    pub blacklist: Vec<String>,
    /// Monitored group ids, used when `origin_monitoring` is enabled.
    #[serde(default)]
    pub origins: Vec<String>,
    /// Enables group-level monitoring.
    #[serde(default)]
    pub origin_monitoring: bool,
    /// Shadow plain text.
    #[serde(default)]
    pub text: bool,
    /// Shadow images.
    #[serde(default = "default_image")]
    pub image: bool,
    /// Shadow voice clips.
    #[serde(default)]
    pub audio: bool,
    /// Recall-actor gate: `"any"` or `"monitored_only"`.
    #[serde(default = "default_recall_actor")]
    pub recall_actor: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            users: Vec::new(),
            blacklist: Vec::new(),
            origins: Vec::new(),
            origin_monitoring: false,
            text: false,
            image: default_image(),
            audio: false,
            recall_actor: default_recall_actor(),
        }
    }
}

impl MonitorConfig {
    /// Convert into the policy evaluated for every inbound event.
    pub fn to_policy(&self) -> Result<MonitorPolicy, ServerError> {
        Ok(MonitorPolicy {
            users: ids(&self.users).map(UserId::new).collect(),
            blacklist: ids(&self.blacklist).map(UserId::new).collect(),
            origins: ids(&self.origins).map(OriginId::new).collect(),
            origin_monitoring: self.origin_monitoring,
            kinds: KindToggles {
                text: self.text,
                image: self.image,
                audio: self.audio,
            },
            recall_actor: parse_recall_actor(&self.recall_actor)?,
        })
    }
}

fn ids(values: &[String]) -> impl Iterator<Item = &str> {
    values.iter().map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn parse_recall_actor(value: &str) -> Result<RecallActorPolicy, ServerError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "any" => Ok(RecallActorPolicy::Any),
        "monitored_only" => Ok(RecallActorPolicy::MonitoredOnly),
        other => Err(ServerError::Config(format!(
            "unknown recall_actor '{other}' (expected 'any' or 'monitored_only')"
        ))),
    }
}

fn default_image() -> bool {
    true
}

fn default_recall_actor() -> String {
    "any".to_owned()
}
