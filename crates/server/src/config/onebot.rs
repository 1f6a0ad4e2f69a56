use std::time::Duration;

use serde::Deserialize;

use recallguard_onebot::OneBotConfig;

/// OneBot HTTP API connection settings.
#[derive(Clone, Deserialize)]
pub struct OneBotSection {
    /// Base URL of the OneBot HTTP API.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Access token sent with every API call.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Output format requested for voice clips.
    #[serde(default = "default_audio_format")]
    pub audio_format: String,
}

impl std::fmt::Debug for OneBotSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OneBotSection")
            .field("api_url", &self.api_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout_seconds", &self.timeout_seconds)
            .field("audio_format", &self.audio_format)
            .finish()
    }
}

impl Default for OneBotSection {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            access_token: None,
            timeout_seconds: default_timeout(),
            audio_format: default_audio_format(),
        }
    }
}

impl OneBotSection {
    /// Build the adapter configuration.
    pub fn to_onebot_config(&self) -> OneBotConfig {
        let mut config = OneBotConfig::new(self.api_url.clone())
            .with_timeout(Duration::from_secs(self.timeout_seconds))
            .with_audio_format(self.audio_format.clone());
        if let Some(token) = self.access_token.as_deref().filter(|t| !t.is_empty()) {
            config = config.with_access_token(token);
        }
        config
    }
}

fn default_api_url() -> String {
    "http://127.0.0.1:5700".to_owned()
}

fn default_timeout() -> u64 {
    30
}

fn default_audio_format() -> String {
    "mp3".to_owned()
}
