use std::time::Duration;

/// Configuration for the OneBot HTTP API client.
#[derive(Clone)]
pub struct OneBotConfig {
    /// Base URL of the OneBot HTTP API, e.g. `http://127.0.0.1:5700`.
    pub api_url: String,

    /// Access token sent as a bearer token on every call.
    pub access_token: Option<String>,

    /// Per-request timeout. A call exceeding it is reported as a timeout.
    pub timeout: Duration,

    /// Output format requested from `get_record`.
    pub audio_format: String,
}

impl std::fmt::Debug for OneBotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OneBotConfig")
            .field("api_url", &self.api_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout", &self.timeout)
            .field("audio_format", &self.audio_format)
            .finish()
    }
}

impl OneBotConfig {
    /// Create a configuration for the API at `api_url`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            access_token: None,
            timeout: Duration::from_secs(30),
            audio_format: "mp3".to_owned(),
        }
    }

    /// Set the access token.
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the audio format requested from `get_record`.
    #[must_use]
    pub fn with_audio_format(mut self, format: impl Into<String>) -> Self {
        self.audio_format = format.into();
        self
    }

    /// URL of the API endpoint for `action`.
    pub fn endpoint(&self, action: &str) -> String {
        format!("{}/{action}", self.api_url.trim_end_matches('/'))
    }
}
