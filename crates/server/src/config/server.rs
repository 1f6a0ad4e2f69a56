use serde::Deserialize;

/// HTTP server bind configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path at which OneBot HTTP-POST event reports are accepted.
    #[serde(default = "default_event_path")]
    pub event_path: String,
    /// Graceful shutdown timeout in seconds.
    ///
    /// Maximum time to wait for queued events and in-flight forwards to
    /// finish once the listener has stopped.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            event_path: default_event_path(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
        }
    }
}

impl ServerConfig {
    /// The event path with a leading slash, as axum routes require.
    pub fn route_path(&self) -> String {
        let trimmed = self.event_path.trim();
        if trimmed.starts_with('/') {
            trimmed.to_owned()
        } else {
            format!("/{trimmed}")
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    8780
}

fn default_event_path() -> String {
    "/onebot".to_owned()
}

fn default_shutdown_timeout() -> u64 {
    10
}
