mod cache;
mod forward;
mod monitor;
mod onebot;
mod server;

#[cfg(test)]
mod tests;

pub use cache::*;
pub use forward::*;
pub use monitor::*;
pub use onebot::*;
pub use server::*;

use std::path::Path;

use serde::Deserialize;

use recallguard_shadow::GuardConfig;

use crate::error::ServerError;

/// Default configuration file name.
pub const DEFAULT_CONFIG_PATH: &str = "recallguard.toml";

/// Top-level configuration for the RecallGuard server, loaded from a TOML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecallGuardConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Monitoring policy.
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Forwarding destinations and presentation.
    #[serde(default)]
    pub forward: ForwardSection,
    /// Cache directory and janitor settings.
    #[serde(default)]
    pub cache: CacheSection,
    /// OneBot API connection.
    #[serde(default)]
    pub onebot: OneBotSection,
}

impl RecallGuardConfig {
    /// Parse a configuration document.
    pub fn from_toml(contents: &str) -> Result<Self, ServerError> {
        Ok(toml::from_str(contents)?)
    }

    /// Load the configuration at `path`.
    ///
    /// Returns `Ok(None)` when the file does not exist so the caller can fall
    /// back to defaults.
    pub fn load(path: &Path) -> Result<Option<Self>, ServerError> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents).map(Some)
    }

    /// Validate the guard-facing sections and convert them.
    pub fn to_guard_config(&self) -> Result<GuardConfig, ServerError> {
        Ok(GuardConfig {
            policy: self.monitor.to_policy()?,
            forward: self.forward.to_forward_config()?,
            cache: self.cache.to_cache_config()?,
        })
    }
}
