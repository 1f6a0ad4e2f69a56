use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use recallguard_shadow::CacheConfig;

use crate::error::ServerError;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Cache directory and janitor configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    /// Directory holding materialized files.
    #[serde(default = "default_dir")]
    pub dir: String,
    /// Seconds between janitor sweeps.
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    /// Seconds a record may stay cached before it expires.
    #[serde(default = "default_lifetime")]
    pub lifetime_seconds: u64,
    /// Cap on the cache directory size in megabytes. Zero or negative
    /// disables the size sweep.
    #[serde(default)]
    pub max_size_mb: i64,
    /// Delete leftover files from a previous run at startup.
    #[serde(default = "default_purge_on_start")]
    pub purge_on_start: bool,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            interval_seconds: default_interval(),
            lifetime_seconds: default_lifetime(),
            max_size_mb: 0,
            purge_on_start: default_purge_on_start(),
        }
    }
}

impl CacheSection {
    /// Convert into the janitor's configuration.
    pub fn to_cache_config(&self) -> Result<CacheConfig, ServerError> {
        if self.dir.trim().is_empty() {
            return Err(ServerError::Config("cache.dir must not be empty".into()));
        }
        if self.interval_seconds == 0 {
            return Err(ServerError::Config(
                "cache.interval_seconds must be positive".into(),
            ));
        }
        Ok(CacheConfig {
            dir: PathBuf::from(self.dir.trim()),
            interval: Duration::from_secs(self.interval_seconds),
            lifetime: Duration::from_secs(self.lifetime_seconds),
            max_bytes: self.max_bytes(),
            purge_on_start: self.purge_on_start,
        })
    }

    /// Size cap in bytes, `None` when the size sweep is disabled.
    pub fn max_bytes(&self) -> Option<u64> {
        u64::try_from(self.max_size_mb)
            .ok()
            .filter(|mb| *mb > 0)
            .map(|mb| mb.saturating_mul(BYTES_PER_MB))
    }
}

fn default_dir() -> String {
    "./recallguard-cache".to_owned()
}

fn default_interval() -> u64 {
    600
}

fn default_lifetime() -> u64 {
    86_400
}

fn default_purge_on_start() -> bool {
    true
}
