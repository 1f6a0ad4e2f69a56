//! Fetches remote image/audio references and persists them in the cache
//! directory.
//!
//! Files are written to a hidden `.part` sibling and renamed into place, so a
//! path returned by [`FileMaterializer::materialize`] always names a fully
//! written file.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument, warn};

use recallguard_core::{ContentKind, MessageId};
use recallguard_platform::DynPlatform;

use crate::error::ShadowError;

/// Longest source extension that is carried over to the cached copy.
const MAX_EXTENSION_LEN: usize = 8;

/// Suffix of files that are still being written.
pub const PART_SUFFIX: &str = ".part";

/// Materializes remote file references into the cache directory.
#[derive(Clone)]
pub struct FileMaterializer {
    platform: Arc<dyn DynPlatform>,
    cache_dir: PathBuf,
}

impl std::fmt::Debug for FileMaterializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileMaterializer")
            .field("platform", &self.platform.name())
            .field("cache_dir", &self.cache_dir)
            .finish()
    }
}

impl FileMaterializer {
    pub fn new(platform: Arc<dyn DynPlatform>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            platform,
            cache_dir: cache_dir.into(),
        }
    }

    /// The cache directory.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Create the cache directory if needed.
    pub async fn prepare(&self) -> Result<(), ShadowError> {
        tokio::fs::create_dir_all(&self.cache_dir).await?;
        Ok(())
    }

    /// Fetch `file_ref` and copy it into the cache under a name derived from
    /// `message_id`.
    ///
    /// Every failure (remote timeout, remote error, local copy error) is
    /// soft: it is logged and reported as `None`.
    #[instrument(skip(self), fields(platform = %self.platform.name()))]
    pub async fn materialize(
        &self,
        file_ref: &str,
        message_id: &MessageId,
        kind: ContentKind,
    ) -> Option<PathBuf> {
        let source = match self.platform.fetch_remote_file(kind, file_ref).await {
            Ok(path) => path,
            Err(e) if e.is_timeout() => {
                warn!(error = %e, "remote file fetch timed out, not shadowing");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "remote file fetch failed, not shadowing");
                return None;
            }
        };

        let target = self.target_path(message_id, kind, &source);
        match self.copy_into_cache(&source, &target).await {
            Ok(()) => {
                debug!(path = %target.display(), "materialized file");
                Some(target)
            }
            Err(e) => {
                warn!(error = %e, source = %source.display(), "failed to copy file into cache");
                None
            }
        }
    }

    async fn copy_into_cache(&self, source: &Path, target: &Path) -> Result<(), ShadowError> {
        let file_name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let part = self.cache_dir.join(format!(
            ".{file_name}.{}{PART_SUFFIX}",
            uuid::Uuid::new_v4().simple()
        ));

        if let Err(e) = tokio::fs::copy(source, &part).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&part, target).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// Path of the cached copy for `message_id`.
    pub fn target_path(&self, message_id: &MessageId, kind: ContentKind, source: &Path) -> PathBuf {
        let extension = source
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| {
                !e.is_empty()
                    && e.len() <= MAX_EXTENSION_LEN
                    && e.chars().all(|c| c.is_ascii_alphanumeric())
            })
            .map(|e| format!(".{}", e.to_ascii_lowercase()))
            .or_else(|| kind.default_extension().map(str::to_owned))
            .unwrap_or_default();
        self.cache_dir
            .join(format!("{}{extension}", encode_file_stem(message_id.as_str())))
    }

    /// Delete every file left in the cache directory by a previous run.
    ///
    /// Returns the number of files removed.
    pub async fn purge_stale(&self) -> Result<usize, ShadowError> {
        let mut entries = match tokio::fs::read_dir(&self.cache_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut removed = 0;
        while let Some(entry) = entries.next_entry().await? {
            let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
            if is_file && discard_file(&entry.path()).await {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Delete a cache file, logging anything other than "already gone".
pub async fn discard_file(path: &Path) -> bool {
    match tokio::fs::remove_file(path).await {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "cache file already removed");
            false
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to delete cache file");
            false
        }
    }
}

/// Map a message id onto a file stem, reversibly.
///
/// ASCII alphanumerics and `-` pass through; every other byte (including
/// `_` itself) becomes `_XX` in upper-case hex, so distinct ids never share a
/// cache file. The empty id maps to a lone `_`.
pub fn encode_file_stem(message_id: &str) -> String {
    if message_id.is_empty() {
        return "_".to_owned();
    }
    let mut stem = String::with_capacity(message_id.len());
    for byte in message_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            stem.push(char::from(byte));
        } else {
            let _ = write!(stem, "_{byte:02X}");
        }
    }
    stem
}

/// Inverse of [`encode_file_stem`]. `None` if `stem` is not a valid encoding.
pub fn decode_file_stem(stem: &str) -> Option<String> {
    if stem == "_" {
        return Some(String::new());
    }
    let raw = stem.as_bytes();
    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'_' {
            let hex = std::str::from_utf8(raw.get(i + 1..i + 3)?).ok()?;
            bytes.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            bytes.push(raw[i]);
            i += 1;
        }
    }
    String::from_utf8(bytes).ok()
}

/// Recover the message id from a cache file name.
pub fn message_id_hint(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(decode_file_stem)
}

/// Whether a cache entry is a hidden or partially written file.
pub fn is_transient(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.') || n.ends_with(PART_SUFFIX))
}
