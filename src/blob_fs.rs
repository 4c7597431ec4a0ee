//! File-backed [`BlobStore`]: one file per key in a data directory.
//!
//! Writes go to a temporary sibling file that is then renamed over the
//! target, so a failed write leaves the previous snapshot intact.

use async_trait::async_trait;
use nexus_catalog_core::{BlobError, BlobStore};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

const BLOB_EXTENSION: &str = "json";
const TEMP_EXTENSION: &str = "json.tmp";

pub struct FileBlobStore {
    root: PathBuf,
    quota: Option<usize>,
}

impl FileBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            quota: None,
        }
    }

    /// Reject writes that would push the directory's blob files past
    /// `quota` bytes.
    pub fn with_quota(root: impl Into<PathBuf>, quota: Option<usize>) -> Self {
        Self {
            root: root.into(),
            quota,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding the value for `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", sanitize_key(key), BLOB_EXTENSION))
    }

    async fn bytes_used_excluding(&self, target: &Path) -> Result<usize, BlobError> {
        let mut total = 0usize;
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            let is_blob = path.extension().and_then(|e| e.to_str()) == Some(BLOB_EXTENSION);
            if !is_blob || path == target {
                continue;
            }
            total += entry.metadata().await?.len() as usize;
        }
        Ok(total)
    }
}

/// Keys become file names: anything outside `[A-Za-z0-9._-]` is replaced.
fn sanitize_key(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn get(&self, key: &str) -> Result<Option<String>, BlobError> {
        match tokio::fs::read(self.path_for(key)).await {
            // Invalid UTF-8 is passed through lossily so the catalog
            // reports it as a corrupt payload, not a read failure.
            Ok(bytes) => Ok(Some(
                String::from_utf8(bytes)
                    .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()),
            )),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), BlobError> {
        let target = self.path_for(key);
        if let Some(quota) = self.quota {
            let needed = self.bytes_used_excluding(&target).await? + value.len();
            if needed > quota {
                return Err(BlobError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }

        tokio::fs::create_dir_all(&self.root).await?;
        let temp = target.with_extension(TEMP_EXTENSION);
        tokio::fs::write(&temp, value).await?;
        if let Err(e) = tokio::fs::rename(&temp, &target).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }
        Ok(())
    }
}
