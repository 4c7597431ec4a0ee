//! In-memory [`BlobStore`] implementation for tests and embedded hosts.
//!
//! Uses a `HashMap` behind `std::sync::RwLock`. An optional byte quota
//! models the size limit of browser-style key-value storage: a write that
//! would push the total stored bytes past the quota is rejected and the
//! previous value is left in place.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{BlobError, BlobStore};

/// In-memory blob store.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, String>>,
    quota: RwLock<Option<usize>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            quota: RwLock::new(None),
        }
    }

    /// Reject writes once keys plus values exceed `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            quota: RwLock::new(Some(quota)),
        }
    }

    /// Change the quota for later writes. `None` lifts it.
    pub fn set_quota(&self, quota: Option<usize>) {
        if let Ok(mut current) = self.quota.write() {
            *current = quota;
        }
    }

    /// Store a value directly, bypassing the quota. Used to plant
    /// payloads (including corrupt ones) before a load.
    pub fn insert_raw(&self, key: &str, value: &str) {
        if let Ok(mut blobs) = self.blobs.write() {
            blobs.insert(key.to_string(), value.to_string());
        }
    }

    /// Read a value without going through the async trait.
    pub fn peek(&self, key: &str) -> Option<String> {
        self.blobs.read().ok()?.get(key).cloned()
    }

    /// Total bytes held (keys plus values).
    pub fn used_bytes(&self) -> usize {
        self.blobs
            .read()
            .map(|blobs| blobs.iter().map(|(k, v)| k.len() + v.len()).sum())
            .unwrap_or(0)
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> BlobError {
    BlobError::Backend("in-memory blob store lock poisoned".to_string())
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn get(&self, key: &str) -> Result<Option<String>, BlobError> {
        let blobs = self.blobs.read().map_err(|_| poisoned())?;
        Ok(blobs.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), BlobError> {
        let quota = *self.quota.read().map_err(|_| poisoned())?;
        let mut blobs = self.blobs.write().map_err(|_| poisoned())?;
        if let Some(quota) = quota {
            let others: usize = blobs
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(BlobError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }
        blobs.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_missing_key_is_none() {
        let store = InMemoryBlobStore::new();
        assert!(store.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_then_get_returns_value() {
        let store = InMemoryBlobStore::new();
        store.set("k", "v1").await.unwrap();
        store.set("k", "v2").await.unwrap();
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn quota_rejects_oversized_write_and_keeps_old_value() {
        let store = InMemoryBlobStore::with_quota(10);
        store.set("k", "small").await.unwrap();
        let err = store.set("k", "much too large").await.unwrap_err();
        assert!(matches!(err, BlobError::QuotaExceeded { quota: 10, .. }));
        assert_eq!(store.peek("k").as_deref(), Some("small"));
    }

    #[tokio::test]
    async fn quota_counts_other_keys() {
        let store = InMemoryBlobStore::with_quota(12);
        store.insert_raw("a", "12345");
        assert_eq!(store.used_bytes(), 6);
        assert!(store.set("b", "1234").await.is_ok());
        assert!(store.set("c", "x").await.is_err());
    }

    #[tokio::test]
    async fn raised_quota_admits_later_writes() {
        let store = InMemoryBlobStore::with_quota(4);
        assert!(store.set("k", "too long").await.is_err());
        store.set_quota(None);
        store.set("k", "too long").await.unwrap();
        assert_eq!(store.peek("k").as_deref(), Some("too long"));
    }
}
