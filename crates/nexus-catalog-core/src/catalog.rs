//! Ordered product collection with whole-snapshot persistence.
//!
//! [`CatalogStore`] owns the in-memory records and an injected
//! [`BlobStore`]. Every mutation re-serializes the entire collection as a
//! JSON array and writes it under one fixed key before returning, so after
//! a successful call the in-memory and durable views are identical.
//!
//! # Write failures
//!
//! When the blob store rejects a write (quota, I/O) the mutation is kept in
//! memory, the store is marked dirty, and the call returns
//! [`CatalogError::PersistenceWrite`]. Nothing is retried automatically;
//! [`CatalogStore::flush`] re-attempts the write on request.
//!
//! # Identity
//!
//! Product ids are not unique. Each in-memory entry carries a
//! [`RecordHandle`], a session-local token used to target one concrete
//! record (for in-place edits). Handles are never persisted.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::CatalogError;
use crate::models::{Product, Scalar};
use crate::store::BlobStore;

/// Key the catalog snapshot is stored under unless configured otherwise.
pub const DEFAULT_CATALOG_KEY: &str = "nexus_products";

/// Opaque, session-local identity of one catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordHandle(u64);

/// A product together with its session handle.
#[derive(Debug, Clone)]
pub struct Entry {
    handle: RecordHandle,
    product: Product,
}

impl Entry {
    pub fn handle(&self) -> RecordHandle {
        self.handle
    }

    pub fn product(&self) -> &Product {
        &self.product
    }
}

/// Outcome of [`CatalogStore::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadReport {
    /// Nothing stored under the key yet.
    Empty,
    /// Snapshot adopted; holds the record count.
    Loaded(usize),
    /// Payload could not be parsed; previous in-memory state kept.
    Corrupt(String),
}

pub struct CatalogStore<B> {
    blobs: B,
    key: String,
    entries: Vec<Entry>,
    next_handle: u64,
    dirty: bool,
}

impl<B: BlobStore> CatalogStore<B> {
    /// An empty store persisting under [`DEFAULT_CATALOG_KEY`].
    pub fn new(blobs: B) -> Self {
        Self::with_key(blobs, DEFAULT_CATALOG_KEY)
    }

    pub fn with_key(blobs: B, key: impl Into<String>) -> Self {
        Self {
            blobs,
            key: key.into(),
            entries: Vec::new(),
            next_handle: 0,
            dirty: false,
        }
    }

    /// Build a store and immediately [`load`](Self::load) it.
    pub async fn open(blobs: B, key: impl Into<String>) -> Result<(Self, LoadReport), CatalogError> {
        let mut store = Self::with_key(blobs, key);
        let report = store.load().await?;
        Ok((store, report))
    }

    /// Read the snapshot under the store key and adopt it.
    ///
    /// A corrupt payload never fails the call: it is logged, reported as
    /// [`LoadReport::Corrupt`], and the current records are left untouched.
    pub async fn load(&mut self) -> Result<LoadReport, CatalogError> {
        let payload = self
            .blobs
            .get(&self.key)
            .await
            .map_err(|source| CatalogError::PersistenceRead {
                key: self.key.clone(),
                source,
            })?;

        let Some(payload) = payload else {
            debug!(key = %self.key, "no catalog snapshot stored");
            return Ok(LoadReport::Empty);
        };

        match serde_json::from_str::<Vec<Product>>(&payload) {
            Ok(products) => {
                let count = products.len();
                self.entries = self.wrap(products);
                self.dirty = false;
                info!(key = %self.key, records = count, "catalog loaded");
                Ok(LoadReport::Loaded(count))
            }
            Err(e) => {
                warn!(
                    key = %self.key,
                    error = %e,
                    "corrupt catalog snapshot; keeping current records"
                );
                Ok(LoadReport::Corrupt(e.to_string()))
            }
        }
    }

    /// Set the collection to exactly `records`, then persist.
    pub async fn replace_all(&mut self, records: Vec<Product>) -> Result<(), CatalogError> {
        self.entries = self.wrap(records);
        debug!(records = self.entries.len(), "catalog replaced");
        self.persist().await
    }

    /// Prepend a batch ahead of the existing records (batch order kept),
    /// then persist. Returns the number of records added.
    pub async fn import_batch(&mut self, records: Vec<Product>) -> Result<usize, CatalogError> {
        let added = records.len();
        let batch = self.wrap(records);
        self.entries.splice(0..0, batch);
        debug!(added, total = self.entries.len(), "batch imported");
        self.persist().await?;
        Ok(added)
    }

    /// Save one product.
    ///
    /// If `editing` names a live entry, that entry is replaced in place and
    /// keeps its position and handle. Otherwise the product is prepended as
    /// a new entry.
    pub async fn upsert(
        &mut self,
        product: Product,
        editing: Option<RecordHandle>,
    ) -> Result<RecordHandle, CatalogError> {
        let existing = editing.and_then(|h| self.position(h));
        let handle = match existing {
            Some(index) => {
                let entry = &mut self.entries[index];
                entry.product = product;
                debug!(index, "record replaced in place");
                entry.handle
            }
            None => {
                let handle = self.next_handle();
                self.entries.insert(0, Entry { handle, product });
                debug!(total = self.entries.len(), "record prepended");
                handle
            }
        };
        self.persist().await?;
        Ok(handle)
    }

    /// Remove every record whose id has the same string form as `id`.
    /// Returns how many were removed.
    pub async fn remove(&mut self, id: &Scalar) -> Result<usize, CatalogError> {
        let before = self.entries.len();
        self.entries.retain(|e| !e.product.id.same_text(id));
        let removed = before - self.entries.len();
        debug!(id = %id, removed, "records removed by id");
        self.persist().await?;
        Ok(removed)
    }

    /// Remove exactly the entry behind `handle`. Returns whether it existed.
    pub async fn remove_handle(&mut self, handle: RecordHandle) -> Result<bool, CatalogError> {
        let Some(index) = self.position(handle) else {
            return Ok(false);
        };
        self.entries.remove(index);
        self.persist().await?;
        Ok(true)
    }

    /// Re-attempt a write that previously failed. No-op when clean.
    pub async fn flush(&mut self) -> Result<(), CatalogError> {
        if !self.dirty {
            return Ok(());
        }
        self.persist().await
    }

    async fn persist(&mut self) -> Result<(), CatalogError> {
        self.dirty = true;
        let payload = serde_json::to_string(&Snapshot(&self.entries))?;
        match self.blobs.set(&self.key, &payload).await {
            Ok(()) => {
                self.dirty = false;
                debug!(key = %self.key, bytes = payload.len(), "catalog persisted");
                Ok(())
            }
            Err(source) => {
                warn!(key = %self.key, error = %source, "catalog write failed; changes kept in memory");
                Err(CatalogError::PersistenceWrite {
                    key: self.key.clone(),
                    source,
                })
            }
        }
    }

    fn wrap(&mut self, products: Vec<Product>) -> Vec<Entry> {
        products
            .into_iter()
            .map(|product| Entry {
                handle: self.next_handle(),
                product,
            })
            .collect()
    }

    fn next_handle(&mut self) -> RecordHandle {
        let handle = RecordHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }
}

impl<B> CatalogStore<B> {
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Products in collection order (most recent first).
    pub fn products(&self) -> impl Iterator<Item = &Product> + '_ {
        self.entries.iter().map(|e| &e.product)
    }

    pub fn to_vec(&self) -> Vec<Product> {
        self.products().cloned().collect()
    }

    pub fn get(&self, handle: RecordHandle) -> Option<&Product> {
        self.entries
            .iter()
            .find(|e| e.handle == handle)
            .map(|e| &e.product)
    }

    pub fn position(&self, handle: RecordHandle) -> Option<usize> {
        self.entries.iter().position(|e| e.handle == handle)
    }

    pub fn handle_at(&self, index: usize) -> Option<RecordHandle> {
        self.entries.get(index).map(|e| e.handle)
    }

    /// Entries whose id has the same string form as `id`, in order.
    pub fn find_by_id(&self, id: &Scalar) -> impl Iterator<Item = &Entry> + '_ {
        let id = id.clone();
        self.entries.iter().filter(move |e| e.product.id.same_text(&id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// True when the last write failed and memory is ahead of storage.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn blob_store(&self) -> &B {
        &self.blobs
    }
}

/// Serializes entries as a bare JSON array of products.
struct Snapshot<'a>(&'a [Entry]);

impl Serialize for Snapshot<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(|e| &e.product))
    }
}
