use thiserror::Error;

use crate::store::BlobError;

/// Errors surfaced by [`CatalogStore`](crate::catalog::CatalogStore).
///
/// A corrupt payload at load time is not an error; see
/// [`LoadReport::Corrupt`](crate::catalog::LoadReport::Corrupt).
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The blob store could not be read.
    #[error("failed to read catalog '{key}': {source}")]
    PersistenceRead {
        key: String,
        #[source]
        source: BlobError,
    },

    /// The mutation was applied in memory but the snapshot was not saved.
    #[error("catalog '{key}' was changed but could not be saved: {source}")]
    PersistenceWrite {
        key: String,
        #[source]
        source: BlobError,
    },

    #[error("failed to serialize catalog: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CatalogError {
    /// True when in-memory state holds changes the blob store lacks.
    pub fn is_unsaved_change(&self) -> bool {
        matches!(
            self,
            CatalogError::PersistenceWrite { .. } | CatalogError::Serialize(_)
        )
    }
}
