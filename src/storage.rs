//! Opens the on-disk catalog described by the configuration.

use anyhow::{Context, Result};
use nexus_catalog_core::{CatalogStore, Session};
use tracing::warn;

use crate::blob_fs::FileBlobStore;
use crate::config::Config;

pub type CatalogSession = Session<FileBlobStore>;

pub fn blob_store(config: &Config) -> FileBlobStore {
    FileBlobStore::with_quota(&config.storage.data_dir, config.storage.quota_bytes)
}

/// Load the catalog and start a session over it. A corrupt snapshot is
/// reported on stderr and the session starts empty.
pub async fn open_session(config: &Config) -> Result<CatalogSession> {
    let store = CatalogStore::with_key(blob_store(config), config.storage.key.clone());
    let session = Session::start(store, config.aliases.clone(), config.search.params())
        .await
        .with_context(|| {
            format!(
                "Failed to open catalog in {}",
                config.storage.data_dir.display()
            )
        })?;

    for err in session.load_errors() {
        warn!(error = %err, "catalog load problem");
        eprintln!("Warning: {}", err);
    }
    Ok(session)
}
