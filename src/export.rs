//! Export the catalog as a JSON array of products.
//!
//! The output uses the same camelCase shape as the stored snapshot, so an
//! exported file can be imported again or copied into another data dir.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::storage;

/// If `output` is `Some`, writes to that file path. Otherwise writes to
/// stdout for piping.
pub async fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let session = storage::open_session(config).await?;
    let products = session.store().to_vec();
    let json = serde_json::to_string_pretty(&products)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &json)?;
            eprintln!("Exported {} products to {}", products.len(), path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}
