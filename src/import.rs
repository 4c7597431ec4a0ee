//! `nexus import`: decode a spreadsheet or JSON file and add its rows.
//!
//! Rows are normalized through the configured header aliases and
//! prepended as one batch, so the newest import lists first.

use anyhow::{Context, Result};
use nexus_catalog_core::normalize::{UNKNOWN_NAME, UNKNOWN_PRICE};
use nexus_catalog_core::{normalize, Scalar};
use std::path::Path;

use crate::config::Config;
use crate::decode;
use crate::storage;

pub async fn run_import(config: &Config, path: &Path, replace: bool, dry_run: bool) -> Result<()> {
    let rows = decode::decode_file(path, config.import.max_rows)
        .with_context(|| format!("Failed to import {}", path.display()))?;

    if dry_run {
        let products = normalize(&rows, &config.aliases);
        let unknown_name = products.iter().filter(|p| p.name == UNKNOWN_NAME).count();
        let unknown_price = products
            .iter()
            .filter(|p| p.price == Scalar::from(UNKNOWN_PRICE))
            .count();
        println!("import {} (dry-run)", path.display());
        println!("  rows decoded:         {}", rows.len());
        println!("  products:             {}", products.len());
        println!("  without a name:       {}", unknown_name);
        println!("  without a price:      {}", unknown_price);
        println!("  mode:                 {}", if replace { "replace" } else { "prepend" });
        return Ok(());
    }

    let mut session = storage::open_session(config).await?;
    let added = if replace {
        session.replace_rows(&rows).await?
    } else {
        session.import_rows(&rows).await?
    };

    println!(
        "{} {} products from {}. {} products in catalog.",
        if replace { "Loaded" } else { "Imported" },
        added,
        path.display(),
        session.store().len()
    );
    Ok(())
}
