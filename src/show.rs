//! Read-only views: the full listing and a single product's detail.

use anyhow::{bail, Result};
use nexus_catalog_core::{Entry, Scalar};

use crate::config::Config;
use crate::render;
use crate::storage::{self, CatalogSession};

/// `nexus list`: every record, most recently added first.
pub async fn run_list(config: &Config, json: bool) -> Result<()> {
    let session = storage::open_session(config).await?;
    if json {
        return render::print_json(&session.store().to_vec());
    }
    if session.store().is_empty() {
        println!("Catalog is empty.");
        return Ok(());
    }
    render::print_table(session.store().products());
    println!();
    println!("{} products", session.store().len());
    Ok(())
}

/// `nexus show <id>`: detail view of the `nth` (1-based) record with `id`.
pub async fn run_show(config: &Config, id: &str, nth: usize, json: bool) -> Result<()> {
    let session = storage::open_session(config).await?;
    let (entry, total) = find_nth(&session, id, nth)?;
    if total > 1 {
        eprintln!(
            "Note: {} products share id {}; showing #{} (use --nth to pick another)",
            total, id, nth
        );
    }
    if json {
        return render::print_json(entry.product());
    }
    render::print_detail(entry.product());
    Ok(())
}

/// The `nth` (1-based) record whose id reads as `id`, plus how many match.
pub fn find_nth<'s>(session: &'s CatalogSession, id: &str, nth: usize) -> Result<(&'s Entry, usize)> {
    if nth == 0 {
        bail!("--nth is 1-based; 0 is not a valid position");
    }
    let needle = Scalar::from(id);
    let matches: Vec<&Entry> = session.store().find_by_id(&needle).collect();
    if matches.is_empty() {
        bail!("product not found: {}", id);
    }
    let total = matches.len();
    match matches.get(nth - 1) {
        Some(&entry) => Ok((entry, total)),
        None => bail!("only {} product(s) have id {}; --nth {} is out of range", total, id, nth),
    }
}
