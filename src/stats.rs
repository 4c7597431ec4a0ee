//! Catalog statistics: record counts, field coverage and the data file.

use anyhow::Result;
use nexus_catalog_core::normalize::{UNKNOWN_NAME, UNKNOWN_PRICE};
use nexus_catalog_core::{Product, Scalar};
use std::collections::HashSet;

use crate::config::Config;
use crate::storage;

/// Run the stats command: load the catalog and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let session = storage::open_session(config).await?;
    let store = session.store();
    let data_file = store.blob_store().path_for(store.key());
    let size = std::fs::metadata(&data_file).map(|m| m.len()).unwrap_or(0);

    let products: Vec<&Product> = store.products().collect();
    let distinct_ids: HashSet<String> = products.iter().map(|p| p.id.to_string()).collect();
    let unknown_price = Scalar::from(UNKNOWN_PRICE);

    println!("Nexus Catalog Stats");
    println!("===================");
    println!();
    println!("  Store key:   {}", store.key());
    println!("  Data file:   {}", data_file.display());
    println!("  Size:        {}", format_bytes(size));
    if let Some(quota) = config.storage.quota_bytes {
        println!("  Quota:       {}", format_bytes(quota as u64));
    }
    println!();
    println!("  Products:    {}", products.len());
    println!("  Distinct ids: {}", distinct_ids.len());
    println!();
    println!("  Coverage:");
    let coverage = [
        ("name", count(&products, |p| p.name != UNKNOWN_NAME)),
        ("price", count(&products, |p| p.price != unknown_price)),
        ("rental price", count(&products, |p| !p.rental_price.is_blank())),
        ("image", count(&products, |p| p.image().is_some())),
        ("parameters", count(&products, |p| !p.parameters.trim().is_empty())),
        ("lead time", count(&products, |p| !p.lead_time.trim().is_empty())),
    ];
    for (label, n) in coverage {
        println!(
            "  {:<14} {:>6} / {} ({}%)",
            label,
            n,
            products.len(),
            percent(n, products.len())
        );
    }
    println!();
    Ok(())
}

fn count(products: &[&Product], pred: impl Fn(&Product) -> bool) -> usize {
    products.iter().filter(|&&p| pred(p)).count()
}

fn percent(part: usize, whole: usize) -> usize {
    if whole > 0 {
        part * 100 / whole
    } else {
        0
    }
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
