//! Plain-text rendering of products for the terminal.

use anyhow::Result;
use nexus_catalog_core::Product;
use serde::Serialize;

const NAME_WIDTH: usize = 32;

/// Print a compact table, one product per line, in the order given.
pub fn print_table<'a>(products: impl IntoIterator<Item = &'a Product>) {
    println!(
        "  {:>4}  {:<10} {:<w$} {:>12} {:>12}",
        "#",
        "ID",
        "NAME",
        "PRICE",
        "RENTAL",
        w = NAME_WIDTH
    );
    println!("  {}", "-".repeat(NAME_WIDTH + 44));
    for (i, p) in products.into_iter().enumerate() {
        println!(
            "  {:>4}  {:<10} {:<w$} {:>12} {:>12}",
            i + 1,
            p.id.to_string(),
            truncate(&p.name, NAME_WIDTH),
            p.price.to_string(),
            p.rental_price_display(),
            w = NAME_WIDTH
        );
    }
}

/// Print every field of one product. Empty optional fields are skipped;
/// the rental price always shows, as `N/A` when unset.
pub fn print_detail(p: &Product) {
    println!("--- Product ---");
    println!("id:            {}", p.id);
    println!("name:          {}", p.name);
    println!("price:         {}", p.price);
    println!("rental price:  {}", p.rental_price_display());
    if let Some(url) = p.image() {
        println!("image:         {}", url);
    }

    let sections = [
        ("Parameters", &p.parameters),
        ("Shipping list", &p.shipping_list),
        ("Lead time", &p.lead_time),
        ("Customer prep", &p.customer_prep),
        ("Applicable occasions", &p.applicable_occasions),
        ("Case reference", &p.case_reference),
        ("Notes", &p.notes),
    ];
    for (title, body) in sections {
        if body.trim().is_empty() {
            continue;
        }
        println!();
        println!("--- {} ---", title);
        println!("{}", body);
    }
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
