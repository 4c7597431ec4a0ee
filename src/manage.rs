//! Manual record management: `add`, `edit` and `remove`.

use anyhow::Result;
use clap::Args;
use nexus_catalog_core::{ProductDraft, Scalar};
use tracing::info;

use crate::config::Config;
use crate::show::find_nth;
use crate::storage;

/// Optional field values shared by `add` and `edit`. Unset flags leave
/// the draft untouched; an empty string clears the field.
#[derive(Args, Debug, Clone, Default)]
pub struct FieldArgs {
    /// Product name.
    #[arg(long)]
    pub name: Option<String>,
    /// Price, kept exactly as typed (e.g. `300` or `¥300/day`).
    #[arg(long)]
    pub price: Option<String>,
    #[arg(long)]
    pub rental_price: Option<String>,
    #[arg(long)]
    pub shipping_list: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    #[arg(long)]
    pub image_url: Option<String>,
    #[arg(long)]
    pub parameters: Option<String>,
    #[arg(long)]
    pub lead_time: Option<String>,
    #[arg(long)]
    pub customer_prep: Option<String>,
    #[arg(long)]
    pub case_reference: Option<String>,
    #[arg(long)]
    pub applicable_occasions: Option<String>,
}

impl FieldArgs {
    pub fn apply(&self, draft: &mut ProductDraft) {
        let pairs = [
            (&self.name, &mut draft.name),
            (&self.price, &mut draft.price),
            (&self.rental_price, &mut draft.rental_price),
            (&self.shipping_list, &mut draft.shipping_list),
            (&self.notes, &mut draft.notes),
            (&self.image_url, &mut draft.image_url),
            (&self.parameters, &mut draft.parameters),
            (&self.lead_time, &mut draft.lead_time),
            (&self.customer_prep, &mut draft.customer_prep),
            (&self.case_reference, &mut draft.case_reference),
            (&self.applicable_occasions, &mut draft.applicable_occasions),
        ];
        for (value, slot) in pairs {
            if let Some(value) = value {
                *slot = value.clone();
            }
        }
    }
}

/// `nexus add`: validate a new draft and prepend it.
pub async fn run_add(config: &Config, id: Option<String>, fields: &FieldArgs) -> Result<()> {
    let mut session = storage::open_session(config).await?;

    let mut draft = ProductDraft::new();
    if let Some(id) = id {
        draft.id = id;
    }
    fields.apply(&mut draft);

    session.save(&draft).await?;
    info!(id = %draft.id, "product added");
    println!(
        "Added product {} ({}). {} products in catalog.",
        draft.id,
        draft.name,
        session.store().len()
    );
    Ok(())
}

/// `nexus edit`: prefill from the `nth` record with `id`, apply the flags
/// and replace that record in place.
pub async fn run_edit(
    config: &Config,
    id: &str,
    nth: usize,
    new_id: Option<String>,
    fields: &FieldArgs,
) -> Result<()> {
    let mut session = storage::open_session(config).await?;
    let (entry, _) = find_nth(&session, id, nth)?;
    let handle = entry.handle();

    let mut draft = session.begin_edit(handle)?;
    if let Some(new_id) = new_id {
        draft.id = new_id;
    }
    fields.apply(&mut draft);

    session.save(&draft).await?;
    info!(id = %draft.id, "product updated");
    println!("Updated product {} ({}).", draft.id, draft.name);
    Ok(())
}

/// `nexus remove`: delete every record whose id reads as `id`.
pub async fn run_remove(config: &Config, id: &str) -> Result<()> {
    let mut session = storage::open_session(config).await?;
    let removed = session.remove(&Scalar::from(id)).await?;
    if removed == 0 {
        println!("No product with id {}.", id);
    } else {
        println!(
            "Removed {} product{} with id {}.",
            removed,
            if removed == 1 { "" } else { "s" },
            id
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_catalog_core::ProductField;

    #[test]
    fn apply_only_touches_set_flags() {
        let mut draft = ProductDraft::default()
            .with(ProductField::Name, "Tent A")
            .with(ProductField::Price, "100")
            .with(ProductField::Notes, "keep");
        let fields = FieldArgs {
            price: Some("120".into()),
            lead_time: Some(String::new()),
            ..FieldArgs::default()
        };
        fields.apply(&mut draft);
        assert_eq!(draft.name, "Tent A");
        assert_eq!(draft.price, "120");
        assert_eq!(draft.notes, "keep");
        assert_eq!(draft.lead_time, "");
    }
}
