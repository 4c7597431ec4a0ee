//! Manual entry: editable drafts and save-time validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Product, Scalar};
use crate::normalize::ProductField;

/// Number of trailing epoch-millisecond digits used for a default id.
const DEFAULT_ID_DIGITS: usize = 6;

/// Rejected save: one or more required fields are blank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("required fields are empty: {}", .missing.join(", "))]
pub struct ValidationError {
    pub missing: Vec<&'static str>,
}

/// Default id for a new manual record: the last six digits of the
/// current Unix time in milliseconds.
pub fn default_id(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().to_string();
    let start = millis.len().saturating_sub(DEFAULT_ID_DIGITS);
    millis[start..].to_string()
}

/// Form state for adding or editing one product. Every field is text, as
/// typed by the operator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    pub id: String,
    pub name: String,
    pub price: String,
    pub rental_price: String,
    pub shipping_list: String,
    pub notes: String,
    pub image_url: String,
    pub parameters: String,
    pub lead_time: String,
    pub customer_prep: String,
    pub case_reference: String,
    pub applicable_occasions: String,
    /// The record being edited, used to keep untouched numeric values numeric.
    #[serde(skip)]
    base: Option<Product>,
}

impl ProductDraft {
    /// A blank draft with a time-derived default id.
    pub fn new() -> Self {
        Self::new_at(Utc::now())
    }

    pub fn new_at(now: DateTime<Utc>) -> Self {
        Self {
            id: default_id(now),
            ..Self::default()
        }
    }

    /// Prefill a draft from an existing record.
    pub fn from_product(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.to_string(),
            rental_price: product.rental_price.to_string(),
            shipping_list: product.shipping_list.clone(),
            notes: product.notes.clone(),
            image_url: product.image_url.clone(),
            parameters: product.parameters.clone(),
            lead_time: product.lead_time.clone(),
            customer_prep: product.customer_prep.clone(),
            case_reference: product.case_reference.clone(),
            applicable_occasions: product.applicable_occasions.clone(),
            base: Some(product.clone()),
        }
    }

    /// The editable text behind `field`.
    pub fn field_mut(&mut self, field: ProductField) -> &mut String {
        match field {
            ProductField::Id => &mut self.id,
            ProductField::Name => &mut self.name,
            ProductField::Price => &mut self.price,
            ProductField::RentalPrice => &mut self.rental_price,
            ProductField::ShippingList => &mut self.shipping_list,
            ProductField::Notes => &mut self.notes,
            ProductField::ImageUrl => &mut self.image_url,
            ProductField::Parameters => &mut self.parameters,
            ProductField::LeadTime => &mut self.lead_time,
            ProductField::CustomerPrep => &mut self.customer_prep,
            ProductField::CaseReference => &mut self.case_reference,
            ProductField::ApplicableOccasions => &mut self.applicable_occasions,
        }
    }

    /// Builder form of [`field_mut`](Self::field_mut).
    pub fn with(mut self, field: ProductField, value: impl Into<String>) -> Self {
        *self.field_mut(field) = value.into();
        self
    }

    /// True when this draft was prefilled from an existing record.
    pub fn is_edit(&self) -> bool {
        self.base.is_some()
    }

    /// Build the product to save, or report the blank required fields.
    ///
    /// The draft is borrowed, not consumed, so a rejected form keeps the
    /// operator's input for correction.
    pub fn validate(&self) -> Result<Product, ValidationError> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.price.trim().is_empty() {
            missing.push("price");
        }
        if !missing.is_empty() {
            return Err(ValidationError { missing });
        }

        let base = self.base.as_ref();
        Ok(Product {
            id: self.scalar(&self.id, base.map(|b| &b.id)),
            name: self.name.clone(),
            price: self.scalar(&self.price, base.map(|b| &b.price)),
            rental_price: self.scalar(&self.rental_price, base.map(|b| &b.rental_price)),
            shipping_list: self.shipping_list.clone(),
            notes: self.notes.clone(),
            image_url: self.image_url.clone(),
            parameters: self.parameters.clone(),
            lead_time: self.lead_time.clone(),
            customer_prep: self.customer_prep.clone(),
            case_reference: self.case_reference.clone(),
            applicable_occasions: self.applicable_occasions.clone(),
        })
    }

    /// Unchanged values keep their original scalar kind; edited or new
    /// values are stored as the text typed.
    fn scalar(&self, typed: &str, original: Option<&Scalar>) -> Scalar {
        match original {
            Some(orig) if orig.to_string() == typed => orig.clone(),
            _ => Scalar::Text(typed.to_string()),
        }
    }
}
