//! Header normalization: arbitrary tabular rows → canonical [`Product`]s.
//!
//! Each canonical field has an ordered list of recognized source headers
//! ([`HeaderAliases`]). For every row the aliases are tried in order and
//! the first one holding a present value wins; the canonical camelCase key
//! is always tried last, so already-normalized data round-trips.
//!
//! Normalization never fails. A row missing `id` gets its 1-based position
//! in the batch, a row missing `name` or `price` gets a placeholder.

use serde::Deserialize;
use serde_json::Value;

use crate::models::{value_text, Product, Row, Scalar};

/// Placeholder name for rows without any recognized name header.
pub const UNKNOWN_NAME: &str = "Unknown Product";
/// Placeholder price for rows without any recognized price header.
pub const UNKNOWN_PRICE: &str = "N/A";

/// Canonical product fields, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductField {
    Id,
    Name,
    Price,
    RentalPrice,
    ShippingList,
    Notes,
    ImageUrl,
    Parameters,
    LeadTime,
    CustomerPrep,
    CaseReference,
    ApplicableOccasions,
}

impl ProductField {
    pub const ALL: [ProductField; 12] = [
        ProductField::Id,
        ProductField::Name,
        ProductField::Price,
        ProductField::RentalPrice,
        ProductField::ShippingList,
        ProductField::Notes,
        ProductField::ImageUrl,
        ProductField::Parameters,
        ProductField::LeadTime,
        ProductField::CustomerPrep,
        ProductField::CaseReference,
        ProductField::ApplicableOccasions,
    ];

    /// The canonical (serialized) key.
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Price => "price",
            Self::RentalPrice => "rentalPrice",
            Self::ShippingList => "shippingList",
            Self::Notes => "notes",
            Self::ImageUrl => "imageUrl",
            Self::Parameters => "parameters",
            Self::LeadTime => "leadTime",
            Self::CustomerPrep => "customerPrep",
            Self::CaseReference => "caseReference",
            Self::ApplicableOccasions => "applicableOccasions",
        }
    }
}

/// Ordered header aliases per canonical field.
///
/// Deserializable from the `[aliases]` config table; any field left out
/// keeps its default list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HeaderAliases {
    pub id: Vec<String>,
    pub name: Vec<String>,
    pub price: Vec<String>,
    pub rental_price: Vec<String>,
    pub shipping_list: Vec<String>,
    pub notes: Vec<String>,
    pub image_url: Vec<String>,
    pub parameters: Vec<String>,
    pub lead_time: Vec<String>,
    pub customer_prep: Vec<String>,
    pub case_reference: Vec<String>,
    pub applicable_occasions: Vec<String>,
}

fn aliases(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for HeaderAliases {
    fn default() -> Self {
        Self {
            id: aliases(&["序号", "ID"]),
            name: aliases(&["产品名称", "Name"]),
            price: aliases(&["价格", "Price"]),
            rental_price: aliases(&["租赁价格", "Rental Price"]),
            shipping_list: aliases(&["发货清单", "Shipping List"]),
            notes: aliases(&["注意事项", "Notes"]),
            image_url: aliases(&["产品图片", "Image"]),
            parameters: aliases(&["产品参数", "Parameters"]),
            lead_time: aliases(&["工期", "Lead Time"]),
            customer_prep: aliases(&["需自备", "Customer Prep"]),
            case_reference: aliases(&["案例参考", "Case Reference"]),
            applicable_occasions: aliases(&["适用场合", "Occasions"]),
        }
    }
}

impl HeaderAliases {
    pub fn for_field(&self, field: ProductField) -> &[String] {
        match field {
            ProductField::Id => &self.id,
            ProductField::Name => &self.name,
            ProductField::Price => &self.price,
            ProductField::RentalPrice => &self.rental_price,
            ProductField::ShippingList => &self.shipping_list,
            ProductField::Notes => &self.notes,
            ProductField::ImageUrl => &self.image_url,
            ProductField::Parameters => &self.parameters,
            ProductField::LeadTime => &self.lead_time,
            ProductField::CustomerPrep => &self.customer_prep,
            ProductField::CaseReference => &self.case_reference,
            ProductField::ApplicableOccasions => &self.applicable_occasions,
        }
    }

    /// Find the value for `field` in `row`: first present alias, then the
    /// canonical key.
    pub fn resolve<'r>(&self, row: &'r Row, field: ProductField) -> Option<&'r Value> {
        self.for_field(field)
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(field.key()))
            .find_map(|header| row.get(header).filter(|v| is_present(v)))
    }
}

/// Null, `false`, and blank strings count as absent. Numbers, including
/// zero, are present.
fn is_present(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// Normalize a batch of rows. Output order matches input order.
pub fn normalize(rows: &[Row], aliases: &HeaderAliases) -> Vec<Product> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| normalize_row(row, i + 1, aliases))
        .collect()
}

/// Normalize one row; `position` is its 1-based index within the batch.
pub fn normalize_row(row: &Row, position: usize, aliases: &HeaderAliases) -> Product {
    let scalar = |field| aliases.resolve(row, field).map(Scalar::from_value);
    let text = |field| {
        aliases
            .resolve(row, field)
            .map(value_text)
            .unwrap_or_default()
    };

    Product {
        id: scalar(ProductField::Id).unwrap_or_else(|| Scalar::from(position as u64)),
        name: aliases
            .resolve(row, ProductField::Name)
            .map(value_text)
            .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
        price: scalar(ProductField::Price).unwrap_or_else(|| Scalar::from(UNKNOWN_PRICE)),
        rental_price: scalar(ProductField::RentalPrice).unwrap_or_default(),
        shipping_list: text(ProductField::ShippingList),
        notes: text(ProductField::Notes),
        image_url: text(ProductField::ImageUrl),
        parameters: text(ProductField::Parameters),
        lead_time: text(ProductField::LeadTime),
        customer_prep: text(ProductField::CustomerPrep),
        case_reference: text(ProductField::CaseReference),
        applicable_occasions: text(ProductField::ApplicableOccasions),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("row fixture must be an object"),
        }
    }

    #[test]
    fn localized_headers_map_to_canonical_fields() {
        let rows = vec![row(json!({
            "序号": 7,
            "产品名称": "Tent A",
            "价格": "100",
            "租赁价格": "30/day",
            "工期": "3-5天",
            "适用场合": "户外, 婚礼",
        }))];
        let products = normalize(&rows, &HeaderAliases::default());
        let p = &products[0];
        assert_eq!(p.id, Scalar::from(7u64));
        assert_eq!(p.name, "Tent A");
        assert_eq!(p.price, Scalar::from("100"));
        assert_eq!(p.rental_price, Scalar::from("30/day"));
        assert_eq!(p.lead_time, "3-5天");
        assert_eq!(p.applicable_occasions, "户外, 婚礼");
        assert_eq!(p.notes, "");
    }

    #[test]
    fn english_headers_are_accepted() {
        let rows = vec![row(json!({
            "ID": "T-1",
            "Name": "Truss",
            "Price": 250,
            "Shipping List": "4 legs",
            "Occasions": "stage",
        }))];
        let p = &normalize(&rows, &HeaderAliases::default())[0];
        assert_eq!(p.id, Scalar::from("T-1"));
        assert_eq!(p.price, Scalar::from(250u64));
        assert_eq!(p.shipping_list, "4 legs");
        assert_eq!(p.applicable_occasions, "stage");
    }

    #[test]
    fn first_alias_wins() {
        let rows = vec![row(json!({"产品名称": "本地", "Name": "English"}))];
        assert_eq!(normalize(&rows, &HeaderAliases::default())[0].name, "本地");
    }

    #[test]
    fn blank_alias_falls_through_to_next() {
        let rows = vec![row(json!({"产品名称": "", "Name": "English"}))];
        assert_eq!(normalize(&rows, &HeaderAliases::default())[0].name, "English");
    }

    #[test]
    fn canonical_keys_are_accepted() {
        let rows = vec![row(json!({
            "id": 9,
            "name": "Heater",
            "price": "80",
            "rentalPrice": "20",
            "customerPrep": "power outlet",
        }))];
        let p = &normalize(&rows, &HeaderAliases::default())[0];
        assert_eq!(p.id, Scalar::from(9u64));
        assert_eq!(p.rental_price, Scalar::from("20"));
        assert_eq!(p.customer_prep, "power outlet");
    }

    #[test]
    fn missing_fields_get_placeholders_and_positions() {
        let rows = vec![
            row(json!({"Notes": "first"})),
            row(json!({})),
            row(json!({"Name": "Third"})),
        ];
        let products = normalize(&rows, &HeaderAliases::default());
        assert_eq!(products.len(), 3);
        for (i, p) in products.iter().enumerate() {
            assert_eq!(p.id, Scalar::from((i + 1) as u64));
            assert_eq!(p.price, Scalar::from(UNKNOWN_PRICE));
        }
        assert_eq!(products[0].name, UNKNOWN_NAME);
        assert_eq!(products[1].name, UNKNOWN_NAME);
        assert_eq!(products[2].name, "Third");
    }

    #[test]
    fn output_preserves_input_order() {
        let rows: Vec<Row> = (0..5)
            .map(|i| row(json!({"Name": format!("item-{}", i)})))
            .collect();
        let names: Vec<String> = normalize(&rows, &HeaderAliases::default())
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["item-0", "item-1", "item-2", "item-3", "item-4"]);
    }

    #[test]
    fn zero_price_is_kept() {
        let rows = vec![row(json!({"Name": "Free sample", "Price": 0}))];
        assert_eq!(
            normalize(&rows, &HeaderAliases::default())[0].price,
            Scalar::from(0u64)
        );
    }

    #[test]
    fn custom_alias_table_from_toml_keeps_other_defaults() {
        let aliases: HeaderAliases = toml_like(json!({"name": ["Product"]}));
        assert_eq!(aliases.name, vec!["Product".to_string()]);
        assert_eq!(aliases.price, HeaderAliases::default().price);

        let rows = vec![row(json!({"Product": "Lamp", "Name": "ignored"}))];
        assert_eq!(normalize(&rows, &aliases)[0].name, "Lamp");
    }

    fn toml_like(value: Value) -> HeaderAliases {
        serde_json::from_value(value).unwrap()
    }
}
