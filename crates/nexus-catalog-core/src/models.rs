//! Core data models used throughout Nexus Catalog.
//!
//! A [`Product`] is the canonical catalog record. Every downstream
//! component (store, match engine, renderers) depends only on this shape,
//! never on the headers of the file a record was imported from.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One decoded tabular row: header → cell value.
pub type Row = serde_json::Map<String, Value>;

/// A value that may be either free text or a number.
///
/// Ids and prices arrive from spreadsheets as whichever type the cell had,
/// and are stored exactly as given. No currency or locale parsing happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    /// Convert an arbitrary JSON value. `null` becomes empty text.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => Scalar::Number(n.clone()),
            Value::String(s) => Scalar::Text(s.clone()),
            other => Scalar::Text(value_text(other)),
        }
    }

    /// True for text that is empty after trimming. Numbers are never blank.
    pub fn is_blank(&self) -> bool {
        match self {
            Scalar::Number(_) => false,
            Scalar::Text(s) => s.trim().is_empty(),
        }
    }

    /// Compare by string form, so `1` and `"1"` name the same record.
    pub fn same_text(&self, other: &Scalar) -> bool {
        match (self, other) {
            (Scalar::Text(a), Scalar::Text(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl Default for Scalar {
    fn default() -> Self {
        Scalar::Text(String::new())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

impl From<u64> for Scalar {
    fn from(n: u64) -> Self {
        Scalar::Number(n.into())
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Number(n.into())
    }
}

/// Canonical product record.
///
/// Serialized with camelCase keys; snapshots written by earlier versions of
/// the catalog (including ones with `null` or missing optional fields) load
/// unchanged. Missing optional text is always `""`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(deserialize_with = "lenient_scalar")]
    pub id: Scalar,
    #[serde(deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(deserialize_with = "lenient_scalar")]
    pub price: Scalar,
    #[serde(default, deserialize_with = "lenient_scalar")]
    pub rental_price: Scalar,
    #[serde(default, deserialize_with = "lenient_text")]
    pub shipping_list: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub notes: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub image_url: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub parameters: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub lead_time: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub customer_prep: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub case_reference: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub applicable_occasions: String,
}

impl Product {
    /// A product with the required fields set and every optional field empty.
    pub fn new(id: impl Into<Scalar>, name: impl Into<String>, price: impl Into<Scalar>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price: price.into(),
            rental_price: Scalar::default(),
            shipping_list: String::new(),
            notes: String::new(),
            image_url: String::new(),
            parameters: String::new(),
            lead_time: String::new(),
            customer_prep: String::new(),
            case_reference: String::new(),
            applicable_occasions: String::new(),
        }
    }

    /// Well-formed for persistence iff `name` and `price` are both non-empty.
    pub fn is_well_formed(&self) -> bool {
        !self.name.trim().is_empty() && !self.price.is_blank()
    }

    /// Rental price as shown to an operator; empty means "not applicable".
    pub fn rental_price_display(&self) -> String {
        if self.rental_price.is_blank() {
            "N/A".to_string()
        } else {
            self.rental_price.to_string()
        }
    }

    /// Image URL, if one is set.
    pub fn image(&self) -> Option<&str> {
        let url = self.image_url.trim();
        (!url.is_empty()).then_some(url)
    }
}

/// String form of a cell value: text as-is, numbers and booleans via
/// their JSON spelling, `null` as empty, containers as JSON text.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_text(&value))
}

fn lenient_scalar<'de, D>(deserializer: D) -> Result<Scalar, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(Scalar::from_value(&value))
}
