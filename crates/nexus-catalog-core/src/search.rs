//! Query matching over the current product collection.
//!
//! A query matches a product when it is a case-insensitive substring of
//! the product name, or a (case-sensitive) substring of the id's string
//! form. Matches keep collection order and are cut at a hard capacity;
//! there is no ranking and no cursor past the cap.
//!
//! Every call rescans the full collection. That is linear in catalog size
//! and fine for price-list sized data; a large corpus would want an index,
//! but one that preserved collection order.

use serde::Serialize;

use crate::models::Product;

/// Maximum number of candidates a query returns.
pub const SEARCH_CAPACITY: usize = 8;

/// Match-engine tuning, decoupled from application config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchParams {
    /// Hard cap on returned candidates.
    pub capacity: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            capacity: SEARCH_CAPACITY,
        }
    }
}

/// Search with the default capacity of [`SEARCH_CAPACITY`].
pub fn search<'a, I>(records: I, query: &str) -> Vec<&'a Product>
where
    I: IntoIterator<Item = &'a Product>,
{
    search_with(records, query, &SearchParams::default())
}

/// Filter `records` by `query`, keeping order, truncated to
/// `params.capacity`. A blank query yields nothing.
pub fn search_with<'a, I>(records: I, query: &str, params: &SearchParams) -> Vec<&'a Product>
where
    I: IntoIterator<Item = &'a Product>,
{
    if query.trim().is_empty() {
        return Vec::new();
    }
    let query_lower = query.to_lowercase();
    records
        .into_iter()
        .filter(|p| p.name.to_lowercase().contains(&query_lower) || p.id.to_string().contains(query))
        .take(params.capacity)
        .collect()
}

/// Dropdown state for an interactive search box.
///
/// The dropdown is open exactly while the query is non-blank. Selecting a
/// candidate copies its name into the query and closes the dropdown.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchState {
    pub query: String,
    pub results: Vec<Product>,
    pub is_open: bool,
}

impl SearchState {
    /// Set the query and recompute results.
    pub fn update<'a, I>(&mut self, records: I, query: &str, params: &SearchParams)
    where
        I: IntoIterator<Item = &'a Product>,
    {
        self.query = query.to_string();
        self.refresh(records, params);
    }

    /// Recompute results for the current query (after the records changed).
    pub fn refresh<'a, I>(&mut self, records: I, params: &SearchParams)
    where
        I: IntoIterator<Item = &'a Product>,
    {
        if self.query.trim().is_empty() {
            self.results.clear();
            self.is_open = false;
            return;
        }
        self.results = search_with(records, &self.query, params)
            .into_iter()
            .cloned()
            .collect();
        self.is_open = true;
    }

    /// Pick the candidate at `index`; the query becomes its name.
    pub fn select(&mut self, index: usize) -> Option<Product> {
        let product = self.results.get(index)?.clone();
        self.query = product.name.clone();
        self.is_open = false;
        Some(product)
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.results.clear();
        self.is_open = false;
    }
}
