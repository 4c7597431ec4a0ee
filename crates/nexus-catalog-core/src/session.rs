//! Session controller: routes presentation intents to the catalog.
//!
//! A [`Session`] owns the [`CatalogStore`] plus the small amount of view
//! state a front end needs (search dropdown, selected product, the record
//! under edit, load errors). It holds no rendering logic; a front end sends
//! [`Intent`]s and renders [`SessionState`] snapshots.

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::{CatalogStore, LoadReport, RecordHandle};
use crate::error::CatalogError;
use crate::form::{ProductDraft, ValidationError};
use crate::models::{Product, Row, Scalar};
use crate::normalize::{normalize, HeaderAliases};
use crate::search::{SearchParams, SearchState};
use crate::store::BlobStore;

/// User intents a front end forwards to the session.
#[derive(Debug, Clone)]
pub enum Intent {
    /// Rows already decoded from a tabular file.
    ImportBatch(Vec<Row>),
    /// Save the form; edits the record under edit, if any.
    Upsert(ProductDraft),
    BeginEdit(RecordHandle),
    CancelEdit,
    Remove(Scalar),
    Search(String),
    /// Pick the search candidate at this position.
    SelectResult(usize),
    ClearSearch,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("record is no longer in the catalog")]
    UnknownRecord,

    #[error("no search result at position {0}")]
    NoSuchResult(usize),
}

/// Snapshot of everything a front end renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub current_records: Vec<Product>,
    pub search_results: Vec<Product>,
    pub selected_product: Option<Product>,
    pub load_errors: Vec<String>,
}

pub struct Session<B> {
    store: CatalogStore<B>,
    aliases: HeaderAliases,
    params: SearchParams,
    search: SearchState,
    selected: Option<Product>,
    editing: Option<RecordHandle>,
    load_errors: Vec<String>,
    warnings: Vec<String>,
}

impl<B: BlobStore> Session<B> {
    /// Wrap `store` and load its snapshot. A corrupt snapshot is recorded
    /// in the load errors; the session starts with whatever the store held.
    pub async fn start(
        mut store: CatalogStore<B>,
        aliases: HeaderAliases,
        params: SearchParams,
    ) -> Result<Self, SessionError> {
        let report = store.load().await?;
        let mut load_errors = Vec::new();
        if let LoadReport::Corrupt(reason) = report {
            load_errors.push(format!("stored catalog is corrupt: {}", reason));
        }
        Ok(Self {
            store,
            aliases,
            params,
            search: SearchState::default(),
            selected: None,
            editing: None,
            load_errors,
            warnings: Vec::new(),
        })
    }

    /// Apply one intent.
    pub async fn dispatch(&mut self, intent: Intent) -> Result<(), SessionError> {
        match intent {
            Intent::ImportBatch(rows) => {
                self.import_rows(&rows).await?;
            }
            Intent::Upsert(draft) => {
                self.save(&draft).await?;
            }
            Intent::BeginEdit(handle) => {
                self.begin_edit(handle)?;
            }
            Intent::CancelEdit => self.cancel_edit(),
            Intent::Remove(id) => {
                self.remove(&id).await?;
            }
            Intent::Search(query) => {
                self.search(&query);
            }
            Intent::SelectResult(index) => {
                self.select_result(index)?;
            }
            Intent::ClearSearch => self.search.clear(),
        }
        Ok(())
    }

    /// Normalize decoded rows and prepend them. Returns the count added.
    pub async fn import_rows(&mut self, rows: &[Row]) -> Result<usize, SessionError> {
        let products = normalize(rows, &self.aliases);
        info!(rows = rows.len(), "importing batch");
        let result = self.store.import_batch(products).await;
        self.after_mutation(result)
    }

    /// Normalize decoded rows and make them the whole collection.
    pub async fn replace_rows(&mut self, rows: &[Row]) -> Result<usize, SessionError> {
        let products = normalize(rows, &self.aliases);
        let count = products.len();
        info!(rows = rows.len(), "replacing catalog");
        self.editing = None;
        self.selected = None;
        let result = self.store.replace_all(products).await.map(|()| count);
        self.after_mutation(result)
    }

    /// Validate and save a draft. With an edit in progress the edited
    /// record is replaced in place; otherwise the product is prepended.
    pub async fn save(&mut self, draft: &ProductDraft) -> Result<RecordHandle, SessionError> {
        let product = draft.validate()?;
        let editing = self.editing.take();
        let result = self.store.upsert(product, editing).await;
        self.after_mutation(result)
    }

    /// Start editing the record behind `handle`; returns a prefilled draft.
    pub fn begin_edit(&mut self, handle: RecordHandle) -> Result<ProductDraft, SessionError> {
        let product = self.store.get(handle).ok_or(SessionError::UnknownRecord)?;
        let draft = ProductDraft::from_product(product);
        self.editing = Some(handle);
        Ok(draft)
    }

    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Remove every record with this id. Returns how many were removed.
    pub async fn remove(&mut self, id: &Scalar) -> Result<usize, SessionError> {
        let result = self.store.remove(id).await;
        if self
            .selected
            .as_ref()
            .is_some_and(|p| p.id.same_text(id))
        {
            self.selected = None;
        }
        self.after_mutation(result)
    }

    /// Run a query and return the candidates.
    pub fn search(&mut self, query: &str) -> &[Product] {
        self.search.update(self.store.products(), query, &self.params);
        &self.search.results
    }

    /// Select the search candidate at `index`.
    pub fn select_result(&mut self, index: usize) -> Result<&Product, SessionError> {
        let product = self
            .search
            .select(index)
            .ok_or(SessionError::NoSuchResult(index))?;
        Ok(&*self.selected.insert(product))
    }

    /// Re-attempt a failed catalog write.
    pub async fn flush(&mut self) -> Result<(), SessionError> {
        self.store.flush().await?;
        Ok(())
    }

    fn after_mutation<T>(&mut self, result: Result<T, CatalogError>) -> Result<T, SessionError> {
        self.search.refresh(self.store.products(), &self.params);
        if let Err(e) = &result {
            if e.is_unsaved_change() {
                warn!(error = %e, "catalog changed but not saved");
                self.warnings.push(e.to_string());
            }
        }
        result.map_err(SessionError::from)
    }
}

impl<B> Session<B> {
    pub fn store(&self) -> &CatalogStore<B> {
        &self.store
    }

    pub fn search_state(&self) -> &SearchState {
        &self.search
    }

    pub fn selected(&self) -> Option<&Product> {
        self.selected.as_ref()
    }

    pub fn editing(&self) -> Option<RecordHandle> {
        self.editing
    }

    pub fn load_errors(&self) -> &[String] {
        &self.load_errors
    }

    /// Unsaved-change warnings accumulated during this session.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn state(&self) -> SessionState {
        SessionState {
            current_records: self.store.to_vec(),
            search_results: self.search.results.clone(),
            selected_product: self.selected.clone(),
            load_errors: self.load_errors.clone(),
        }
    }
}
