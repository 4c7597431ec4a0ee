//! # Nexus Catalog Core
//!
//! Shared, runtime-agnostic logic for Nexus Catalog: the product model,
//! header normalization, the blob-store port, the catalog store, the
//! match engine, manual-entry validation, and the session controller.
//!
//! This crate performs no filesystem I/O and pulls in no async runtime.
//! Persistence goes through the [`store::BlobStore`] trait; the
//! application crate supplies a file-backed implementation.
//!
//! ## Data flow
//!
//! ```text
//! rows ──▶ normalize ──▶ CatalogStore::import_batch ──▶ BlobStore::set
//!                              │
//!               query ──▶ search ──▶ candidates (≤ 8)
//! ```

pub mod catalog;
pub mod error;
pub mod form;
pub mod models;
pub mod normalize;
pub mod search;
pub mod session;
pub mod store;

pub use catalog::{CatalogStore, Entry, LoadReport, RecordHandle, DEFAULT_CATALOG_KEY};
pub use error::CatalogError;
pub use form::{ProductDraft, ValidationError};
pub use models::{Product, Row, Scalar};
pub use normalize::{normalize, HeaderAliases, ProductField};
pub use search::{search, SearchParams, SearchState, SEARCH_CAPACITY};
pub use session::{Intent, Session, SessionError, SessionState};
pub use store::{BlobError, BlobStore};
