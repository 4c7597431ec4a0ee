//! # Nexus Catalog
//!
//! A local-first price-list catalog: import product rows from spreadsheet
//! exports, edit records by hand, and look products up by name or id.
//!
//! The domain logic (normalization, the catalog store, the match engine,
//! the session controller) lives in the `nexus-catalog-core` crate. This
//! crate adds the pieces that touch the outside world: configuration,
//! file decoding, a file-backed blob store, and the `nexus` CLI commands.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌───────────────┐
//! │ .xlsx/.json │──▶│   decode    │──▶│ Session (core)│
//! └─────────────┘   └─────────────┘   └──────┬────────┘
//!                                            │
//!                          ┌─────────────────┤
//!                          ▼                 ▼
//!                   ┌─────────────┐   ┌─────────────┐
//!                   │ CLI (nexus) │   │FileBlobStore│
//!                   └─────────────┘   └─────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`decode`] | Spreadsheet and JSON row decoding |
//! | [`blob_fs`] | File-backed blob store |
//! | [`storage`] | Opening the configured catalog |
//! | [`import`] | `nexus import` |
//! | [`show`] | `nexus list` and `nexus show` |
//! | [`search`] | `nexus search` |
//! | [`manage`] | `nexus add`, `edit` and `remove` |
//! | [`export`] | `nexus export` |
//! | [`stats`] | `nexus stats` |

pub mod blob_fs;
pub mod config;
pub mod decode;
pub mod export;
pub mod import;
pub mod logging;
pub mod manage;
pub mod render;
pub mod search;
pub mod show;
pub mod stats;
pub mod storage;
