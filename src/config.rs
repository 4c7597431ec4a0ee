//! TOML configuration parsing and validation.
//!
//! Every section is optional; a missing config file is replaced by
//! [`Config::minimal`] so the CLI works out of the box against `./data`.

use anyhow::{bail, Context, Result};
use nexus_catalog_core::{HeaderAliases, SearchParams, DEFAULT_CATALOG_KEY, SEARCH_CAPACITY};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub aliases: HeaderAliases,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_key")]
    pub key: String,
    /// Byte budget for the data directory; unlimited when absent.
    #[serde(default)]
    pub quota_bytes: Option<usize>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            key: default_key(),
            quota_bytes: None,
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}
fn default_key() -> String {
    DEFAULT_CATALOG_KEY.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> usize {
    SEARCH_CAPACITY
}

impl SearchConfig {
    pub fn params(&self) -> SearchParams {
        SearchParams {
            capacity: self.capacity,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    /// Rows beyond this count are ignored by the decoder.
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            max_rows: default_max_rows(),
        }
    }
}

fn default_max_rows() -> usize {
    100_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Defaults for every section; used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

/// Load `path` if it exists, otherwise fall back to [`Config::minimal`].
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(Config::minimal())
    }
}

fn validate(config: &Config) -> Result<()> {
    if config.storage.key.trim().is_empty() {
        bail!("storage.key must not be empty");
    }

    if config.storage.quota_bytes == Some(0) {
        bail!("storage.quota_bytes must be > 0 when set");
    }

    if config.search.capacity < 1 {
        bail!("search.capacity must be >= 1");
    }

    if config.import.max_rows < 1 {
        bail!("import.max_rows must be >= 1");
    }

    for field in nexus_catalog_core::ProductField::ALL {
        if config
            .aliases
            .for_field(field)
            .iter()
            .any(|alias| alias.trim().is_empty())
        {
            bail!("[aliases] for field '{}' contains an empty header name", field.key());
        }
    }

    Ok(())
}
