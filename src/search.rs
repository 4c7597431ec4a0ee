//! `nexus search`: the match engine from the command line.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::render;
use crate::storage;

/// Run a query and print the candidates. `limit` overrides the configured
/// capacity for this call only.
pub async fn run_search(config: &Config, query: &str, limit: Option<usize>, json: bool) -> Result<()> {
    let mut config = config.clone();
    if let Some(limit) = limit {
        if limit < 1 {
            bail!("--limit must be >= 1");
        }
        config.search.capacity = limit;
    }

    let mut session = storage::open_session(&config).await?;
    let results = session.search(query);

    if json {
        return render::print_json(results);
    }
    if results.is_empty() {
        println!("No results.");
        return Ok(());
    }
    render::print_table(results);
    Ok(())
}
