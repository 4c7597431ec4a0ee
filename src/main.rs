//! # Nexus Catalog CLI (`nexus`)
//!
//! ## Usage
//!
//! ```bash
//! nexus --config ./config/nexus.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `nexus import <file>` | Add rows from an `.xlsx`/`.xlsm`/`.json` file |
//! | `nexus list` | List every product, newest first |
//! | `nexus search "<query>"` | Match by name (any case) or id |
//! | `nexus show <id>` | Show one product in full |
//! | `nexus add --name .. --price ..` | Add a product by hand |
//! | `nexus edit <id> [flags]` | Change fields of an existing product |
//! | `nexus remove <id>` | Delete every product with that id |
//! | `nexus export` | Dump the catalog as JSON |
//! | `nexus stats` | Counts and field coverage |
//!
//! ## Examples
//!
//! ```bash
//! # Import the price list exported from the office spreadsheet
//! nexus import ./price-list.xlsx
//!
//! # Start over from a fresh export
//! nexus import ./price-list.xlsx --replace
//!
//! # Look up a product while on the phone with a customer
//! nexus search tent
//! nexus show 12
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use nexus_catalog::manage::FieldArgs;
use nexus_catalog::{config, export, import, logging, manage, search, show, stats};

/// Nexus Catalog CLI: a local-first price-list catalog.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/nexus.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "nexus",
    about = "Nexus Catalog: import, edit and look up price-list products",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/nexus.toml`. When the file does not exist the
    /// built-in defaults are used and data is kept in `./data`.
    #[arg(long, global = true, default_value = "./config/nexus.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import product rows from a spreadsheet or JSON file.
    ///
    /// The first worksheet is read; its first non-empty row is the header.
    /// Header names are mapped to product fields via `[aliases]`. New rows
    /// are placed before the existing ones.
    Import {
        /// `.xlsx`, `.xlsm` or `.json` (array of row objects).
        file: PathBuf,

        /// Replace the whole catalog instead of prepending.
        #[arg(long)]
        replace: bool,

        /// Decode and normalize only; print counts without saving.
        #[arg(long)]
        dry_run: bool,
    },

    /// List all products, most recently added first.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Search products by name (case-insensitive) or id.
    Search {
        query: String,

        /// Maximum number of candidates (defaults to `[search].capacity`).
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long)]
        json: bool,
    },

    /// Show every field of one product.
    Show {
        id: String,

        /// Which record to show when several share the id (1-based).
        #[arg(long, default_value_t = 1)]
        nth: usize,

        #[arg(long)]
        json: bool,
    },

    /// Add a product by hand. Name and price are required.
    Add {
        /// Product id; defaults to the last six digits of the current
        /// time in milliseconds.
        #[arg(long)]
        id: Option<String>,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Edit an existing product in place.
    Edit {
        id: String,

        /// Which record to edit when several share the id (1-based).
        #[arg(long, default_value_t = 1)]
        nth: usize,

        /// Give the product a new id.
        #[arg(long)]
        new_id: Option<String>,

        #[command(flatten)]
        fields: FieldArgs,
    },

    /// Remove every product with the given id.
    Remove { id: String },

    /// Export the catalog as JSON.
    Export {
        /// Output file path. Defaults to stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show catalog statistics.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_or_default(&cli.config)?;
    logging::init(&cfg.logging.level);

    match cli.command {
        Commands::Import {
            file,
            replace,
            dry_run,
        } => {
            import::run_import(&cfg, &file, replace, dry_run).await?;
        }
        Commands::List { json } => {
            show::run_list(&cfg, json).await?;
        }
        Commands::Search { query, limit, json } => {
            search::run_search(&cfg, &query, limit, json).await?;
        }
        Commands::Show { id, nth, json } => {
            show::run_show(&cfg, &id, nth, json).await?;
        }
        Commands::Add { id, fields } => {
            manage::run_add(&cfg, id, &fields).await?;
        }
        Commands::Edit {
            id,
            nth,
            new_id,
            fields,
        } => {
            manage::run_edit(&cfg, &id, nth, new_id, &fields).await?;
        }
        Commands::Remove { id } => {
            manage::run_remove(&cfg, &id).await?;
        }
        Commands::Export { output } => {
            export::run_export(&cfg, output.as_deref()).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
