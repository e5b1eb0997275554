//! # Incident Atlas CLI (`atlas`)
//!
//! The `atlas` binary is the primary interface for Incident Atlas. It
//! provides one-shot pipeline commands and starts the HTTP server.
//!
//! ## Usage
//!
//! ```bash
//! atlas --config ./config/atlas.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `atlas visualize <batch-id>` | Build a batch's features and print the GeoJSON |
//! | `atlas search <batch-id> "<query>"` | Semantic search over a batch |
//! | `atlas render <batch-id>` | Write an interactive HTML map |
//! | `atlas serve` | Start the JSON HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # Print the feature collection for the mock dataset
//! atlas visualize demo-batch --config ./config/atlas.toml
//!
//! # Only braking events
//! atlas visualize demo-batch --filter braking
//!
//! # Semantic search (requires an embedding provider in config)
//! atlas search demo-batch "pedestrian near crosswalk"
//!
//! # Render the interactive map
//! atlas render demo-batch --out map.html
//!
//! # Start the server for the browser client
//! atlas serve --config ./config/atlas.toml
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use incident_atlas::{config, ingest, render, search, server, store::BatchStore};

/// Incident Atlas — visualize and semantically search traffic-incident
/// analysis batches.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/atlas.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "atlas",
    about = "Incident Atlas — visualize and semantically search traffic-incident analysis batches",
    version,
    long_about = "Incident Atlas fetches traffic-incident analysis batches from the NomadicML API \
    (or an equivalent mock CSV dataset), normalizes them into GeoJSON features, and answers \
    free-text semantic-search queries via sentence-embedding similarity. A companion renderer \
    produces an interactive HTML map of the same data."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/atlas.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Build a batch's feature collection and print it as GeoJSON.
    ///
    /// Reads the configured source (CSV or vendor API), normalizes events
    /// into features, and prints the FeatureCollection to stdout. Row and
    /// skip counts go to stderr so stdout stays valid JSON.
    Visualize {
        /// Batch identifier.
        batch_id: String,

        /// Case-insensitive label substring filter (`all` means no filter).
        #[arg(long)]
        filter: Option<String>,
    },

    /// Semantic search over a batch.
    ///
    /// Runs the pipeline for the batch, embeds the query, and prints the
    /// matching feature ids ordered by descending similarity. Requires an
    /// embedding provider to be configured.
    Search {
        /// Batch identifier.
        batch_id: String,

        /// The free-text query.
        query: String,

        /// Case-insensitive label substring filter applied before search.
        #[arg(long)]
        filter: Option<String>,
    },

    /// Render a batch as an interactive HTML map.
    ///
    /// Runs the pipeline for the batch and writes a self-contained Leaflet
    /// page with severity-colored markers, event paths, and video popups.
    Render {
        /// Batch identifier.
        batch_id: String,

        /// Case-insensitive label substring filter.
        #[arg(long)]
        filter: Option<String>,

        /// Output file for the HTML page.
        #[arg(long, default_value = "map.html")]
        out: PathBuf,
    },

    /// Start the JSON HTTP server.
    ///
    /// Binds to the address configured in `[server].bind` and serves the
    /// visualize/search/video-url API plus the static browser client.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Visualize { batch_id, filter } => {
            let store = BatchStore::new();
            let outcome =
                ingest::run_visualize(&cfg, &store, &batch_id, filter.as_deref()).await?;

            eprintln!("visualize {}", batch_id);
            eprintln!("  features: {}", outcome.collection.features.len());
            eprintln!("  skipped rows: {}", outcome.skipped);
            if cfg.embedding.is_enabled() {
                eprintln!("  embedded: {}", outcome.embedded);
            }

            println!("{}", serde_json::to_string_pretty(&outcome.collection)?);
        }
        Commands::Search {
            batch_id,
            query,
            filter,
        } => {
            let store = BatchStore::new();
            ingest::run_visualize(&cfg, &store, &batch_id, filter.as_deref()).await?;
            let matching_ids = search::search_batch(&cfg, &store, &batch_id, &query).await?;

            if matching_ids.is_empty() {
                println!("No matches.");
            } else {
                for id in &matching_ids {
                    println!("{}", id);
                }
            }
        }
        Commands::Render {
            batch_id,
            filter,
            out,
        } => {
            let store = BatchStore::new();
            let outcome =
                ingest::run_visualize(&cfg, &store, &batch_id, filter.as_deref()).await?;
            let html = render::render_map(&batch_id, &outcome.collection);
            std::fs::write(&out, html)?;

            println!("render {}", batch_id);
            println!("  features: {}", outcome.collection.features.len());
            println!("  wrote: {}", out.display());
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}
