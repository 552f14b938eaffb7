//! # ragline CLI
//!
//! ## Usage
//!
//! ```bash
//! ragline --config ./config/ragline.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ragline init` | Create the Qdrant collection if it is missing |
//! | `ragline chunk <file>` | Print the chunks of a file |
//! | `ragline ingest <paths>...` | Chunk, embed, and upsert files |
//! | `ragline search "<query>"` | Retrieve and rerank |
//! | `ragline count` | Number of points in the collection |
//! | `ragline drop` | Delete the collection |
//! | `ragline completions <shell>` | Print shell completions |
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`
//! (default `info`).

use std::io;
use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use ragline::collection::{run_count, run_drop, run_init};
use ragline::config;
use ragline::ingest::{run_chunk, run_ingest, IngestOptions};
use ragline::search::{run_search, SearchOptions};
use ragline::services::Services;
use ragline_core::models::Distance;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Sentence-aware chunking, embedding ingestion, and retrieve-then-rerank
/// search over Qdrant.
///
/// Settings come from a TOML file (see `config/ragline.example.toml`),
/// overridden by `QDRANT_*` and `RAGLINE_*` environment variables.
#[derive(Parser)]
#[command(
    name = "ragline",
    about = "Chunk, embed, and search text collections with Qdrant and a reranker",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/ragline.toml`. When the file is missing,
    /// built-in defaults plus environment overrides are used.
    #[arg(long, global = true, default_value = "./config/ragline.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the collection if it does not exist.
    ///
    /// Safe to run repeatedly.
    Init {
        /// Embedding dimension (defaults to `[store] vector_size`).
        #[arg(long)]
        vector_size: Option<usize>,

        /// Distance metric: cosine, dot, euclid, or manhattan.
        #[arg(long)]
        distance: Option<Distance>,
    },

    /// Print the chunks a file would produce, without calling any service.
    Chunk {
        /// Text file, optionally gzip-compressed.
        path: PathBuf,

        /// Chunk length threshold in characters.
        #[arg(long)]
        max_chars: Option<usize>,
    },

    /// Chunk, embed, and upsert files or directories.
    ///
    /// Directories are walked recursively and filtered by
    /// `[ingest] include_globs`.
    Ingest {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// First sequential point id.
        #[arg(long, default_value_t = 0)]
        start_id: u64,

        /// Chunks per embedding request.
        #[arg(long)]
        batch_size: Option<usize>,

        /// Chunk length threshold in characters.
        #[arg(long)]
        max_chars: Option<usize>,

        /// Derive point ids from chunk content, so re-ingesting the same
        /// text overwrites instead of duplicating.
        #[arg(long)]
        content_ids: bool,

        /// Log and skip batches the embedding service rejects instead of
        /// stopping.
        #[arg(long)]
        skip_failed: bool,
    },

    /// Retrieve nearest chunks for a query and rerank them.
    Search {
        query: String,

        /// Candidates fetched from the vector store.
        #[arg(long)]
        limit: Option<usize>,

        /// Results printed after reranking.
        #[arg(long)]
        top: Option<usize>,

        /// Also print results with a non-positive relevance score.
        #[arg(long)]
        all: bool,
    },

    /// Print the number of points in the collection.
    Count,

    /// Delete the collection and every point in it.
    Drop,

    /// Print shell completions to stdout.
    Completions { shell: Shell },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "ragline", &mut io::stdout());
        return Ok(());
    }

    let cfg = config::load_or_default(&cli.config)?;
    let services = Services::from_config(cfg)?;

    match cli.command {
        Commands::Init {
            vector_size,
            distance,
        } => {
            run_init(&services, vector_size, distance)?;
        }
        Commands::Chunk { path, max_chars } => {
            run_chunk(&services, &path, max_chars)?;
        }
        Commands::Ingest {
            paths,
            start_id,
            batch_size,
            max_chars,
            content_ids,
            skip_failed,
        } => {
            let opts = IngestOptions {
                start_id,
                batch_size,
                max_chars,
                content_ids,
                skip_failed,
            };
            run_ingest(&services, &paths, &opts)?;
        }
        Commands::Search {
            query,
            limit,
            top,
            all,
        } => {
            run_search(&services, &query, &SearchOptions { limit, top, all })?;
        }
        Commands::Count => {
            run_count(&services)?;
        }
        Commands::Drop => {
            run_drop(&services)?;
        }
        Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
