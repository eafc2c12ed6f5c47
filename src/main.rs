//! # Quarry CLI
//!
//! The `quarry` binary ingests documents into a Chroma-style vector store
//! and queries them back, grouped by source file.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `quarry chunk <file>` | Split one file and print the chunks |
//! | `quarry rag <folder>` | Run the full ingestion pipeline over a folder |
//! | `quarry query <text>` | Query the store and print grouped passages |
//! | `quarry serve` | Start the MCP-compatible HTTP server |
//!
//! ## Examples
//!
//! ```bash
//! # Inspect how a file would be chunked
//! quarry chunk notes.md --strategy recursive --chunk-size 200
//!
//! # Ingest a docs tree, skipping unchanged files
//! quarry rag ./docs --collection brain --refresh
//!
//! # Wipe and re-ingest from scratch
//! quarry rag ./docs --clean
//!
//! # Ask the knowledge base
//! quarry query "error handling conventions" -n 5
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use quarry::chunk::{SplitParams, Strategy, TextSplitter};
use quarry::config::{self, Config};
use quarry::embedding::create_embedder;
use quarry::extract::extract;
use quarry::ingest::{run_ingest, IngestOptions};
use quarry::progress::ProgressMode;
use quarry::query::run_query;
use quarry::server::run_server;
use quarry::store::chroma::ChromaStore;

/// Quarry — document chunking and incremental RAG ingestion.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file; flags override the file, and built-in defaults apply when the file
/// is absent. See `config/quarry.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "quarry",
    about = "Document chunking and incremental ingestion for a Chroma-style vector store",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/quarry.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split one file and print its chunks to stdout.
    Chunk {
        /// File to chunk.
        file: PathBuf,

        /// Chunking strategy: character, endline, recursive, markdown, or semantic.
        #[arg(long)]
        strategy: Option<String>,

        /// Target chunk length in characters.
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Trailing characters duplicated at the start of the next chunk.
        #[arg(long)]
        chunk_overlap: Option<usize>,

        /// Trim leading/trailing whitespace from each chunk.
        #[arg(long)]
        strip_whitespace: bool,
    },

    /// Discover, chunk, and upsert every eligible file under a folder.
    Rag {
        /// Folder to ingest.
        folder: PathBuf,

        /// Target collection name in the store.
        #[arg(long)]
        collection: Option<String>,

        /// Chunking strategy: character, endline, recursive, markdown, or semantic.
        #[arg(long)]
        strategy: Option<String>,

        /// Target chunk length in characters.
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Trailing characters duplicated at the start of the next chunk.
        #[arg(long)]
        chunk_overlap: Option<usize>,

        /// Trim leading/trailing whitespace from each chunk.
        #[arg(long)]
        strip_whitespace: bool,

        /// Comma-separated file extensions to ingest (e.g. `.md,.txt,.pdf`).
        #[arg(long, value_delimiter = ',')]
        extensions: Vec<String>,

        /// Delete the collection before ingesting.
        #[arg(long)]
        clean: bool,

        /// Skip files whose stored checksum is unchanged.
        #[arg(long)]
        refresh: bool,

        /// Progress output: auto, off, human, or json.
        #[arg(long, default_value = "auto")]
        progress: String,
    },

    /// Query the store and print passages grouped by source file.
    Query {
        /// The query text.
        query: String,

        /// Collection name in the store.
        #[arg(long)]
        collection: Option<String>,

        /// Number of results to return.
        #[arg(short = 'n', long, default_value_t = 3)]
        results: usize,
    },

    /// Start the MCP-compatible HTTP server.
    Serve {
        /// Collection name in the store.
        #[arg(long)]
        collection: Option<String>,
    },
}

/// Resolve the splitter from config + CLI overrides. The semantic strategy
/// pulls its embedding provider from config here, once.
fn build_splitter(
    cfg: &Config,
    strategy: Option<&str>,
    chunk_size: Option<usize>,
    chunk_overlap: Option<usize>,
    strip_whitespace: bool,
) -> Result<TextSplitter> {
    let strategy = Strategy::from_str(strategy.unwrap_or(&cfg.chunking.strategy))?;
    let params = SplitParams {
        chunk_size: chunk_size.unwrap_or(cfg.chunking.chunk_size),
        chunk_overlap: chunk_overlap.unwrap_or(cfg.chunking.chunk_overlap),
        strip_whitespace: strip_whitespace || cfg.chunking.strip_whitespace,
    };

    if strategy == Strategy::Semantic {
        if !cfg.embedding.is_enabled() {
            anyhow::bail!(
                "The semantic strategy requires an embedding provider; \
                 set [embedding] provider in the config file"
            );
        }
        let embedder = create_embedder(&cfg.embedding)?;
        TextSplitter::semantic(params, embedder, cfg.chunking.breakpoint_percentile)
    } else {
        TextSplitter::new(strategy, params)
    }
}

fn load_or_default_config(path: &PathBuf) -> Result<Config> {
    if path.exists() {
        config::load_config(path)
    } else {
        Ok(Config::minimal())
    }
}

fn parse_progress(mode: &str) -> Result<ProgressMode> {
    match mode {
        "auto" => Ok(ProgressMode::default_for_tty()),
        "off" => Ok(ProgressMode::Off),
        "human" => Ok(ProgressMode::Human),
        "json" => Ok(ProgressMode::Json),
        other => anyhow::bail!("Unknown progress mode: {}. Use auto, off, human, or json.", other),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = load_or_default_config(&cli.config)?;

    match cli.command {
        Commands::Chunk {
            file,
            strategy,
            chunk_size,
            chunk_overlap,
            strip_whitespace,
        } => {
            let splitter = build_splitter(
                &cfg,
                strategy.as_deref(),
                chunk_size,
                chunk_overlap,
                strip_whitespace,
            )?;
            let document = extract(&file)?;
            let chunks = splitter.split(&document.raw_text).await?;
            for chunk in chunks {
                println!("{}", chunk);
                println!("-----");
            }
        }

        Commands::Rag {
            folder,
            collection,
            strategy,
            chunk_size,
            chunk_overlap,
            strip_whitespace,
            extensions,
            clean,
            refresh,
            progress,
        } => {
            let splitter = build_splitter(
                &cfg,
                strategy.as_deref(),
                chunk_size,
                chunk_overlap,
                strip_whitespace,
            )?;
            let reporter = parse_progress(&progress)?.reporter();

            let collection = collection.unwrap_or_else(|| cfg.store.collection.clone());
            let store = ChromaStore::connect(&cfg.store.url, &collection).await?;

            let extensions = if extensions.is_empty() {
                cfg.discovery.extensions.clone()
            } else {
                extensions
            };
            let opts = IngestOptions {
                root: folder.clone(),
                extensions,
                exclude_globs: cfg.discovery.exclude_globs.clone(),
                clean,
                refresh,
            };

            let report = run_ingest(&store, &splitter, &opts, reporter.as_ref()).await?;

            println!("rag {}", folder.display());
            println!("  files processed: {}", report.files_processed);
            println!("  chunks emitted: {}", report.chunks_emitted);
            for (path, reason) in &report.skipped {
                println!("  skipped {}: {}", path, reason);
            }
            println!("ok");
        }

        Commands::Query {
            query,
            collection,
            results,
        } => {
            let collection = collection.unwrap_or_else(|| cfg.store.collection.clone());
            let store = ChromaStore::connect(&cfg.store.url, &collection).await?;
            run_query(&store, &query, results).await?;
        }

        Commands::Serve { collection } => {
            let collection = collection.unwrap_or_else(|| cfg.store.collection.clone());
            let store = ChromaStore::connect(&cfg.store.url, &collection).await?;
            run_server(&cfg, Arc::new(store)).await?;
        }
    }

    Ok(())
}
