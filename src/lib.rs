//! # Quarry
//!
//! Document chunking and incremental ingestion for a Chroma-style vector
//! store.
//!
//! Quarry walks a folder of heterogeneous documents (plain text, Markdown,
//! code, PDF, DOCX), splits each into bounded-size chunks under a choice of
//! strategies, and upserts the chunks — with full provenance metadata and a
//! content checksum — into a vector store so a retrieval system can answer
//! queries with relevant passages grouped by source file.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌─────────────┐   ┌───────────┐
//! │ Discovery  │──▶│  Extraction   │──▶│  Chunking    │──▶│  Store     │
//! │ + ignores  │   │ txt/md/pdf/.. │   │ 5 strategies │   │ (HTTP)    │
//! └────────────┘   └──────────────┘   └─────────────┘   └─────┬─────┘
//!        │                  │                                  │
//!        └── fingerprints ──┘                  ┌───────────────┤
//!                                              ▼               ▼
//!                                         ┌──────────┐   ┌──────────┐
//!                                         │   CLI    │   │   HTTP   │
//!                                         │ (quarry) │   │  (MCP)   │
//!                                         └──────────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! quarry chunk notes.md --strategy recursive --chunk-size 200
//! quarry rag ./docs --collection brain --strategy recursive
//! quarry rag ./docs --refresh            # only reprocess changed files
//! quarry query "deployment checklist" -n 5
//! quarry serve                           # MCP-style HTTP tool server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`models`] | Core data types |
//! | [`extract`] | Multi-format text extraction |
//! | [`chunk`] | Chunking strategy engine |
//! | [`semantic`] | Embedding-distance topic segmentation |
//! | [`ignore_rules`] | Gitignore-style exclusion rules |
//! | [`discover`] | File discovery by extension |
//! | [`fingerprint`] | Content checksums and change detection |
//! | [`ingest`] | Ingestion pipeline orchestration |
//! | [`embedding`] | Embedding provider abstraction |
//! | [`store`] | Vector store trait, HTTP client, in-memory fake |
//! | [`query`] | Grouped query output |
//! | [`server`] | MCP-compatible HTTP server |
//! | [`progress`] | Stderr progress reporting |

pub mod chunk;
pub mod config;
pub mod discover;
pub mod embedding;
pub mod extract;
pub mod fingerprint;
pub mod ignore_rules;
pub mod ingest;
pub mod models;
pub mod progress;
pub mod query;
pub mod semantic;
pub mod server;
pub mod store;
