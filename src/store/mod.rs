//! Vector store abstraction.
//!
//! The [`VectorStore`] trait covers the four operations the pipeline needs
//! from its document store, enabling pluggable backends: the HTTP-backed
//! [`chroma::ChromaStore`] for real runs and [`memory::MemoryStore`] as a
//! substitutable in-memory fake for tests. Store handles are passed in
//! explicitly — there is no process-wide client or collection state.

pub mod chroma;
pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{ChunkRecord, QueryHit, StoredRecord};

/// Abstract document/vector store.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`upsert`](VectorStore::upsert) | Insert-or-update records by id |
/// | [`get_all`](VectorStore::get_all) | Read back ids + metadata (refresh mode) |
/// | [`query`](VectorStore::query) | Ranked retrieval for a query text |
/// | [`delete_collection`](VectorStore::delete_collection) | Drop and recreate the collection |
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Upsert a batch of chunk records. Idempotent by record id; all
    /// records of one call either land together or the call errors.
    async fn upsert(&self, records: &[ChunkRecord]) -> Result<()>;

    /// Every stored record's id and metadata (documents omitted).
    async fn get_all(&self) -> Result<Vec<StoredRecord>>;

    /// Ranked results for `query_text`, at most `n_results`.
    async fn query(&self, query_text: &str, n_results: usize) -> Result<Vec<QueryHit>>;

    /// Delete the backing collection, ignoring not-found, leaving an empty
    /// collection ready for new upserts.
    async fn delete_collection(&self) -> Result<()>;
}
