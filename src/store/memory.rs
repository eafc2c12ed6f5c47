//! In-memory [`VectorStore`] implementation for tests.
//!
//! Records live in a `HashMap` keyed by id behind `std::sync::RwLock`.
//! Query scoring is term overlap over lowercased chunk text — crude, but
//! enough to exercise retrieval and grouping paths without a real store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{ChunkRecord, QueryHit, StoredRecord};

use super::VectorStore;

#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, ChunkRecord>>,
    upsert_calls: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `upsert` calls received; lets tests assert that skipped
    /// files produce zero writes.
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn upsert(&self, records: &[ChunkRecord]) -> Result<()> {
        self.upsert_calls.fetch_add(1, Ordering::Relaxed);
        let mut stored = self.records.write().unwrap();
        for record in records {
            stored.insert(record.id.clone(), record.clone());
        }
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<StoredRecord>> {
        let stored = self.records.read().unwrap();
        let mut all: Vec<StoredRecord> = stored
            .values()
            .map(|r| StoredRecord {
                id: r.id.clone(),
                metadata: r.metadata.clone(),
            })
            .collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn query(&self, query_text: &str, n_results: usize) -> Result<Vec<QueryHit>> {
        let query_lower = query_text.to_lowercase();
        let terms: Vec<&str> = query_lower.split_whitespace().collect();
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let stored = self.records.read().unwrap();
        let mut scored: Vec<(usize, QueryHit)> = stored
            .values()
            .filter_map(|record| {
                let text_lower = record.text.to_lowercase();
                let matches = terms.iter().filter(|t| text_lower.contains(*t)).count();
                if matches > 0 {
                    Some((
                        matches,
                        QueryHit {
                            document: record.text.clone(),
                            metadata: record.metadata.clone(),
                        },
                    ))
                } else {
                    None
                }
            })
            .collect();

        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(n_results);
        Ok(scored.into_iter().map(|(_, hit)| hit).collect())
    }

    async fn delete_collection(&self) -> Result<()> {
        self.records.write().unwrap().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn record(id: &str, text: &str) -> ChunkRecord {
        ChunkRecord {
            id: id.to_string(),
            text: text.to_string(),
            metadata: Map::new(),
        }
    }

    #[tokio::test]
    async fn upsert_is_idempotent_by_id() {
        let store = MemoryStore::new();
        store.upsert(&[record("a::0", "first")]).await.unwrap();
        store.upsert(&[record("a::0", "updated")]).await.unwrap();
        assert_eq!(store.len(), 1);
        let hits = store.query("updated", 5).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn query_ranks_by_term_overlap() {
        let store = MemoryStore::new();
        store
            .upsert(&[
                record("a::0", "rust borrow checker"),
                record("b::0", "rust"),
                record("c::0", "python interpreter"),
            ])
            .await
            .unwrap();

        let hits = store.query("rust borrow", 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document, "rust borrow checker");
    }

    #[tokio::test]
    async fn delete_collection_clears_everything() {
        let store = MemoryStore::new();
        store.upsert(&[record("a::0", "text")]).await.unwrap();
        store.delete_collection().await.unwrap();
        assert!(store.is_empty());
        // Still usable afterwards.
        store.upsert(&[record("b::0", "more")]).await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn get_all_returns_sorted_ids() {
        let store = MemoryStore::new();
        store
            .upsert(&[record("b::0", "x"), record("a::0", "y")])
            .await
            .unwrap();
        let all = store.get_all().await.unwrap();
        let ids: Vec<&str> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a::0", "b::0"]);
    }
}
