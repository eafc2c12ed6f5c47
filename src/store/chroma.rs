//! HTTP client for a Chroma-style vector store.
//!
//! Talks to the store's v1 REST API. The store owns indexing, similarity
//! search, and query-side embedding; this client only moves records and
//! queries across the wire. Connecting resolves (or creates) the target
//! collection — a failure there is fatal to the caller before any file is
//! processed.

use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;

use crate::models::{ChunkRecord, QueryHit, StoredRecord};

use super::VectorStore;

pub struct ChromaStore {
    client: reqwest::Client,
    base_url: String,
    collection: String,
    /// Collection uuid, refreshed after `delete_collection` recreates it.
    collection_id: Mutex<String>,
}

impl ChromaStore {
    /// Connect to the store and get-or-create the collection.
    pub async fn connect(base_url: &str, collection: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let id = get_or_create_collection(&client, &base_url, collection)
            .await
            .with_context(|| {
                format!(
                    "failed to connect to vector store at {} (collection '{}')",
                    base_url, collection
                )
            })?;

        Ok(Self {
            client,
            base_url,
            collection: collection.to_string(),
            collection_id: Mutex::new(id),
        })
    }

    fn collection_id(&self) -> String {
        self.collection_id.lock().unwrap().clone()
    }

    fn collection_url(&self, suffix: &str) -> String {
        format!(
            "{}/api/v1/collections/{}/{}",
            self.base_url,
            self.collection_id(),
            suffix
        )
    }
}

async fn get_or_create_collection(
    client: &reqwest::Client,
    base_url: &str,
    collection: &str,
) -> Result<String> {
    let response = client
        .post(format!("{}/api/v1/collections", base_url))
        .json(&serde_json::json!({ "name": collection, "get_or_create": true }))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        bail!("store returned {}: {}", status, body);
    }

    let json: Value = response.json().await?;
    json.get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("store response missing collection id"))
}

fn metadata_map(value: Option<&Value>) -> serde_json::Map<String, Value> {
    value
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

#[async_trait]
impl VectorStore for ChromaStore {
    async fn upsert(&self, records: &[ChunkRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        let documents: Vec<&str> = records.iter().map(|r| r.text.as_str()).collect();
        let metadatas: Vec<&serde_json::Map<String, Value>> =
            records.iter().map(|r| &r.metadata).collect();

        let response = self
            .client
            .post(self.collection_url("upsert"))
            .json(&serde_json::json!({
                "ids": ids,
                "documents": documents,
                "metadatas": metadatas,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("upsert failed with {}: {}", status, body);
        }
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<StoredRecord>> {
        let response = self
            .client
            .post(self.collection_url("get"))
            .json(&serde_json::json!({ "include": ["metadatas"] }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("get failed with {}: {}", status, body);
        }

        let json: Value = response.json().await?;
        let ids = json
            .get("ids")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("store response missing ids array"))?;
        let empty = Vec::new();
        let metadatas = json
            .get("metadatas")
            .and_then(Value::as_array)
            .unwrap_or(&empty);

        Ok(ids
            .iter()
            .enumerate()
            .filter_map(|(i, id)| {
                id.as_str().map(|id| StoredRecord {
                    id: id.to_string(),
                    metadata: metadata_map(metadatas.get(i)),
                })
            })
            .collect())
    }

    async fn query(&self, query_text: &str, n_results: usize) -> Result<Vec<QueryHit>> {
        let response = self
            .client
            .post(self.collection_url("query"))
            .json(&serde_json::json!({
                "query_texts": [query_text],
                "n_results": n_results,
                "include": ["documents", "metadatas"],
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("query failed with {}: {}", status, body);
        }

        let json: Value = response.json().await?;
        // Results come nested per query text; we always send exactly one.
        let documents = json
            .get("documents")
            .and_then(Value::as_array)
            .and_then(|outer| outer.first())
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("store response missing documents"))?;
        let empty = Vec::new();
        let metadatas = json
            .get("metadatas")
            .and_then(Value::as_array)
            .and_then(|outer| outer.first())
            .and_then(Value::as_array)
            .unwrap_or(&empty);

        Ok(documents
            .iter()
            .enumerate()
            .filter_map(|(i, doc)| {
                doc.as_str().map(|doc| QueryHit {
                    document: doc.to_string(),
                    metadata: metadata_map(metadatas.get(i)),
                })
            })
            .collect())
    }

    async fn delete_collection(&self) -> Result<()> {
        let response = self
            .client
            .delete(format!(
                "{}/api/v1/collections/{}",
                self.base_url, self.collection
            ))
            .send()
            .await?;

        let status = response.status();
        // A collection that never existed is fine to "delete".
        if !status.is_success() && status.as_u16() != 404 {
            let body = response.text().await.unwrap_or_default();
            bail!("delete collection failed with {}: {}", status, body);
        }

        // Recreate empty so subsequent upserts have a target.
        let id = get_or_create_collection(&self.client, &self.base_url, &self.collection).await?;
        *self.collection_id.lock().unwrap() = id;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_map_handles_null_and_objects() {
        assert!(metadata_map(None).is_empty());
        assert!(metadata_map(Some(&Value::Null)).is_empty());
        let obj = serde_json::json!({ "file_name": "a.md" });
        assert_eq!(
            metadata_map(Some(&obj)).get("file_name"),
            Some(&Value::String("a.md".to_string()))
        );
    }
}
