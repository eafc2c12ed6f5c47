//! Ingestion pipeline orchestration.
//!
//! Drives discovery → extraction → fingerprinting → chunking → metadata
//! assembly → upsert against an injected [`VectorStore`], accumulating a
//! [`ProcessingReport`]. A failure while handling one file is recorded as a
//! skip with its reason and the run continues; only store connectivity (at
//! connect time, before this module is reached) and clean-mode collection
//! deletion are fatal.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::Utc;
use serde_json::{Map, Value};

use crate::chunk::{assemble, TextSplitter};
use crate::discover::{discover, DiscoveredFile};
use crate::extract::extract;
use crate::fingerprint::{decide, fingerprint, ChangeDecision};
use crate::ignore_rules::IgnoreRules;
use crate::models::{Chunk, ChunkRecord, Document, ProcessingReport, SkipReason};
use crate::progress::{IngestProgressEvent, IngestProgressReporter};
use crate::store::VectorStore;

/// Options for one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub root: PathBuf,
    /// Dot-prefixed lowercase extensions eligible for ingestion.
    pub extensions: Vec<String>,
    /// Extra exclude globs layered over discovered ignore files.
    pub exclude_globs: Vec<String>,
    /// Delete the target collection before processing.
    pub clean: bool,
    /// Skip files whose stored checksum matches the extracted text.
    pub refresh: bool,
}

/// Run the full pipeline over `opts.root`.
pub async fn run_ingest(
    store: &dyn VectorStore,
    splitter: &TextSplitter,
    opts: &IngestOptions,
    reporter: &dyn IngestProgressReporter,
) -> Result<ProcessingReport> {
    if !opts.root.is_dir() {
        bail!("folder does not exist: {}", opts.root.display());
    }

    if opts.clean {
        store.delete_collection().await?;
    }

    // Clean mode wiped the collection, so there are no prior checksums to
    // compare against even if refresh was also requested.
    let previous = if opts.refresh && !opts.clean {
        Some(load_previous_checksums(store).await?)
    } else {
        None
    };

    reporter.report(IngestProgressEvent::Discovering {
        root: opts.root.display().to_string(),
    });
    let rules = IgnoreRules::build(&opts.root, &opts.exclude_globs)?;
    let files = discover(&opts.root, &opts.extensions, &rules)?;

    let mut report = ProcessingReport::default();
    let total = files.len() as u64;

    for (i, file) in files.iter().enumerate() {
        match process_file(store, splitter, file, previous.as_ref()).await {
            Ok(chunk_count) => {
                report.files_processed += 1;
                report.chunks_emitted += chunk_count;
            }
            Err(reason) => {
                tracing::debug!(path = %file.relative_path, reason = %reason, "file skipped");
                report.record_skip(&file.relative_path, &reason);
            }
        }
        reporter.report(IngestProgressEvent::Processing {
            n: (i + 1) as u64,
            total,
        });
    }

    Ok(report)
}

/// Extract, fingerprint, chunk, and upsert one file. Returns the number of
/// chunk records written, or the reason the file was skipped.
async fn process_file(
    store: &dyn VectorStore,
    splitter: &TextSplitter,
    file: &DiscoveredFile,
    previous: Option<&HashMap<String, String>>,
) -> Result<usize, SkipReason> {
    let document = extract(&file.path).map_err(|e| SkipReason::Extraction(e.to_string()))?;
    if document.raw_text.trim().is_empty() {
        return Err(SkipReason::EmptyInput);
    }

    let checksum = fingerprint(&document.raw_text);
    if decide(&file.relative_path, &checksum, previous) == ChangeDecision::Skip {
        return Err(SkipReason::Unchanged);
    }

    let pieces = splitter
        .split(&document.raw_text)
        .await
        .map_err(|e| SkipReason::Chunking(e.to_string()))?;
    let chunks = assemble(pieces);
    if chunks.is_empty() {
        return Err(SkipReason::EmptyInput);
    }

    let created_at = Utc::now().to_rfc3339();
    let records: Vec<ChunkRecord> = chunks
        .iter()
        .map(|chunk| build_record(file, &document, chunk, splitter, &checksum, &created_at))
        .collect();

    store
        .upsert(&records)
        .await
        .map_err(|e| SkipReason::Upsert(e.to_string()))?;

    Ok(records.len())
}

/// Assemble the provenance metadata for one chunk. Every chunk of a file
/// carries the same file-level checksum for that pass.
fn build_record(
    file: &DiscoveredFile,
    document: &Document,
    chunk: &Chunk,
    splitter: &TextSplitter,
    checksum: &str,
    created_at: &str,
) -> ChunkRecord {
    let absolute = file
        .path
        .canonicalize()
        .unwrap_or_else(|_| file.path.clone());
    let file_name = file
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let params = splitter.params();

    let mut metadata = Map::new();
    metadata.insert(
        "file_path".to_string(),
        Value::String(absolute.display().to_string()),
    );
    metadata.insert("file_name".to_string(), Value::String(file_name));
    metadata.insert(
        "relative_path".to_string(),
        Value::String(file.relative_path.clone()),
    );
    metadata.insert(
        "extension".to_string(),
        Value::String(document.extension.clone()),
    );
    metadata.insert("chunk_index".to_string(), Value::from(chunk.index));
    metadata.insert(
        "total_chunks".to_string(),
        Value::from(chunk.total_in_document),
    );
    metadata.insert("file_size".to_string(), Value::from(file.size));
    metadata.insert(
        "created_at".to_string(),
        Value::String(created_at.to_string()),
    );
    metadata.insert(
        "chunking_strategy".to_string(),
        Value::String(splitter.strategy().name().to_string()),
    );
    metadata.insert("chunk_size".to_string(), Value::from(params.chunk_size));
    metadata.insert(
        "chunk_overlap".to_string(),
        Value::from(params.chunk_overlap),
    );
    metadata.insert("checksum".to_string(), Value::String(checksum.to_string()));

    ChunkRecord {
        id: ChunkRecord::id_for(&file.relative_path, chunk.index),
        text: chunk.text.clone(),
        metadata,
    }
}

/// Read prior file checksums out of the store's metadata. Any one chunk per
/// file suffices since all of a file's chunks share the checksum.
async fn load_previous_checksums(store: &dyn VectorStore) -> Result<HashMap<String, String>> {
    let mut map = HashMap::new();
    for record in store.get_all().await? {
        let path = record.metadata.get("relative_path").and_then(Value::as_str);
        let sum = record.metadata.get("checksum").and_then(Value::as_str);
        if let (Some(path), Some(sum)) = (path, sum) {
            map.insert(path.to_string(), sum.to_string());
        }
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::{SplitParams, Strategy};
    use crate::progress::NoProgress;
    use crate::store::memory::MemoryStore;
    use std::fs;
    use tempfile::TempDir;

    fn splitter() -> TextSplitter {
        TextSplitter::new(
            Strategy::Character,
            SplitParams {
                chunk_size: 100,
                chunk_overlap: 0,
                strip_whitespace: false,
            },
        )
        .unwrap()
    }

    fn options(root: &std::path::Path) -> IngestOptions {
        IngestOptions {
            root: root.to_path_buf(),
            extensions: vec![".txt".to_string()],
            exclude_globs: Vec::new(),
            clean: false,
            refresh: false,
        }
    }

    #[tokio::test]
    async fn missing_folder_is_fatal() {
        let store = MemoryStore::new();
        let opts = options(std::path::Path::new("/nonexistent/folder"));
        let result = run_ingest(&store, &splitter(), &opts, &NoProgress).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn metadata_carries_full_provenance() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("doc.txt"), "hello world").unwrap();
        let store = MemoryStore::new();

        let report = run_ingest(&store, &splitter(), &options(tmp.path()), &NoProgress)
            .await
            .unwrap();
        assert_eq!(report.files_processed, 1);
        assert_eq!(report.chunks_emitted, 1);

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        let record = &all[0];
        assert_eq!(record.id, "doc.txt::0");
        let meta = &record.metadata;
        assert_eq!(meta.get("relative_path").unwrap(), "doc.txt");
        assert_eq!(meta.get("file_name").unwrap(), "doc.txt");
        assert_eq!(meta.get("extension").unwrap(), "txt");
        assert_eq!(meta.get("chunk_index").unwrap(), 0);
        assert_eq!(meta.get("total_chunks").unwrap(), 1);
        assert_eq!(meta.get("file_size").unwrap(), 11);
        assert_eq!(meta.get("chunking_strategy").unwrap(), "character");
        assert_eq!(meta.get("chunk_size").unwrap(), 100);
        assert_eq!(meta.get("chunk_overlap").unwrap(), 0);
        assert_eq!(
            meta.get("checksum").unwrap().as_str().unwrap(),
            fingerprint("hello world")
        );
        assert!(meta.get("created_at").is_some());
        assert!(meta
            .get("file_path")
            .unwrap()
            .as_str()
            .unwrap()
            .ends_with("doc.txt"));
    }

    #[tokio::test]
    async fn empty_file_is_skipped_not_stored() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("empty.txt"), "").unwrap();
        fs::write(tmp.path().join("blank.txt"), "   \n\t  ").unwrap();
        let store = MemoryStore::new();

        let report = run_ingest(&store, &splitter(), &options(tmp.path()), &NoProgress)
            .await
            .unwrap();
        assert_eq!(report.files_processed, 0);
        assert_eq!(report.chunks_emitted, 0);
        assert_eq!(report.skipped.len(), 2);
        assert!(store.is_empty());
    }
}
