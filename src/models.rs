//! Core data types flowing through the ingestion and retrieval pipeline.

use std::path::PathBuf;

use serde_json::{Map, Value};

/// A source file normalized to UTF-8 text.
///
/// Exists only for the duration of one ingestion pass; never persisted.
#[derive(Debug, Clone)]
pub struct Document {
    pub path: PathBuf,
    pub raw_text: String,
    /// Lowercased extension without the leading dot (e.g. `"md"`).
    pub extension: String,
}

/// A bounded span of text produced by a splitting strategy.
///
/// `index` values for one document form a dense `0..N-1` sequence and
/// `total_in_document` equals `N` for every chunk of that document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub index: usize,
    pub total_in_document: usize,
}

/// The persisted unit sent to the vector store.
///
/// `id` is derived from the source file's relative path and the chunk index,
/// so re-ingesting unchanged input upserts the same ids.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub id: String,
    pub text: String,
    pub metadata: Map<String, Value>,
}

impl ChunkRecord {
    /// Deterministic record id: `<relative_path>::<chunk_index>`.
    pub fn id_for(relative_path: &str, index: usize) -> String {
        format!("{}::{}", relative_path, index)
    }
}

/// Id + metadata pair read back from the store (used by refresh mode).
#[derive(Debug, Clone)]
pub struct StoredRecord {
    pub id: String,
    pub metadata: Map<String, Value>,
}

/// One ranked result returned from a store query.
#[derive(Debug, Clone)]
pub struct QueryHit {
    pub document: String,
    pub metadata: Map<String, Value>,
}

/// Why a file was skipped during a batch run.
///
/// Per-file failures are converted into one of these at the file boundary;
/// nothing propagates past the orchestrator's per-file loop.
#[derive(Debug, Clone)]
pub enum SkipReason {
    /// Refresh mode found a matching checksum for the path.
    Unchanged,
    /// The file was empty, or chunking produced no non-empty chunks.
    EmptyInput,
    Extraction(String),
    Chunking(String),
    Upsert(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::Unchanged => write!(f, "unchanged (checksum match)"),
            SkipReason::EmptyInput => write!(f, "no non-empty chunks"),
            SkipReason::Extraction(e) => write!(f, "extraction failed: {}", e),
            SkipReason::Chunking(e) => write!(f, "chunking failed: {}", e),
            SkipReason::Upsert(e) => write!(f, "upsert failed: {}", e),
        }
    }
}

/// Outcome counters for one ingestion run, surfaced at the end.
#[derive(Debug, Default)]
pub struct ProcessingReport {
    pub files_processed: usize,
    pub chunks_emitted: usize,
    /// `(relative_path, reason)` entries for every skipped file.
    pub skipped: Vec<(String, String)>,
}

impl ProcessingReport {
    pub fn record_skip(&mut self, relative_path: &str, reason: &SkipReason) {
        self.skipped
            .push((relative_path.to_string(), reason.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_is_path_and_index() {
        assert_eq!(ChunkRecord::id_for("docs/a.md", 3), "docs/a.md::3");
    }

    #[test]
    fn skip_reasons_render() {
        assert_eq!(
            SkipReason::Unchanged.to_string(),
            "unchanged (checksum match)"
        );
        assert!(SkipReason::Extraction("bad utf-8".into())
            .to_string()
            .contains("bad utf-8"));
    }
}
