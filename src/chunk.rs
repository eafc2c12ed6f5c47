//! Chunking strategy engine.
//!
//! Splits document text into bounded-size chunks under one of a closed set
//! of strategies. A [`TextSplitter`] is built once from a [`Strategy`] and
//! [`SplitParams`]; invalid parameters and unknown strategy names are
//! rejected at construction, never mid-split. The semantic variant resolves
//! its embedding provider up front, so the heavyweight dependency is paid
//! for exactly once.
//!
//! All sizes are measured in characters (Unicode scalar values); slicing
//! never lands inside a UTF-8 code point.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Result};

use crate::embedding::Embedder;
use crate::models::Chunk;
use crate::semantic::SemanticSegmenter;

/// Separator priority for the `recursive` strategy: paragraph break, line
/// break, word break, then single characters.
const RECURSIVE_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Separator priority for the `markdown` strategy: headings, fenced code,
/// list items, then the generic list.
const MARKDOWN_SEPARATORS: &[&str] = &[
    "\n# ", "\n## ", "\n### ", "\n#### ", "\n##### ", "\n###### ", "```\n", "\n- ", "\n* ",
    "\n\n", "\n", " ", "",
];

/// The closed set of chunking strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Fixed-size character windows, no overlap, boundary-unaware.
    Character,
    /// Split on newlines, greedily packed up to the size limit.
    Endline,
    /// Multi-separator recursion preferring paragraph breaks over words.
    Recursive,
    /// Recursive with Markdown structure boundaries first.
    Markdown,
    /// Embedding-based topic segmentation, re-sliced to the size limit.
    Semantic,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Character => "character",
            Strategy::Endline => "endline",
            Strategy::Recursive => "recursive",
            Strategy::Markdown => "markdown",
            Strategy::Semantic => "semantic",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "character" => Ok(Strategy::Character),
            "endline" => Ok(Strategy::Endline),
            "recursive" => Ok(Strategy::Recursive),
            "markdown" => Ok(Strategy::Markdown),
            "semantic" => Ok(Strategy::Semantic),
            other => bail!(
                "Unsupported chunking strategy: '{}'. \
                 Valid strategies: character, endline, recursive, markdown, semantic.",
                other
            ),
        }
    }
}

/// Size, overlap, and whitespace handling shared by every strategy.
#[derive(Debug, Clone, Copy)]
pub struct SplitParams {
    /// Target chunk length in characters. Must be greater than zero.
    pub chunk_size: usize,
    /// Trailing characters of one chunk duplicated at the start of the
    /// next. Ignored by the `character` and `semantic` windowing.
    pub chunk_overlap: usize,
    /// Trim leading/trailing whitespace from each produced chunk.
    pub strip_whitespace: bool,
}

enum Engine {
    Character,
    Endline,
    Recursive,
    Markdown,
    Semantic(SemanticSegmenter),
}

/// A strategy resolved and validated once, reusable across documents.
pub struct TextSplitter {
    engine: Engine,
    strategy: Strategy,
    params: SplitParams,
}

impl TextSplitter {
    /// Build a splitter for any non-semantic strategy.
    pub fn new(strategy: Strategy, params: SplitParams) -> Result<Self> {
        validate_params(&params)?;
        let engine = match strategy {
            Strategy::Character => Engine::Character,
            Strategy::Endline => Engine::Endline,
            Strategy::Recursive => Engine::Recursive,
            Strategy::Markdown => Engine::Markdown,
            Strategy::Semantic => bail!(
                "The semantic strategy requires an embedding provider; \
                 use TextSplitter::semantic"
            ),
        };
        Ok(Self {
            engine,
            strategy,
            params,
        })
    }

    /// Build the semantic splitter around an embedding provider.
    pub fn semantic(
        params: SplitParams,
        embedder: Arc<dyn Embedder>,
        breakpoint_percentile: f64,
    ) -> Result<Self> {
        validate_params(&params)?;
        Ok(Self {
            engine: Engine::Semantic(SemanticSegmenter::new(embedder, breakpoint_percentile)),
            strategy: Strategy::Semantic,
            params,
        })
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn params(&self) -> SplitParams {
        self.params
    }

    /// Split `text` into an ordered sequence of chunk texts.
    ///
    /// Only the semantic variant awaits (embedding inference); the
    /// syntactic strategies are pure computation.
    pub async fn split(&self, text: &str) -> Result<Vec<String>> {
        match &self.engine {
            Engine::Character => Ok(split_fixed(text, self.params.chunk_size)),
            Engine::Endline => {
                let pieces: Vec<&str> = text.split('\n').collect();
                Ok(pack_pieces(&pieces, "\n", &self.params))
            }
            Engine::Recursive => Ok(split_levels(text, RECURSIVE_SEPARATORS, &self.params)),
            Engine::Markdown => Ok(split_levels(text, MARKDOWN_SEPARATORS, &self.params)),
            Engine::Semantic(segmenter) => {
                let groups = segmenter.segment(text).await?;
                let mut out = Vec::new();
                for group in groups {
                    if group.chars().count() > self.params.chunk_size {
                        out.extend(split_fixed(&group, self.params.chunk_size));
                    } else {
                        out.push(group);
                    }
                }
                Ok(out)
            }
        }
    }
}

fn validate_params(params: &SplitParams) -> Result<()> {
    if params.chunk_size == 0 {
        bail!("chunk_size must be greater than zero");
    }
    if params.chunk_overlap >= params.chunk_size {
        bail!("chunk_overlap must be smaller than chunk_size");
    }
    Ok(())
}

/// Number chunk texts into [`Chunk`]s, dropping any that are empty after
/// trimming. Surviving chunks get dense `0..N-1` indices and share
/// `total_in_document == N`.
pub fn assemble(pieces: Vec<String>) -> Vec<Chunk> {
    let kept: Vec<String> = pieces
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect();
    let total = kept.len();
    kept.into_iter()
        .enumerate()
        .map(|(index, text)| Chunk {
            text,
            index,
            total_in_document: total,
        })
        .collect()
}

/// Consecutive windows of exactly `chunk_size` characters; the final window
/// may be shorter. Concatenating the output reconstructs the input exactly.
fn split_fixed(text: &str, chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut start = 0usize;
    let mut count = 0usize;
    for (idx, _) in text.char_indices() {
        if count == chunk_size {
            chunks.push(text[start..idx].to_string());
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(text[start..].to_string());
    }
    chunks
}

/// Greedily pack separator-delimited pieces into chunks of at most
/// `chunk_size` characters, carrying `chunk_overlap` trailing characters
/// into the next chunk. A single piece longer than `chunk_size` becomes its
/// own oversized chunk.
fn pack_pieces(pieces: &[&str], separator: &str, params: &SplitParams) -> Vec<String> {
    let sep_chars = separator.chars().count();
    let mut chunks = Vec::new();
    let mut current = String::new();

    for piece in pieces {
        if piece.is_empty() {
            continue;
        }
        let extra = if current.is_empty() { 0 } else { sep_chars };
        if !current.is_empty()
            && current.chars().count() + extra + piece.chars().count() > params.chunk_size
        {
            let overlap = tail_chars(&current, params.chunk_overlap);
            finish_chunk(&mut chunks, std::mem::take(&mut current), params);
            current = overlap;
        }
        if !current.is_empty() {
            current.push_str(separator);
        }
        current.push_str(piece);
    }
    finish_chunk(&mut chunks, current, params);
    chunks
}

fn finish_chunk(chunks: &mut Vec<String>, chunk: String, params: &SplitParams) {
    let out = if params.strip_whitespace {
        chunk.trim().to_string()
    } else {
        chunk
    };
    if !out.is_empty() {
        chunks.push(out);
    }
}

/// Last `n` characters of `s`, or all of it when shorter.
fn tail_chars(s: &str, n: usize) -> String {
    if n == 0 {
        return String::new();
    }
    let total = s.chars().count();
    if total <= n {
        return s.to_string();
    }
    let start = s
        .char_indices()
        .nth(total - n)
        .map(|(i, _)| i)
        .unwrap_or(0);
    s[start..].to_string()
}

/// Recursive multi-separator splitting: split on the highest-priority
/// separator present, keep pieces that fit, recurse into lower-priority
/// separators for pieces that do not, and pack each level's fitting pieces
/// back together with that level's separator.
fn split_levels(text: &str, separators: &[&str], params: &SplitParams) -> Vec<String> {
    let (sep_idx, sep) = separators
        .iter()
        .enumerate()
        .find(|(_, s)| s.is_empty() || text.contains(**s))
        .map(|(i, s)| (i, *s))
        .unwrap_or((separators.len().saturating_sub(1), ""));

    if sep.is_empty() {
        return split_fixed(text, params.chunk_size);
    }

    let deeper = &separators[sep_idx + 1..];
    let mut final_chunks = Vec::new();
    let mut fitting: Vec<&str> = Vec::new();

    for piece in text.split(sep) {
        if piece.is_empty() {
            continue;
        }
        if piece.chars().count() <= params.chunk_size {
            fitting.push(piece);
        } else {
            if !fitting.is_empty() {
                final_chunks.extend(pack_pieces(&fitting, sep, params));
                fitting.clear();
            }
            final_chunks.extend(split_levels(piece, deeper, params));
        }
    }
    if !fitting.is_empty() {
        final_chunks.extend(pack_pieces(&fitting, sep, params));
    }
    final_chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(chunk_size: usize, chunk_overlap: usize, strip_whitespace: bool) -> SplitParams {
        SplitParams {
            chunk_size,
            chunk_overlap,
            strip_whitespace,
        }
    }

    async fn run(strategy: Strategy, p: SplitParams, text: &str) -> Vec<String> {
        TextSplitter::new(strategy, p)
            .unwrap()
            .split(text)
            .await
            .unwrap()
    }

    #[test]
    fn strategy_names_round_trip() {
        for name in ["character", "endline", "recursive", "markdown", "semantic"] {
            assert_eq!(Strategy::from_str(name).unwrap().name(), name);
        }
    }

    #[test]
    fn unknown_strategy_rejected_at_parse() {
        let err = Strategy::from_str("token").unwrap_err();
        assert!(err.to_string().contains("Unsupported chunking strategy"));
    }

    #[test]
    fn zero_chunk_size_rejected_at_construction() {
        assert!(TextSplitter::new(Strategy::Character, params(0, 0, false)).is_err());
    }

    #[test]
    fn overlap_not_smaller_than_size_rejected() {
        assert!(TextSplitter::new(Strategy::Endline, params(10, 10, false)).is_err());
    }

    #[test]
    fn semantic_requires_embedder() {
        assert!(TextSplitter::new(Strategy::Semantic, params(10, 0, false)).is_err());
    }

    #[tokio::test]
    async fn fixed_size_250_chars_at_100() {
        let text = "x".repeat(250);
        let chunks = run(Strategy::Character, params(100, 0, false), &text).await;
        let lengths: Vec<usize> = chunks.iter().map(|c| c.chars().count()).collect();
        assert_eq!(lengths, vec![100, 100, 50]);
    }

    #[tokio::test]
    async fn fixed_size_concatenation_reconstructs_input() {
        let text = "The quick brown fox jumps over the lazy dog. Ünïcödé too.";
        for size in [1, 3, 7, 100] {
            let chunks = run(Strategy::Character, params(size, 0, false), text).await;
            let expected = text.chars().count().div_ceil(size);
            assert_eq!(chunks.len(), expected, "size {}", size);
            assert_eq!(chunks.concat(), text, "size {}", size);
        }
    }

    #[tokio::test]
    async fn fixed_size_empty_text_yields_no_chunks() {
        let chunks = run(Strategy::Character, params(100, 0, false), "").await;
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn endline_packs_lines_up_to_size() {
        let text = "aaaa\nbbbb\ncccc\ndddd";
        let chunks = run(Strategy::Endline, params(9, 0, false), text).await;
        assert_eq!(chunks, vec!["aaaa\nbbbb", "cccc\ndddd"]);
    }

    #[tokio::test]
    async fn endline_overlap_duplicates_trailing_context() {
        let text = "aaaa\nbbbb\ncccc";
        let chunks = run(Strategy::Endline, params(9, 2, false), text).await;
        assert_eq!(chunks[0], "aaaa\nbbbb");
        // The next chunk starts with the previous chunk's last two chars.
        assert!(chunks[1].starts_with("bb"));
        assert!(chunks[1].ends_with("cccc"));
    }

    #[tokio::test]
    async fn endline_oversized_line_kept_whole() {
        let text = "short\naveryverylongline\nshort";
        let chunks = run(Strategy::Endline, params(10, 0, false), text).await;
        assert!(chunks.contains(&"averyverylongline".to_string()));
    }

    #[tokio::test]
    async fn endline_strip_whitespace_trims_chunks() {
        let text = "  padded  \n  lines  ";
        let chunks = run(Strategy::Endline, params(12, 0, true), text).await;
        for chunk in &chunks {
            assert_eq!(chunk.trim(), chunk);
        }
    }

    #[tokio::test]
    async fn recursive_prefers_paragraph_breaks() {
        let text = "first paragraph here\n\nsecond paragraph here";
        let chunks = run(Strategy::Recursive, params(25, 0, false), text).await;
        assert_eq!(
            chunks,
            vec!["first paragraph here", "second paragraph here"]
        );
    }

    #[tokio::test]
    async fn recursive_descends_to_words_for_long_paragraphs() {
        let text = "one two three four five six seven eight nine ten";
        let chunks = run(Strategy::Recursive, params(15, 0, false), text).await;
        assert!(chunks.len() > 1);
        // Word-level splitting keeps every word intact.
        for chunk in &chunks {
            for word in chunk.split(' ') {
                assert!(
                    "one two three four five six seven eight nine ten"
                        .split(' ')
                        .any(|w| w == word),
                    "mangled word {:?}",
                    word
                );
            }
        }
    }

    #[tokio::test]
    async fn recursive_hard_splits_unbreakable_runs() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = run(Strategy::Recursive, params(10, 0, false), text).await;
        assert_eq!(chunks, vec!["abcdefghij", "klmnopqrst", "uvwxyz"]);
    }

    #[tokio::test]
    async fn markdown_respects_heading_boundaries() {
        let text = "intro text\n## First\nalpha body\n## Second\nbeta body";
        let chunks = run(Strategy::Markdown, params(22, 0, false), text).await;
        // Heading sections stay intact rather than splitting mid-section.
        assert!(chunks.iter().any(|c| c.contains("alpha body")));
        assert!(chunks.iter().any(|c| c.contains("beta body")));
        assert!(!chunks
            .iter()
            .any(|c| c.contains("alpha") && c.contains("beta")));
    }

    #[tokio::test]
    async fn semantic_reslices_oversized_groups() {
        use crate::semantic::DEFAULT_BREAKPOINT_PERCENTILE;

        struct Uniform;
        #[async_trait::async_trait]
        impl Embedder for Uniform {
            fn model_name(&self) -> &str {
                "uniform"
            }
            fn dims(&self) -> usize {
                2
            }
            async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
                Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
            }
        }

        let splitter = TextSplitter::semantic(
            params(10, 0, false),
            Arc::new(Uniform),
            DEFAULT_BREAKPOINT_PERCENTILE,
        )
        .unwrap();
        // One group (uniform similarity) longer than chunk_size gets the
        // fixed-size windowing, no overlap.
        let text = "aaaa. bbbb. cccc. dddd.";
        let chunks = splitter.split(text).await.unwrap();
        assert!(chunks.len() > 1);
        assert_eq!(chunks.concat(), text);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    }

    #[test]
    fn assemble_drops_empty_and_numbers_densely() {
        let chunks = assemble(vec![
            "alpha".to_string(),
            "   ".to_string(),
            "beta".to_string(),
            String::new(),
            "gamma".to_string(),
        ]);
        assert_eq!(chunks.len(), 3);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.total_in_document, 3);
        }
    }

    #[test]
    fn tail_chars_is_char_safe() {
        assert_eq!(tail_chars("héllo", 3), "llo");
        assert_eq!(tail_chars("héllo", 4), "éllo");
        assert_eq!(tail_chars("ab", 5), "ab");
        assert_eq!(tail_chars("ab", 0), "");
    }
}
