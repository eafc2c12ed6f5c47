//! Embedding-distance topic segmentation.
//!
//! Detects topical boundaries by embedding every sentence and measuring the
//! cosine distance between adjacent pairs. Distances above a percentile
//! threshold mark breakpoints; sentences between breakpoints are rejoined
//! into one group.
//!
//! # Algorithm
//!
//! 1. Split on the literal `". "`, preserving sentence order.
//! 2. Fewer than two sentences → the whole text is one group (no distances
//!    exist, so the percentile step is never reached).
//! 3. Embed every sentence; `distance[i] = 1 − cos(e[i], e[i+1])`.
//! 4. Threshold = the configured percentile of the distances (linear
//!    interpolation between order statistics).
//! 5. Cut immediately after each index whose distance strictly exceeds the
//!    threshold; rejoin each group's sentences with a single space.
//!
//! With near-uniform distances the threshold equals the maximum distance and
//! no breakpoint fires, so the input degrades to a single group.

use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::Result;

use crate::embedding::Embedder;

/// Default percentile of adjacent-sentence distances used as the
/// breakpoint threshold.
pub const DEFAULT_BREAKPOINT_PERCENTILE: f64 = 95.0;

/// Groups sentences into topical segments using an embedding model.
pub struct SemanticSegmenter {
    embedder: Arc<dyn Embedder>,
    breakpoint_percentile: f64,
}

impl SemanticSegmenter {
    pub fn new(embedder: Arc<dyn Embedder>, breakpoint_percentile: f64) -> Self {
        Self {
            embedder,
            breakpoint_percentile,
        }
    }

    /// Partition `text` into topically coherent groups.
    ///
    /// Always returns at least one group; the degenerate cases (zero or one
    /// sentence, no distance above the threshold) return the input text
    /// unchanged as a single group.
    pub async fn segment(&self, text: &str) -> Result<Vec<String>> {
        let sentences: Vec<&str> = text.split(". ").collect();
        if sentences.len() < 2 {
            return Ok(vec![text.to_string()]);
        }

        let owned: Vec<String> = sentences.iter().map(|s| s.to_string()).collect();
        let embeddings = self.embedder.embed(&owned).await?;

        let distances: Vec<f64> = embeddings
            .windows(2)
            .map(|pair| 1.0 - f64::from(cosine_similarity(&pair[0], &pair[1])))
            .collect();

        let threshold = percentile(&distances, self.breakpoint_percentile);
        let breakpoints: Vec<usize> = distances
            .iter()
            .enumerate()
            .filter(|(_, d)| **d > threshold)
            .map(|(i, _)| i)
            .collect();

        if breakpoints.is_empty() {
            return Ok(vec![text.to_string()]);
        }

        let mut groups = Vec::with_capacity(breakpoints.len() + 1);
        let mut start = 0;
        for &bp in &breakpoints {
            groups.push(owned[start..=bp].join(" "));
            start = bp + 1;
        }
        groups.push(owned[start..].join(" "));
        Ok(groups)
    }
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`; `0.0` for empty vectors or vectors of
/// different lengths.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

/// Value at `pct` (0..=100) of `values`, linearly interpolating between
/// order statistics. Callers must not pass an empty slice; the segmenter
/// guards the zero-distance case before reaching this.
fn percentile(values: &[f64], pct: f64) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    if sorted.len() == 1 {
        return sorted[0];
    }

    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
