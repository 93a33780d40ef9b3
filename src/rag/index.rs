//! In-memory vector index with brute-force cosine similarity search.
//!
//! Lives for one process run; there is no persistence and no incremental
//! update.

use tracing::debug;

use crate::llm::{Embedder, LlmError};

use super::Chunk;

/// A chunk with its similarity to the query.
#[derive(Debug, Clone, Copy)]
pub struct ScoredChunk<'a> {
    pub chunk: &'a Chunk,
    pub score: f32,
}

struct Entry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// Nearest-neighbour index over chunk embeddings.
#[derive(Default)]
pub struct VectorIndex {
    entries: Vec<Entry>,
}

impl VectorIndex {
    /// Embed every chunk and build the index.
    ///
    /// An empty chunk list builds an empty index without calling the embedder.
    pub async fn build<E: Embedder + ?Sized>(
        chunks: Vec<Chunk>,
        embedder: &E,
    ) -> Result<Self, LlmError> {
        if chunks.is_empty() {
            return Ok(Self::default());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_documents(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(LlmError::Parse(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let index = Self::from_embedded(chunks.into_iter().zip(embeddings).collect());
        debug!("Indexed {} chunk(s)", index.len());
        Ok(index)
    }

    /// Build from chunks that already carry their embeddings.
    pub fn from_embedded(items: Vec<(Chunk, Vec<f32>)>) -> Self {
        Self {
            entries: items
                .into_iter()
                .map(|(chunk, embedding)| Entry { chunk, embedding })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Return at most `k` chunks scoring strictly above `score_threshold`,
    /// best first.
    pub fn search(&self, query: &[f32], k: usize, score_threshold: f32) -> Vec<ScoredChunk<'_>> {
        let mut hits: Vec<ScoredChunk<'_>> = self
            .entries
            .iter()
            .map(|entry| ScoredChunk {
                chunk: &entry.chunk,
                score: cosine_similarity(query, &entry.embedding),
            })
            .filter(|hit| hit.score > score_threshold)
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        debug!(
            "Search returned {} chunk(s) above {:.2}",
            hits.len(),
            score_threshold
        );
        hits
    }
}

/// Calculate cosine similarity between two vectors.
///
/// Mismatched lengths and zero vectors score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot_product = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for (x, y) in a.iter().zip(b.iter()) {
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = (norm_a * norm_b).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }

    dot_product / denominator
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn chunk(text: &str) -> Chunk {
        Chunk {
            text: text.to_string(),
            source: PathBuf::from("policy.pdf"),
            page: 1,
            chunk_index: 0,
        }
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);

        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_search_orders_and_limits() {
        let index = VectorIndex::from_embedded(vec![
            (chunk("weak"), vec![0.5, 1.0]),
            (chunk("exact"), vec![1.0, 0.0]),
            (chunk("close"), vec![1.0, 0.2]),
            (chunk("opposite"), vec![-1.0, 0.0]),
        ]);

        let hits = index.search(&[1.0, 0.0], 2, 0.3);
        let texts: Vec<&str> = hits.iter().map(|h| h.chunk.text.as_str()).collect();
        assert_eq!(texts, vec!["exact", "close"]);
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn test_search_threshold_is_strict() {
        let index = VectorIndex::from_embedded(vec![(chunk("orthogonal"), vec![0.0, 1.0])]);
        assert!(index.search(&[1.0, 0.0], 4, 0.0).is_empty());
        assert_eq!(index.search(&[0.0, 1.0], 4, 0.0).len(), 1);
    }

    #[test]
    fn test_empty_index() {
        let index = VectorIndex::default();
        assert!(index.is_empty());
        assert!(index.search(&[1.0], 4, 0.3).is_empty());
    }
}
