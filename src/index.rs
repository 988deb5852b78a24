//! In-memory similarity index over embedded chunks.
//!
//! Search is an exhaustive linear scan; the index is small (one source
//! document) and rebuilt only on re-initialization.

use crate::embedding::cosine_similarity;
use crate::error::{Error, Result};
use serde::Serialize;

/// One embedded segment of the source document.
#[derive(Debug, Clone, Serialize)]
pub struct Chunk {
    pub text: String,
    pub vector: Vec<f64>,
    pub index: usize,
}

#[derive(Debug, Default)]
pub struct SimilarityIndex {
    chunks: Vec<Chunk>,
    dims: Option<usize>,
}

impl SimilarityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the indexed chunks.
    ///
    /// All vectors must share one dimension; on mismatch the current
    /// contents are left untouched.
    pub fn build(&mut self, chunks: Vec<Chunk>) -> Result<()> {
        let dims = chunks.first().map(|c| c.vector.len());
        if let Some(expected) = dims {
            if let Some(bad) = chunks.iter().find(|c| c.vector.len() != expected) {
                return Err(Error::DimensionMismatch {
                    expected,
                    actual: bad.vector.len(),
                });
            }
        }
        self.chunks = chunks;
        self.dims = dims;
        Ok(())
    }

    /// Best-scoring chunk for `vector`, or `None` when the index is empty.
    ///
    /// Ties keep the earliest chunk.
    pub fn query(&self, vector: &[f64]) -> Result<Option<(&Chunk, f64)>> {
        let Some(expected) = self.dims else {
            return Ok(None);
        };
        if vector.len() != expected {
            return Err(Error::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }

        let mut best: Option<(&Chunk, f64)> = None;
        for chunk in &self.chunks {
            let score = cosine_similarity(vector, &chunk.vector);
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((chunk, score)),
            }
        }
        Ok(best)
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dims(&self) -> Option<usize> {
        self.dims
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(index: usize, text: &str, vector: Vec<f64>) -> Chunk {
        Chunk {
            text: text.into(),
            vector,
            index,
        }
    }

    #[test]
    fn empty_index_has_no_match() {
        let index = SimilarityIndex::new();
        assert!(index.query(&[1.0, 0.0]).unwrap().is_none());
        // dimension is unknown until something is indexed
        assert!(index.query(&[]).unwrap().is_none());
    }

    #[test]
    fn returns_highest_cosine() {
        let mut index = SimilarityIndex::new();
        index
            .build(vec![
                chunk(0, "shipping", vec![1.0, 0.0, 0.0]),
                chunk(1, "returns", vec![0.0, 1.0, 0.0]),
                chunk(2, "warranty", vec![0.0, 0.7, 0.7]),
            ])
            .unwrap();

        let (best, score) = index.query(&[0.1, 0.9, 0.0]).unwrap().unwrap();
        assert_eq!(best.text, "returns");
        assert!(score > 0.9);
    }

    #[test]
    fn ties_keep_first_chunk() {
        let mut index = SimilarityIndex::new();
        index
            .build(vec![
                chunk(0, "first", vec![2.0, 0.0]),
                chunk(1, "second", vec![5.0, 0.0]),
            ])
            .unwrap();

        let (best, _) = index.query(&[1.0, 0.0]).unwrap().unwrap();
        assert_eq!(best.index, 0);
    }

    #[test]
    fn negative_scores_still_match() {
        let mut index = SimilarityIndex::new();
        index.build(vec![chunk(0, "opposite", vec![-1.0, 0.0])]).unwrap();
        let (best, score) = index.query(&[1.0, 0.0]).unwrap().unwrap();
        assert_eq!(best.text, "opposite");
        assert!((score + 1.0).abs() < 1e-12);
    }

    #[test]
    fn query_dimension_mismatch() {
        let mut index = SimilarityIndex::new();
        index.build(vec![chunk(0, "a", vec![1.0, 0.0, 0.0])]).unwrap();

        let err = index.query(&[1.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            Error::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
        // index is still usable afterwards
        assert!(index.query(&[1.0, 0.0, 0.0]).unwrap().is_some());
    }

    #[test]
    fn build_rejects_mixed_dimensions_and_keeps_previous() {
        let mut index = SimilarityIndex::new();
        index.build(vec![chunk(0, "kept", vec![1.0, 0.0])]).unwrap();

        let err = index
            .build(vec![chunk(0, "x", vec![1.0, 0.0]), chunk(1, "y", vec![1.0])])
            .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
        assert_eq!(index.len(), 1);
        assert_eq!(index.chunks()[0].text, "kept");
    }

    #[test]
    fn build_replaces_contents() {
        let mut index = SimilarityIndex::new();
        index.build(vec![chunk(0, "old", vec![1.0, 0.0])]).unwrap();
        index.build(Vec::new()).unwrap();
        assert!(index.is_empty());
        assert_eq!(index.dims(), None);
    }
}
