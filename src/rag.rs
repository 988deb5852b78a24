//! Retrieval service: builds the similarity index from the source document
//! and answers nearest-chunk lookups.

use crate::doc_processor::{self, chunk_text};
use crate::embedding::Embedder;
use crate::error::{Error, Result};
use crate::index::{Chunk, SimilarityIndex};
use crate::llm::LlmError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_OVERLAP: usize = 50;

/// Best-matching chunk for a query.
#[derive(Debug, Clone, Serialize)]
pub struct RelevantChunk {
    pub text: String,
    pub similarity: f64,
    pub index: usize,
}

impl RelevantChunk {
    pub fn clears(&self, threshold: f64) -> bool {
        self.similarity >= threshold
    }
}

pub struct RetrievalService {
    embedder: Arc<dyn Embedder>,
    source_path: PathBuf,
    chunk_size: usize,
    overlap: usize,
    index: OnceCell<SimilarityIndex>,
}

impl RetrievalService {
    pub fn new(embedder: Arc<dyn Embedder>, source_path: impl Into<PathBuf>) -> Self {
        Self {
            embedder,
            source_path: source_path.into(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
            index: OnceCell::new(),
        }
    }

    pub fn with_chunking(mut self, chunk_size: usize, overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.overlap = overlap;
        self
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Build the index once. Later calls, and calls racing the first one,
    /// share the same build.
    ///
    /// Quota exhaustion while embedding leaves the service initialized with
    /// an empty index, so retrieval stays off instead of failing every
    /// query. Any other failure leaves it uninitialized.
    pub async fn initialize(&self) -> Result<()> {
        self.index().await.map(|_| ())
    }

    pub fn is_initialized(&self) -> bool {
        self.index.initialized()
    }

    /// Initialized with at least one chunk.
    pub fn is_available(&self) -> bool {
        self.chunk_count() > 0
    }

    pub fn chunk_count(&self) -> usize {
        self.index.get().map(SimilarityIndex::len).unwrap_or(0)
    }

    async fn index(&self) -> Result<&SimilarityIndex> {
        self.index.get_or_try_init(|| self.build_index()).await
    }

    async fn build_index(&self) -> Result<SimilarityIndex> {
        let path = self.source_path.clone();
        let parsed = tokio::task::spawn_blocking(move || doc_processor::parse_file(&path))
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))??;

        let texts = chunk_text(&parsed.content, self.chunk_size, self.overlap);
        let total = texts.len();
        info!(
            source = %self.source_path.display(),
            chunks = total,
            "initializing retrieval index"
        );

        let mut chunks = Vec::with_capacity(total);
        for (i, text) in texts.into_iter().enumerate() {
            match self.embedder.embed(&text).await {
                Ok(vector) => {
                    debug!("embedded chunk {}/{}", i + 1, total);
                    chunks.push(Chunk {
                        text,
                        vector,
                        index: i,
                    });
                }
                Err(LlmError::QuotaExceeded) => {
                    warn!("embedding quota exceeded; retrieval will not be available");
                    return Ok(SimilarityIndex::new());
                }
                Err(e) => return Err(e.into()),
            }
        }

        let mut index = SimilarityIndex::new();
        index.build(chunks)?;
        info!(chunks = index.len(), "retrieval index ready");
        Ok(index)
    }

    /// Nearest chunk to `query`, whether or not it clears `threshold`.
    ///
    /// Callers decide what to do with weak matches; the threshold is only
    /// reported here. Initializes the index on first use. Returns `None`
    /// when the index is empty or the query could not be embedded for
    /// quota reasons.
    pub async fn find_relevant(
        &self,
        query: &str,
        threshold: f64,
    ) -> Result<Option<RelevantChunk>> {
        let index = self.index().await?;
        if index.is_empty() {
            return Ok(None);
        }

        let vector = match self.embedder.embed(query).await {
            Ok(vector) => vector,
            Err(LlmError::QuotaExceeded) => {
                warn!("embedding quota exceeded while embedding query");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let found = index.query(&vector)?.map(|(chunk, similarity)| RelevantChunk {
            text: chunk.text.clone(),
            similarity,
            index: chunk.index,
        });
        if let Some(hit) = &found {
            debug!(
                chunk = hit.index,
                similarity = hit.similarity,
                above_threshold = hit.clears(threshold),
                "nearest chunk"
            );
        }
        Ok(found)
    }

    /// Similarity of the nearest chunk, `0.0` when there is none.
    pub async fn get_similarity_score(&self, query: &str) -> Result<f64> {
        Ok(self
            .find_relevant(query, 0.0)
            .await?
            .map(|hit| hit.similarity)
            .unwrap_or(0.0))
    }
}
