use crate::error::Result;
use crate::rag::RetrievalService;
use serde::Serialize;

#[derive(Debug, Serialize, PartialEq)]
pub struct KnowledgeStatus {
    pub source: String,
    pub initialized: bool,
    pub available: bool,
    pub chunks: usize,
}

pub fn knowledge_status(retrieval: &RetrievalService) -> KnowledgeStatus {
    KnowledgeStatus {
        source: retrieval.source_path().display().to_string(),
        initialized: retrieval.is_initialized(),
        available: retrieval.is_available(),
        chunks: retrieval.chunk_count(),
    }
}

/// Build the retrieval index if it has not been built yet.
pub async fn initialize_knowledge_base(retrieval: &RetrievalService) -> Result<KnowledgeStatus> {
    retrieval.initialize().await?;
    Ok(knowledge_status(retrieval))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{source_file, ScriptedEmbedder};
    use std::sync::Arc;

    #[tokio::test]
    async fn status_tracks_initialization() {
        let source = source_file("Support is open nine to five.");
        let embedder = Arc::new(ScriptedEmbedder::new(vec![1.0]));
        let retrieval = RetrievalService::new(embedder, source.path());

        let before = knowledge_status(&retrieval);
        assert!(!before.initialized);
        assert_eq!(before.chunks, 0);

        let after = initialize_knowledge_base(&retrieval).await.unwrap();
        assert!(after.initialized);
        assert!(after.available);
        assert_eq!(after.chunks, 1);
    }
}
