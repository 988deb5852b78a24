pub mod chat;
pub mod commands;
pub mod config;
pub mod db;
pub mod doc_processor;
pub mod embedding;
pub mod error;
pub mod escalation;
pub mod index;
pub mod llm;
pub mod rag;

#[cfg(test)]
mod testing;

use chat::ChatService;
use config::Config;
use db::Database;
use rag::RetrievalService;
use std::sync::Arc;

/// Process-wide handles shared by every request.
pub struct AppState {
    pub config: Config,
    pub db: Arc<Database>,
    pub retrieval: Arc<RetrievalService>,
    pub chat: ChatService,
}

impl AppState {
    pub fn new(config: Config) -> error::Result<Self> {
        let db = Arc::new(Database::open(&config.database.path)?);
        let retrieval = Arc::new(
            RetrievalService::new(Arc::new(config.embedder()), config.retrieval.source_path.clone())
                .with_chunking(config.retrieval.chunk_size, config.retrieval.overlap),
        );
        let chat = ChatService::new(db.clone(), retrieval.clone(), Arc::new(config.generator()))
            .with_threshold(config.retrieval.similarity_threshold);
        Ok(Self {
            config,
            db,
            retrieval,
            chat,
        })
    }
}
