//! Chat orchestration: escalation gate, retrieval, grounded generation.

use crate::db::models::Settings;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::escalation::{self, Gate};
use crate::llm::Generator;
use crate::rag::RetrievalService;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// Minimum cosine similarity for a chunk to ground an answer.
pub const SIMILARITY_THRESHOLD: f64 = 0.7;

pub const AWAITING_HUMAN_NOTICE: &str =
    "This conversation requires human intervention. Please wait for an admin to respond.";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatReply {
    pub response: String,
    pub needs_human: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Context: {}\n\nUser question: {}\n\nAnswer using only the context.",
        context, question
    )
}

pub struct ChatService {
    db: Arc<Database>,
    retrieval: Arc<RetrievalService>,
    generator: Arc<dyn Generator>,
    threshold: f64,
}

impl ChatService {
    pub fn new(
        db: Arc<Database>,
        retrieval: Arc<RetrievalService>,
        generator: Arc<dyn Generator>,
    ) -> Self {
        Self {
            db,
            retrieval,
            generator,
            threshold: SIMILARITY_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Answer one user message and append the outcome to the conversation.
    ///
    /// Quota exhaustion anywhere in retrieval or generation is answered
    /// with the configured fallback message.
    pub async fn respond(&self, conversation_id: &str, message: &str) -> Result<ChatReply> {
        if conversation_id.trim().is_empty() || message.trim().is_empty() {
            return Err(Error::InvalidInput(
                "message and conversation_id are required".into(),
            ));
        }

        if let Gate::AwaitingHuman { newly_escalated, .. } =
            escalation::gate(&self.db, conversation_id, message)?
        {
            return Ok(ChatReply {
                response: String::new(),
                needs_human: true,
                notice: (!newly_escalated).then(|| AWAITING_HUMAN_NOTICE.to_string()),
            });
        }

        let settings = self.db.settings()?;
        let response = match self.answer(message, &settings).await {
            Ok(response) => response,
            Err(e) if e.is_quota() => {
                warn!(conversation_id, "provider quota exceeded; sending fallback message");
                settings.fallback_message
            }
            Err(e) => return Err(e),
        };

        self.db
            .append_message(conversation_id, message, &response, false, None)?;

        Ok(ChatReply {
            response,
            needs_human: false,
            notice: None,
        })
    }

    async fn answer(&self, message: &str, settings: &Settings) -> Result<String> {
        match self.retrieval.find_relevant(message, self.threshold).await? {
            Some(hit) if hit.clears(self.threshold) => {
                debug!(similarity = hit.similarity, chunk = hit.index, "grounding answer");
                let prompt = build_prompt(&hit.text, message);
                Ok(self
                    .generator
                    .generate(&prompt, &settings.tone_instructions)
                    .await?)
            }
            _ => Ok(settings.fallback_message.clone()),
        }
    }
}
