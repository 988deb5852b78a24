pub mod claude;
pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Sampling temperature for grounded answers.
pub const TEMPERATURE: f32 = 0.7;
/// Upper bound on generated answer length.
pub const MAX_TOKENS: u32 = 500;

/// Reply used when the provider answers with empty content.
pub const EMPTY_COMPLETION_REPLY: &str = "I was unable to generate a response.";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
}

/// Prompt-to-text capability used by the chat orchestrator.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str, system_instructions: &str) -> Result<String, LlmError>;
}

/// Unified LLM provider enum; dispatches to OpenAI-compatible or Claude backends.
#[derive(Debug, Clone)]
pub enum Provider {
    OpenAi(openai::OpenAiConfig),
    Claude(claude::ClaudeConfig),
    Ollama(openai::OpenAiConfig),
}

impl Provider {
    pub fn openai(api_key: String) -> Self {
        Provider::OpenAi(openai::OpenAiConfig {
            api_key,
            base_url: "https://api.openai.com/v1".to_string(),
        })
    }

    pub fn claude(api_key: String) -> Self {
        Provider::Claude(claude::ClaudeConfig {
            api_key,
            base_url: "https://api.anthropic.com".to_string(),
        })
    }

    pub fn ollama(host: String) -> Self {
        Provider::Ollama(openai::OpenAiConfig {
            api_key: String::new(),
            base_url: format!("{}/v1", host),
        })
    }

    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        match self {
            Provider::OpenAi(config) | Provider::Ollama(config) => {
                openai::chat(config, request).await
            }
            Provider::Claude(config) => claude::chat(config, request).await,
        }
    }
}

/// A provider bound to one chat model.
#[derive(Debug, Clone)]
pub struct ProviderGenerator {
    provider: Provider,
    model: String,
}

impl ProviderGenerator {
    pub fn new(provider: Provider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Generator for ProviderGenerator {
    async fn generate(&self, prompt: &str, system_instructions: &str) -> Result<String, LlmError> {
        let request = ChatRequest {
            messages: vec![ChatMessage::system(system_instructions), ChatMessage::user(prompt)],
            model: self.model.clone(),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };
        let response = self.provider.chat(&request).await?;
        if response.content.trim().is_empty() {
            return Ok(EMPTY_COMPLETION_REPLY.to_string());
        }
        Ok(response.content)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("provider quota exceeded")]
    QuotaExceeded,
}

impl Serialize for LlmError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Turn a non-success response into an [`LlmError`].
///
/// Rate limiting (429) and exhausted credit (`insufficient_quota`) both
/// surface as [`LlmError::QuotaExceeded`].
pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status().as_u16();
    let text = resp.text().await.unwrap_or_default();
    if status == 429 || text.contains("insufficient_quota") {
        return Err(LlmError::QuotaExceeded);
    }
    Err(LlmError::Api {
        status,
        message: text,
    })
}
