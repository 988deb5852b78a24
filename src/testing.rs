//! Test doubles for the embedding and generation capabilities.

use crate::embedding::Embedder;
use crate::llm::{Generator, LlmError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::NamedTempFile;

pub fn source_file(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

/// Returns a fixed vector per exact text, `fallback` otherwise.
pub struct ScriptedEmbedder {
    vectors: HashMap<String, Vec<f64>>,
    fallback: Vec<f64>,
    quota_from: Option<usize>,
    calls: AtomicUsize,
}

impl ScriptedEmbedder {
    pub fn new(fallback: Vec<f64>) -> Self {
        Self {
            vectors: HashMap::new(),
            fallback,
            quota_from: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, text: &str, vector: Vec<f64>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    /// Fail with quota exhaustion from the `n`th call (zero-based) onwards.
    pub fn quota_from_call(mut self, n: usize) -> Self {
        self.quota_from = Some(n);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for ScriptedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, LlmError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.quota_from.is_some_and(|n| call >= n) {
            return Err(LlmError::QuotaExceeded);
        }
        Ok(self
            .vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone()))
    }
}

/// Records every prompt and answers with a canned reply.
pub struct RecordingGenerator {
    reply: Option<String>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl RecordingGenerator {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn out_of_quota() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// `(prompt, system_instructions)` pairs in call order.
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn generate(&self, prompt: &str, system_instructions: &str) -> Result<String, LlmError> {
        self.prompts
            .lock()
            .unwrap()
            .push((prompt.to_string(), system_instructions.to_string()));
        self.reply.clone().ok_or(LlmError::QuotaExceeded)
    }
}
