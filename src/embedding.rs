use crate::llm::openai::OpenAiConfig;
use crate::llm::{check_status, LlmError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Text-to-vector capability used to build and query the similarity index.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, LlmError>;
}

#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f64>,
}

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint.
pub struct OpenAiEmbedder {
    client: Client,
    config: OpenAiConfig,
    model: String,
}

impl OpenAiEmbedder {
    pub fn new(config: OpenAiConfig, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            config,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f64>, LlmError> {
        let mut embeddings = generate_embeddings(
            &self.client,
            &self.config,
            &[text.to_string()],
            &self.model,
        )
        .await?;
        if embeddings.is_empty() {
            return Err(LlmError::Parse("embedding response contained no data".into()));
        }
        Ok(embeddings.swap_remove(0))
    }
}

/// Generate embeddings for a list of texts using the OpenAI-compatible API
pub async fn generate_embeddings(
    client: &Client,
    config: &OpenAiConfig,
    texts: &[String],
    model: &str,
) -> Result<Vec<Vec<f64>>, LlmError> {
    let body = EmbeddingRequest {
        model: model.to_string(),
        input: texts.to_vec(),
    };

    let mut req = client
        .post(format!("{}/embeddings", config.base_url))
        .header("Content-Type", "application/json")
        .json(&body);

    if !config.api_key.is_empty() {
        req = req.header("Authorization", format!("Bearer {}", config.api_key));
    }

    let resp = check_status(req.send().await?).await?;

    let data: EmbeddingResponse = resp
        .json()
        .await
        .map_err(|e| LlmError::Parse(e.to_string()))?;
    Ok(data.data.into_iter().map(|d| d.embedding).collect())
}

/// Cosine similarity between two equal-length vectors.
///
/// Zero when either vector has zero norm. The result is clamped to `[-1, 1]`
/// to absorb rounding.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn embedder_for(server: &MockServer) -> OpenAiEmbedder {
        OpenAiEmbedder::new(
            OpenAiConfig {
                api_key: "sk-test".into(),
                base_url: server.uri(),
            },
            "text-embedding-ada-002",
        )
    }

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_similarity_symmetric_and_bounded() {
        let pairs = [
            (vec![0.3, -1.2, 4.5], vec![-2.0, 0.7, 0.1]),
            (vec![1e-3, 1e3, -7.0], vec![5.0, 5.0, 5.0]),
            (vec![1.0, 1.0], vec![-1.0, -1.0]),
        ];
        for (a, b) in &pairs {
            let ab = cosine_similarity(a, b);
            assert_eq!(ab, cosine_similarity(b, a));
            assert!((-1.0..=1.0).contains(&ab));
        }
        assert!((cosine_similarity(&pairs[2].0, &pairs[2].1) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_similarity_zero_norm() {
        let zero = vec![0.0, 0.0, 0.0];
        let a = vec![1.0, 2.0, 3.0];
        assert_eq!(cosine_similarity(&zero, &a), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[tokio::test]
    async fn embed_returns_first_vector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(header("Authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{ "embedding": [0.25, -0.5, 1.0] }]
            })))
            .mount(&server)
            .await;

        let vector = embedder_for(&server).embed("hello").await.unwrap();
        assert_eq!(vector, vec![0.25, -0.5, 1.0]);
    }

    #[tokio::test]
    async fn embed_maps_429_to_quota() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": { "message": "Rate limit reached", "type": "requests" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = embedder_for(&server).embed("hello").await.unwrap_err();
        assert!(matches!(err, LlmError::QuotaExceeded));
    }

    #[tokio::test]
    async fn embed_propagates_other_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = embedder_for(&server).embed("hello").await.unwrap_err();
        assert!(matches!(err, LlmError::Api { status: 500, .. }));
    }
}
