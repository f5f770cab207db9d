//! Embedding generation.
//!
//! Two backends behind [`EmbedBackend`]: the OpenAI embeddings API and a
//! deterministic local hashing embedder for tests and offline use. All
//! vectors from one backend instance share dimensionality; the pipeline
//! discovers it from the first embedding of an ingestion batch.

use async_openai::{
    config::OpenAIConfig,
    types::{CreateEmbeddingRequestArgs, EmbeddingInput},
    Client as OpenAIClient,
};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Longest text sent to the embeddings API, in bytes.
const MAX_EMBED_INPUT: usize = 8000;

/// Embedding service backed by the OpenAI API.
#[derive(Debug)]
pub struct EmbeddingService {
    client: OpenAIClient<OpenAIConfig>,
    model: String,
}

impl EmbeddingService {
    /// Create a new embedding service.
    pub fn new(api_key: &str, model: impl Into<String>) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(Error::Configuration(
                "OpenAI API key is empty".to_string(),
            ));
        }

        let config = OpenAIConfig::new().with_api_key(api_key);
        Ok(Self {
            client: OpenAIClient::with_config(config),
            model: model.into(),
        })
    }

    /// Generate an embedding for a single text.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("no embedding returned".to_string()))
    }

    /// Generate embeddings for multiple texts in one API call.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("Generating embeddings for {} texts", texts.len());

        let processed: Vec<String> = texts
            .iter()
            .map(|t| {
                let trimmed = t.trim();
                let mut end = trimmed.len().min(MAX_EMBED_INPUT);
                while end < trimmed.len() && !trimmed.is_char_boundary(end) {
                    end -= 1;
                }
                trimmed[..end].to_string()
            })
            .collect();

        if processed.iter().any(|t| t.is_empty()) {
            return Err(Error::Embedding(
                "cannot embed an empty text".to_string(),
            ));
        }

        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.model)
            .input(EmbeddingInput::StringArray(processed))
            .build()
            .map_err(|e| Error::Embedding(e.to_string()))?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(|e| Error::Embedding(e.to_string()))?;

        if response.data.len() != texts.len() {
            return Err(Error::Embedding(format!(
                "backend returned {} embeddings for {} texts",
                response.data.len(),
                texts.len()
            )));
        }

        info!(
            "Generated {} embeddings, tokens used: {}",
            response.data.len(),
            response.usage.total_tokens
        );

        let vectors: Vec<Vec<f32>> = response.data.into_iter().map(|d| d.embedding).collect();
        if vectors.iter().any(|v| v.is_empty()) {
            return Err(Error::Embedding(
                "backend returned an empty embedding".to_string(),
            ));
        }

        Ok(vectors)
    }
}

/// Deterministic, fast embedding for offline/local use.
#[derive(Debug, Clone)]
pub struct LocalEmbedder {
    dim: usize,
}

impl LocalEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(8) }
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut vec = vec![0.0f32; self.dim];
        for token in text.split_whitespace() {
            let mut hasher = DefaultHasher::new();
            token.to_lowercase().hash(&mut hasher);
            let idx = (hasher.finish() as usize) % self.dim;
            vec[idx] += 1.0;
        }

        normalize(&mut vec);
        vec
    }

    pub fn dimension(&self) -> usize {
        self.dim
    }
}

/// Embedding backend used by the pipeline.
pub enum EmbedBackend {
    OpenAI(EmbeddingService),
    Local(LocalEmbedder),
}

impl EmbedBackend {
    /// Embed a batch of texts, preserving order.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        match self {
            EmbedBackend::OpenAI(service) => service.embed_batch(texts).await,
            EmbedBackend::Local(local) => Ok(texts.iter().map(|t| local.embed(t)).collect()),
        }
    }

    /// Embed a single query text.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        match self {
            EmbedBackend::OpenAI(service) => service.embed(text).await,
            EmbedBackend::Local(local) => Ok(local.embed(text)),
        }
    }
}

fn normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vec.iter_mut() {
            *v /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_rejects_empty_api_key() {
        let err = EmbeddingService::new("   ", "text-embedding-3-small").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[tokio::test]
    async fn embed_batch_rejects_empty_texts() {
        let service = EmbeddingService::new("test_key", "text-embedding-3-small").unwrap();
        let err = service
            .embed_batch(&["ok".to_string(), "   ".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Embedding(_)));
    }

    #[tokio::test]
    async fn embed_batch_empty_input_is_empty_output() {
        let service = EmbeddingService::new("test_key", "text-embedding-3-small").unwrap();
        let embeddings = service.embed_batch(&[]).await.unwrap();
        assert!(embeddings.is_empty());
    }

    #[test]
    fn local_embedder_produces_consistent_embeddings() {
        let embedder = LocalEmbedder::new(64);
        let text = "hello world rust programming";

        let emb1 = embedder.embed(text);
        let emb2 = embedder.embed(text);

        assert_eq!(emb1, emb2);
        assert_eq!(emb1.len(), 64);
    }

    #[test]
    fn local_embedder_different_texts_different_embeddings() {
        let embedder = LocalEmbedder::new(64);

        let emb1 = embedder.embed("hello world");
        let emb2 = embedder.embed("goodbye world");

        assert_ne!(emb1, emb2);
    }

    #[test]
    fn local_embedder_respects_minimum_dimension() {
        let embedder = LocalEmbedder::new(0);
        assert_eq!(embedder.dimension(), 8);
    }

    #[test]
    fn local_embedder_empty_text_is_zero_vector() {
        let embedder = LocalEmbedder::new(32);
        let emb = embedder.embed("");

        assert_eq!(emb.len(), 32);
        assert!(emb.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn normalize_scales_vector_to_unit_length() {
        let mut vec = vec![3.0, 4.0];
        normalize(&mut vec);
        let norm = (vec[0].powi(2) + vec[1].powi(2)).sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_leaves_zero_vector_alone() {
        let mut vec = vec![0.0, 0.0, 0.0];
        normalize(&mut vec);
        assert!(vec.iter().all(|&v| v == 0.0));
    }

    #[tokio::test]
    async fn backend_local_embeds_in_order() {
        let backend = EmbedBackend::Local(LocalEmbedder::new(16));
        let texts = vec!["one".to_string(), "two".to_string()];

        let vectors = backend.embed_batch(&texts).await.unwrap();

        assert_eq!(vectors.len(), 2);
        assert_eq!(vectors[0], LocalEmbedder::new(16).embed("one"));
        assert_eq!(vectors[1], LocalEmbedder::new(16).embed("two"));
    }

    #[tokio::test]
    #[ignore] // Requires API key
    async fn live_embed_single() {
        dotenvy::dotenv().ok();
        let key = std::env::var("OPENAI_API_KEY").unwrap();
        let service = EmbeddingService::new(&key, "text-embedding-3-small").unwrap();
        let embedding = service.embed("Hello, world!").await.unwrap();
        assert_eq!(embedding.len(), 1536);
    }
}
