use async_trait::async_trait;
use callassist_common::{AppConfig, AssistError, EmbeddingProvider, Result};
use callassist_llm::{LlmClient, OllamaClient};
use std::sync::Arc;
use tracing::{info, warn};

use crate::hashing::HashingEmbedder;
use crate::similarity::l2_norm;

/// Text sent once at startup to learn the model's dimension
const PROBE_TEXT: &str = "dimension probe";

/// Stand-in for blank text; Ollama answers an empty prompt with no vector
const BLANK_TEXT: &str = "<empty>";

/// Text to fixed-dimension vector
///
/// Implementations must be deterministic for a fixed model and must accept
/// any string, including the empty one.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier recorded in the index manifest
    fn model_name(&self) -> &str;

    /// Length of every vector this embedder produces
    fn dimension(&self) -> usize;

    /// Embed one text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, one vector per text in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }
}

/// Embedder backed by an Ollama embedding model
pub struct OllamaEmbedder {
    client: Arc<dyn LlmClient>,
    model: String,
    dimension: usize,
}

impl OllamaEmbedder {
    /// Probe the model once and fix its dimension
    ///
    /// Failure here means the embedder is unusable; callers treat it as a
    /// startup condition, never as a per-query error.
    pub async fn connect(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Result<Self> {
        let model = model.into();
        let probe = client.embed(&model, PROBE_TEXT).await.map_err(|e| {
            AssistError::embedding(format!("Embedding model '{}' unavailable: {}", model, e))
        })?;

        if probe.is_empty() {
            return Err(AssistError::embedding(format!(
                "Embedding model '{}' returned an empty vector",
                model
            )));
        }

        let norm = l2_norm(&probe);
        if (norm - 1.0).abs() > 1e-3 {
            warn!(
                "Embedding model '{}' is not unit-normalized (probe norm {:.4}); vectors are re-normalized",
                model, norm
            );
        }

        info!("Embedding model ready: {} (dimension {})", model, probe.len());
        Ok(Self {
            client,
            model,
            dimension: probe.len(),
        })
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimension {
            return Err(AssistError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.client.embed(&self.model, encodable(text)).await?;
        self.check_dimension(&vector)?;
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let texts: Vec<String> = texts.iter().map(|t| encodable(t).to_string()).collect();
        let vectors = self.client.embed_batch(&self.model, &texts).await?;
        for vector in &vectors {
            self.check_dimension(vector)?;
        }
        Ok(vectors)
    }
}

/// Blank text maps to a fixed placeholder so it still gets a vector
fn encodable(text: &str) -> &str {
    if text.trim().is_empty() {
        BLANK_TEXT
    } else {
        text
    }
}

/// Construct the configured embedder
pub async fn embedder_from_config(config: &AppConfig) -> Result<Arc<dyn Embedder>> {
    match config.embedding_provider {
        EmbeddingProvider::Hashing => {
            info!("Using hashing embedder (dimension {})", config.embedding_dim);
            Ok(Arc::new(HashingEmbedder::new(config.embedding_dim)))
        }
        EmbeddingProvider::Ollama => {
            let client = OllamaClient::new(&config.ollama_base_url, config.request_timeout())?;
            let embedder = OllamaEmbedder::connect(Arc::new(client), &config.embedding_model).await?;
            Ok(Arc::new(embedder))
        }
    }
}
