use async_trait::async_trait;
use callassist_common::{AssistError, Result};
use reqwest::Client;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::llm_trait::LlmClient;
use crate::types::{
    BatchEmbedRequest, BatchEmbedResponse, EmbedRequest, EmbedResponse, GenerateRequest,
    GenerateResponse, TagsResponse,
};

const MAX_RETRIES: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Ollama API client
#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: String,
    client: Client,
}

impl OllamaClient {
    /// Create new Ollama client
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AssistError::network(format!("Failed to create HTTP client: {}", e)))?;

        info!("Ollama client initialized: {} (timeout {:?})", base_url, timeout);
        Ok(Self { base_url, client })
    }

    /// Base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Generate text with Ollama (with retry logic)
    pub async fn generate(&self, request: GenerateRequest) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        debug!(
            "Sending generate request to Ollama - Model: {}, Prompt length: {}",
            request.model,
            request.prompt.len()
        );

        let response = with_retry("generate", MAX_RETRIES, RETRY_BASE_DELAY, || self.try_generate(&url, &request)).await?;
        debug!("Received response from Ollama - Length: {}", response.len());
        Ok(response)
    }

    /// Single attempt to generate text
    async fn try_generate(&self, url: &str, request: &GenerateRequest) -> Result<String> {
        let mut request = request.clone();
        request.stream = Some(false);

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AssistError::network(format!("Failed to send request: {}", e)))?
            .error_for_status()
            .map_err(|e| AssistError::llm(format!("Ollama API error: {}", e)))?;

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AssistError::llm(format!("Failed to parse response: {}", e)))?;

        if result.response.is_empty() {
            return Err(AssistError::llm("Empty response from Ollama"));
        }

        Ok(result.response)
    }

    /// Generate embedding for text (with retry logic)
    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        debug!("Generating embedding - Model: {}, Text length: {}", model, text.len());

        let request = EmbedRequest {
            model: model.to_string(),
            prompt: text.to_string(),
        };

        // An empty vector is a deterministic answer (Ollama returns one for an
        // empty prompt), so it is rejected after the retry loop, not inside it
        let embedding = with_retry("embedding", MAX_RETRIES, RETRY_BASE_DELAY, || self.try_embed(&url, &request)).await?;
        let embedding = non_empty_embedding(embedding)?;
        debug!("Received embedding - Dimension: {}", embedding.len());
        Ok(embedding)
    }

    /// Single attempt to generate embedding
    async fn try_embed(&self, url: &str, request: &EmbedRequest) -> Result<Vec<f32>> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| AssistError::network(format!("Failed to send embedding request: {}", e)))?
            .error_for_status()
            .map_err(|e| AssistError::embedding(format!("Ollama embedding API error: {}", e)))?;

        let result: EmbedResponse = response
            .json()
            .await
            .map_err(|e| AssistError::embedding(format!("Failed to parse embedding response: {}", e)))?;

        Ok(result.embedding)
    }

    /// Generate embeddings for a batch of texts (with retry logic)
    pub async fn embed_batch(&self, model: &str, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/api/embed", self.base_url);
        debug!("Generating batch embeddings - Model: {}, Texts: {}", model, texts.len());

        let request = BatchEmbedRequest {
            model: model.to_string(),
            input: texts.to_vec(),
        };

        let embeddings =
            with_retry("batch embedding", MAX_RETRIES, RETRY_BASE_DELAY, || self.try_embed_batch(&url, &request)).await?;

        if embeddings.len() != texts.len() {
            return Err(AssistError::embedding(format!(
                "Ollama returned {} embeddings for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }

        Ok(embeddings)
    }

    /// Single attempt to generate batch embeddings
    async fn try_embed_batch(&self, url: &str, request: &BatchEmbedRequest) -> Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| AssistError::network(format!("Failed to send embedding request: {}", e)))?
            .error_for_status()
            .map_err(|e| AssistError::embedding(format!("Ollama embedding API error: {}", e)))?;

        let result: BatchEmbedResponse = response
            .json()
            .await
            .map_err(|e| AssistError::embedding(format!("Failed to parse embedding response: {}", e)))?;

        Ok(result.embeddings)
    }

    /// List locally available models
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AssistError::network(format!("Failed to connect to Ollama: {}", e)))?
            .error_for_status()
            .map_err(|e| AssistError::llm(format!("Ollama API error: {}", e)))?;

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| AssistError::llm(format!("Failed to parse model list: {}", e)))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, request: GenerateRequest) -> Result<String> {
        OllamaClient::generate(self, request).await
    }

    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        OllamaClient::embed(self, model, text).await
    }

    async fn embed_batch(&self, model: &str, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        OllamaClient::embed_batch(self, model, texts).await
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        OllamaClient::list_models(self).await
    }
}

fn non_empty_embedding(embedding: Vec<f32>) -> Result<Vec<f32>> {
    if embedding.is_empty() {
        return Err(AssistError::embedding("Empty embedding from Ollama"));
    }
    Ok(embedding)
}

/// Run an operation up to `max_retries` times with exponential backoff
async fn with_retry<T, F, Fut>(
    what: &str,
    max_retries: u32,
    base_delay: Duration,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut last_error = None;

    for attempt in 1..=max_retries {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt < max_retries {
                    let delay = base_delay * 2u32.pow(attempt - 1);
                    warn!(
                        "Ollama {} request failed (attempt {}/{}): {}. Retrying in {:?}...",
                        what, attempt, max_retries, e, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| AssistError::internal(format!("All {} retries failed", what))))
}
