use callassist_common::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::llm_trait::LlmClient;
use crate::prompts::{answer_prompt, strip_prompt_echo};
use crate::types::{GenerateOptions, GenerateRequest};

/// Reply served when the generative model could not be loaded
pub const MODEL_UNAVAILABLE_MESSAGE: &str =
    "Based on my training, I can answer general BFSI queries. (Model not loaded)";

/// A loaded generative model ready to answer queries
pub struct FallbackModel {
    client: Arc<dyn LlmClient>,
    model: String,
    options: GenerateOptions,
}

impl FallbackModel {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>, options: GenerateOptions) -> Self {
        Self {
            client,
            model: model.into(),
            options,
        }
    }
}

/// Generative fallback capability, decided once at startup
pub enum Fallback {
    Available(FallbackModel),
    Unavailable { reason: String },
}

impl Fallback {
    /// Default sampling options: `top_k = 10`, `num_predict = max_new_tokens`
    pub fn default_options(max_new_tokens: i32) -> GenerateOptions {
        GenerateOptions {
            top_k: Some(10),
            num_predict: Some(max_new_tokens),
            ..Default::default()
        }
    }

    /// Check the backend for `model` and settle the capability state
    ///
    /// The model counts as present when a listed name equals it or equals it
    /// plus a `:tag` suffix.
    pub async fn connect(client: Arc<dyn LlmClient>, model: &str, options: GenerateOptions) -> Self {
        let models = match client.list_models().await {
            Ok(models) => models,
            Err(e) => {
                warn!("Fallback model unavailable, backend unreachable: {}", e);
                return Self::Unavailable {
                    reason: format!("backend unreachable: {}", e),
                };
            }
        };

        let loaded = models
            .iter()
            .any(|name| name == model || name.strip_prefix(model).is_some_and(|rest| rest.starts_with(':')));

        if loaded {
            info!("Fallback model ready: {}", model);
            Self::Available(FallbackModel::new(client, model, options))
        } else {
            warn!("Fallback model '{}' not found among {} local models", model, models.len());
            Self::Unavailable {
                reason: format!("model '{}' is not installed", model),
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Answer `query`, grounded on `context` when given
    ///
    /// `Unavailable` answers with [`MODEL_UNAVAILABLE_MESSAGE`].
    pub async fn generate(&self, query: &str, context: Option<&str>) -> Result<String> {
        let model = match self {
            Self::Available(model) => model,
            Self::Unavailable { reason } => {
                debug!("Serving canned fallback reply ({})", reason);
                return Ok(MODEL_UNAVAILABLE_MESSAGE.to_string());
            }
        };

        let prompt = answer_prompt(query, context);
        let request = GenerateRequest {
            model: model.model.clone(),
            prompt: prompt.clone(),
            stream: Some(false),
            options: Some(model.options.clone()),
        };

        let generated = model.client.generate(request).await?;
        Ok(strip_prompt_echo(&generated, &prompt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use callassist_common::AssistError;
    use std::sync::Mutex;

    struct StubClient {
        models: Vec<String>,
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl StubClient {
        fn new(models: &[&str], reply: &str) -> Arc<Self> {
            Arc::new(Self {
                models: models.iter().map(|m| m.to_string()).collect(),
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl LlmClient for StubClient {
        async fn generate(&self, request: GenerateRequest) -> Result<String> {
            self.prompts.lock().unwrap().push(request.prompt.clone());
            Ok(format!("{} {}", request.prompt, self.reply))
        }

        async fn embed(&self, _model: &str, _text: &str) -> Result<Vec<f32>> {
            Err(AssistError::embedding("not supported"))
        }

        async fn list_models(&self) -> Result<Vec<String>> {
            Ok(self.models.clone())
        }
    }

    struct DownClient;

    #[async_trait]
    impl LlmClient for DownClient {
        async fn generate(&self, _request: GenerateRequest) -> Result<String> {
            Err(AssistError::network("down"))
        }

        async fn embed(&self, _model: &str, _text: &str) -> Result<Vec<f32>> {
            Err(AssistError::network("down"))
        }

        async fn list_models(&self) -> Result<Vec<String>> {
            Err(AssistError::network("connection refused"))
        }
    }

    #[tokio::test]
    async fn test_connect_matches_tagged_model_name() {
        let client = StubClient::new(&["all-minilm:latest", "tinyllama:latest"], "ok");
        let fallback = Fallback::connect(client, "tinyllama", Fallback::default_options(100)).await;
        assert!(fallback.is_available());
    }

    #[tokio::test]
    async fn test_connect_rejects_prefix_only_match() {
        let client = StubClient::new(&["tinyllama-chat:latest"], "ok");
        let fallback = Fallback::connect(client, "tinyllama", Fallback::default_options(100)).await;
        assert!(!fallback.is_available());
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_unavailable() {
        let fallback = Fallback::connect(Arc::new(DownClient), "tinyllama", Fallback::default_options(100)).await;
        assert!(!fallback.is_available());

        let reply = fallback.generate("What is UPI limit?", None).await.unwrap();
        assert_eq!(reply, MODEL_UNAVAILABLE_MESSAGE);
    }

    #[tokio::test]
    async fn test_generate_strips_prompt_and_passes_context() {
        let client = StubClient::new(&["tinyllama"], "The limit is Rs. 1 lakh.");
        let fallback = Fallback::connect(client.clone(), "tinyllama", Fallback::default_options(100)).await;

        let reply = fallback
            .generate("What is UPI limit?", Some("The daily UPI transaction limit is Rs. 1 lakh."))
            .await
            .unwrap();

        assert_eq!(reply, "The limit is Rs. 1 lakh.");
        let prompts = client.prompts.lock().unwrap();
        assert!(prompts[0].starts_with("Context: The daily UPI transaction limit"));
        assert!(prompts[0].ends_with("User Query: What is UPI limit?\nAnswer:"));
    }
}
