use callassist_common::{AppConfig, Result};
use callassist_llm::{Fallback, LlmClient, OllamaClient};
use callassist_vector::Retriever;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::types::{Answer, AnswerSource};

/// Reply when neither tier can answer
pub const NO_ANSWER_MESSAGE: &str = "I'm sorry, I couldn't find an answer to your query.";

/// Tier selection knobs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnswerPolicy {
    /// A dataset match is served only when its similarity is strictly above this
    pub threshold: f32,
    /// Defer to the generative model when no confident match exists
    pub fallback_enabled: bool,
    /// Hand the nearest record's answer to the generative model as context
    pub fallback_context: bool,
}

impl Default for AnswerPolicy {
    fn default() -> Self {
        Self {
            threshold: 0.7,
            fallback_enabled: true,
            fallback_context: true,
        }
    }
}

impl AnswerPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            threshold: config.similarity_threshold,
            fallback_enabled: config.fallback_enabled,
            fallback_context: config.fallback_context,
        }
    }
}

/// Owns one retriever and one fallback for the life of the process
pub struct Orchestrator {
    retriever: Arc<Retriever>,
    fallback: Arc<Fallback>,
    policy: AnswerPolicy,
}

impl Orchestrator {
    pub fn new(retriever: Arc<Retriever>, fallback: Arc<Fallback>, policy: AnswerPolicy) -> Self {
        Self {
            retriever,
            fallback,
            policy,
        }
    }

    /// Build both tiers from configuration
    ///
    /// Fails only when the retrieval artifacts are inconsistent; a missing
    /// index or model just leaves that tier degraded.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let retriever = Retriever::load(config).await?;
        if let Retriever::NotReady { reason } = &retriever {
            warn!("Dataset tier not ready: {}", reason);
        }

        let fallback = if config.fallback_enabled {
            match OllamaClient::new(&config.ollama_base_url, config.request_timeout()) {
                Ok(client) => {
                    let client: Arc<dyn LlmClient> = Arc::new(client);
                    Fallback::connect(
                        client,
                        &config.llm_model,
                        Fallback::default_options(config.max_new_tokens),
                    )
                    .await
                }
                Err(e) => Fallback::Unavailable {
                    reason: e.to_string(),
                },
            }
        } else {
            Fallback::Unavailable {
                reason: "fallback disabled".to_string(),
            }
        };

        Ok(Self::new(
            Arc::new(retriever),
            Arc::new(fallback),
            AnswerPolicy::from_config(config),
        ))
    }

    pub fn policy(&self) -> &AnswerPolicy {
        &self.policy
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn fallback(&self) -> &Fallback {
        &self.fallback
    }

    /// Answer one query; never fails
    pub async fn answer(&self, query: &str) -> Answer {
        let retrieval = self.retriever.retrieve(query).await;

        let answer = match retrieval.record {
            Some(record) if retrieval.similarity > self.policy.threshold => {
                Answer::new(AnswerSource::Dataset, record.output.clone(), retrieval.similarity)
            }
            nearest if self.policy.fallback_enabled => {
                let context = nearest
                    .filter(|_| self.policy.fallback_context)
                    .map(|r| r.output.as_str());

                match self.fallback.generate(query, context).await {
                    Ok(text) => Answer::new(AnswerSource::Generated, text, retrieval.similarity),
                    Err(e) => {
                        error!("Fallback generation failed: {}", e);
                        Answer::new(AnswerSource::NoAnswer, NO_ANSWER_MESSAGE, retrieval.similarity)
                    }
                }
            }
            _ => Answer::new(AnswerSource::NoAnswer, NO_ANSWER_MESSAGE, retrieval.similarity),
        };

        info!(
            "Answered query: source={:?}, similarity={:.2}, query={:?}",
            answer.source, answer.similarity, query
        );
        answer
    }
}
