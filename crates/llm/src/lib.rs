//! Call assistant LLM integration
//!
//! Ollama API client (generation and embeddings) and the fallback
//! generation capability used when no dataset answer is confident enough.

mod client;
mod fallback;
mod llm_trait;
mod prompts;
mod types;

pub use client::OllamaClient;
pub use fallback::{Fallback, FallbackModel, MODEL_UNAVAILABLE_MESSAGE};
pub use llm_trait::LlmClient;
pub use prompts::{answer_prompt, strip_prompt_echo};
pub use types::{
    BatchEmbedRequest, BatchEmbedResponse, EmbedRequest, EmbedResponse, GenerateOptions,
    GenerateRequest, GenerateResponse, ModelTag, TagsResponse,
};
