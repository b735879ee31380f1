use crate::error::AssistError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Which embedding backend turns text into vectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Ollama embedding model over HTTP
    Ollama,
    /// Deterministic feature hashing, no model required
    Hashing,
}

impl FromStr for EmbeddingProvider {
    type Err = AssistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "hashing" => Ok(Self::Hashing),
            other => Err(AssistError::config(format!(
                "Unknown embedding provider '{}' (expected 'ollama' or 'hashing')",
                other
            ))),
        }
    }
}

/// Call assistant application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory for the source dataset
    pub data_dir: PathBuf,

    /// Source dataset file (JSON array of records)
    pub dataset_path: PathBuf,

    /// Directory holding the persisted index/record store pair
    pub index_dir: PathBuf,

    /// Embedding backend
    pub embedding_provider: EmbeddingProvider,

    /// Embedding model name
    pub embedding_model: String,

    /// Vector dimension for the hashing provider
    pub embedding_dim: usize,

    /// Texts per embedding request during index build
    pub embed_batch_size: usize,

    /// Ollama API base URL
    pub ollama_base_url: String,

    /// Fallback generation model name
    pub llm_model: String,

    /// Similarity above which a dataset match is served directly
    pub similarity_threshold: f32,

    /// Defer to the generative model when no confident match exists
    pub fallback_enabled: bool,

    /// Pass the nearest record's answer to the generative model as context
    pub fallback_context: bool,

    /// Maximum tokens generated by the fallback model
    pub max_new_tokens: i32,

    /// HTTP and query-time embedding timeout
    pub request_timeout_secs: u64,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            dataset_path: PathBuf::from("./data/bfsi_dataset.json"),
            index_dir: PathBuf::from("./models"),
            embedding_provider: EmbeddingProvider::Ollama,
            embedding_model: "all-minilm".to_string(),
            embedding_dim: 384,
            embed_batch_size: 32,
            ollama_base_url: "http://localhost:11434".to_string(),
            llm_model: "tinyllama".to_string(),
            similarity_threshold: 0.7,
            fallback_enabled: true,
            fallback_context: true,
            max_new_tokens: 100,
            request_timeout_secs: 30,
            log_dir: PathBuf::from("./logs"),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, AssistError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        let defaults = Self::default();
        let data_dir = Self::get_env_path("DATA_DIR").unwrap_or(defaults.data_dir);
        let dataset_path = Self::get_env_path("DATASET_PATH")
            .unwrap_or_else(|| data_dir.join("bfsi_dataset.json"));

        let config = Self {
            data_dir,
            dataset_path,
            index_dir: Self::get_env_path("INDEX_DIR").unwrap_or(defaults.index_dir),
            embedding_provider: match std::env::var("EMBEDDING_PROVIDER") {
                Ok(value) => value.parse()?,
                Err(_) => defaults.embedding_provider,
            },
            embedding_model: std::env::var("EMBEDDING_MODEL")
                .unwrap_or(defaults.embedding_model),
            embedding_dim: Self::get_env_parsed("EMBEDDING_DIM")
                .unwrap_or(defaults.embedding_dim),
            embed_batch_size: Self::get_env_parsed("EMBED_BATCH_SIZE")
                .unwrap_or(defaults.embed_batch_size),
            ollama_base_url: std::env::var("OLLAMA_BASE_URL")
                .unwrap_or(defaults.ollama_base_url),
            llm_model: std::env::var("LLM_MODEL").unwrap_or(defaults.llm_model),
            similarity_threshold: Self::get_env_parsed("SIMILARITY_THRESHOLD")
                .unwrap_or(defaults.similarity_threshold),
            fallback_enabled: Self::get_env_bool("FALLBACK_ENABLED")
                .unwrap_or(defaults.fallback_enabled),
            fallback_context: Self::get_env_bool("FALLBACK_CONTEXT")
                .unwrap_or(defaults.fallback_context),
            max_new_tokens: Self::get_env_parsed("MAX_NEW_TOKENS")
                .unwrap_or(defaults.max_new_tokens),
            request_timeout_secs: Self::get_env_parsed("REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout_secs),
            log_dir: Self::get_env_path("LOG_DIR").unwrap_or(defaults.log_dir),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
        };

        config.validate()?;

        Ok(config)
    }

    /// Get PathBuf from environment variable
    fn get_env_path(key: &str) -> Option<PathBuf> {
        std::env::var(key).ok().map(PathBuf::from)
    }

    /// Get a parsed value from environment variable, ignoring malformed values
    fn get_env_parsed<T: FromStr>(key: &str) -> Option<T> {
        std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
    }

    /// Get a boolean flag from environment variable
    fn get_env_bool(key: &str) -> Option<bool> {
        std::env::var(key).ok().and_then(|s| parse_bool(&s))
    }

    /// Ensure required directories exist, create if not
    pub fn ensure_directories(&self) -> Result<(), AssistError> {
        let dirs = vec![&self.data_dir, &self.index_dir, &self.log_dir];

        for dir in dirs {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    AssistError::config(format!(
                        "Failed to create directory {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(())
    }

    /// Query-time timeout as a Duration
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), AssistError> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(AssistError::config(format!(
                "Similarity threshold must be within [0, 1], got {}",
                self.similarity_threshold
            )));
        }

        if self.embed_batch_size == 0 {
            return Err(AssistError::config("Embedding batch size cannot be 0"));
        }

        if self.embedding_dim == 0 {
            return Err(AssistError::config("Embedding dimension cannot be 0"));
        }

        if self.request_timeout_secs == 0 {
            return Err(AssistError::config("Request timeout cannot be 0"));
        }

        if self.max_new_tokens <= 0 {
            return Err(AssistError::config("Max new tokens must be positive"));
        }

        if self.embedding_model.trim().is_empty() {
            return Err(AssistError::config("Embedding model name cannot be empty"));
        }

        if self.llm_model.trim().is_empty() {
            return Err(AssistError::config("LLM model name cannot be empty"));
        }

        crate::logger::parse_log_level(&self.log_level)?;

        // Validate Ollama URL
        if !self.ollama_base_url.starts_with("http://")
            && !self.ollama_base_url.starts_with("https://") {
            return Err(AssistError::config(
                "Ollama base URL must start with http:// or https://"
            ));
        }

        Ok(())
    }
}

/// Parse a boolean flag ("true"/"false", "1"/"0", "yes"/"no", "on"/"off")
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.similarity_threshold, 0.7);
        assert_eq!(config.embedding_provider, EmbeddingProvider::Ollama);
        assert_eq!(config.dataset_path, PathBuf::from("./data/bfsi_dataset.json"));
        assert!(config.fallback_enabled);
    }

    #[test]
    fn test_validate() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());

        let mut invalid = AppConfig::default();
        invalid.similarity_threshold = 1.5;
        assert!(invalid.validate().is_err());

        let mut invalid = AppConfig::default();
        invalid.embed_batch_size = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = AppConfig::default();
        invalid.ollama_base_url = "localhost:11434".to_string();
        assert!(invalid.validate().is_err());

        let mut invalid = AppConfig::default();
        invalid.llm_model = "  ".to_string();
        assert!(invalid.validate().is_err());

        let mut invalid = AppConfig::default();
        invalid.log_level = "verbose".to_string();
        assert!(matches!(invalid.validate(), Err(AssistError::Config(_))));
    }

    #[test]
    fn test_embedding_provider_parse() {
        assert_eq!("ollama".parse::<EmbeddingProvider>().unwrap(), EmbeddingProvider::Ollama);
        assert_eq!(" Hashing ".parse::<EmbeddingProvider>().unwrap(), EmbeddingProvider::Hashing);
        assert!("faiss".parse::<EmbeddingProvider>().is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("OFF"), Some(false));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_ensure_directories() {
        let root = tempfile::tempdir().unwrap();
        let config = AppConfig {
            data_dir: root.path().join("data"),
            index_dir: root.path().join("models"),
            log_dir: root.path().join("logs"),
            ..AppConfig::default()
        };

        config.ensure_directories().unwrap();
        assert!(config.data_dir.is_dir());
        assert!(config.index_dir.is_dir());
        assert!(config.log_dir.is_dir());
    }
}
