/// Call assistant error types
#[derive(Debug, thiserror::Error)]
pub enum AssistError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Embedding provider error
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector index error
    #[error("Vector index error: {0}")]
    Index(String),

    /// Persisted artifacts disagree with each other or with the embedder
    #[error("Consistency error: {0}")]
    Consistency(String),

    /// Vector dimension does not match the index dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Source dataset missing, unreadable or empty
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// LLM related error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Network/HTTP error
    #[error("Network error: {0}")]
    Network(String),

    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General error (anyhow integration)
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AssistError {
    /// Create config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create embedding error
    pub fn embedding<S: Into<String>>(msg: S) -> Self {
        Self::Embedding(msg.into())
    }

    /// Create vector index error
    pub fn index<S: Into<String>>(msg: S) -> Self {
        Self::Index(msg.into())
    }

    /// Create consistency error
    pub fn consistency<S: Into<String>>(msg: S) -> Self {
        Self::Consistency(msg.into())
    }

    /// Create dataset error
    pub fn dataset<S: Into<String>>(msg: S) -> Self {
        Self::Dataset(msg.into())
    }

    /// Create LLM error
    pub fn llm<S: Into<String>>(msg: S) -> Self {
        Self::Llm(msg.into())
    }

    /// Create network error
    pub fn network<S: Into<String>>(msg: S) -> Self {
        Self::Network(msg.into())
    }

    /// Create not found error
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create internal error
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error means the artifacts must not be served at all
    pub fn is_consistency(&self) -> bool {
        matches!(self, Self::Consistency(_) | Self::DimensionMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consistency_classification() {
        assert!(AssistError::consistency("count mismatch").is_consistency());
        assert!(AssistError::DimensionMismatch { expected: 384, actual: 768 }.is_consistency());
        assert!(!AssistError::dataset("empty").is_consistency());
        assert!(!AssistError::embedding("model missing").is_consistency());
    }

    #[test]
    fn test_display() {
        let err = AssistError::DimensionMismatch { expected: 384, actual: 768 };
        assert_eq!(err.to_string(), "Dimension mismatch: expected 384, got 768");
        assert_eq!(
            AssistError::dataset("no records").to_string(),
            "Dataset error: no records"
        );
    }
}
