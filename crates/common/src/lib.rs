pub mod config;
pub mod error;
pub mod fsutil;
pub mod logger;

// Re-export commonly used types
pub use config::{AppConfig, EmbeddingProvider};
pub use error::AssistError;
pub use fsutil::write_atomic;
pub type Result<T> = std::result::Result<T, AssistError>;
