use thiserror::Error;

/// Errors raised by the ingestion and query pipeline.
#[derive(Debug, Error)]
pub enum RagError {
    #[error("Failed to extract text from {path}: {message}")]
    Extraction { path: String, message: String },

    #[error("Embedding error ({model}): {message}")]
    Embedding { model: String, message: String },

    #[error("Embedding has {actual} dimensions, table expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Chunk store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("Generation error ({model}): {message}")]
    Generation { model: String, message: String },

    #[error("Invalid chunk metadata: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, RagError>;

impl From<config::ConfigError> for RagError {
    fn from(err: config::ConfigError) -> Self {
        RagError::Config(err.to_string())
    }
}
