use std::path::PathBuf;
use thiserror::Error;

// Bad or missing input, surfaced immediately and never retried
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("temperature must be in (0, 2], got {0}")]
    Temperature(f64),
    #[error("max_length must be positive")]
    MaxLength,
    #[error("unsupported model: {0}")]
    UnsupportedModel(String),
}

#[derive(Debug, Error)]
#[error("failed to load model {model}: {cause}")]
pub struct ModelLoadError {
    pub model: String,
    pub cause: String,
}

// Any failure during tokenization or inference
#[derive(Debug, Clone, Error)]
#[error("text generation failed: {0}")]
pub struct GenerationError(pub String);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache directory {path} unavailable: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cache io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cache entry {path} is not valid json: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}
