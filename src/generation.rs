use async_trait::async_trait;
use tracing::{error, info};

use crate::cache::CacheKey;
use crate::config::supported_models;
use crate::error::{GatewayError, GenerationError, ModelLoadError};
use crate::executor::CachedRetryExecutor;
use crate::models::{GenerationRequest, GenerationResult, ModelInfo};

const SPECIAL_TOKENS: [&str; 9] = [
    "<|endoftext|>",
    "<|im_start|>",
    "<|im_end|>",
    "<|eot_id|>",
    "<|end|>",
    "<pad>",
    "<unk>",
    "<s>",
    "</s>",
];

/// A loaded model: tokenizer and weights behind one handle.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn parameter_count(&self) -> u64;

    /// Raw output, special tokens included.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

#[async_trait]
pub trait ModelLoader: Send + Sync {
    type Model: LanguageModel;

    async fn load(&self, model_name: &str) -> Result<Self::Model, ModelLoadError>;
}

// Drop special tokens and control characters other than newline and tab
pub fn strip_special_tokens(raw: &str) -> String {
    let mut text = raw.to_string();
    for token in SPECIAL_TOKENS {
        text = text.replace(token, "");
    }
    text.retain(|c| !c.is_control() || c == '\n' || c == '\t');
    text
}

pub struct GenerationService<M: LanguageModel> {
    model_name: String,
    model: M,
    executor: CachedRetryExecutor,
}

impl<M: LanguageModel> GenerationService<M> {
    /// Loads the model before the service exists. A load failure is returned
    /// as-is and never retried.
    pub async fn load<L>(loader: &L, model_name: &str, executor: CachedRetryExecutor) -> Result<Self, ModelLoadError>
    where
        L: ModelLoader<Model = M>,
    {
        info!(model = model_name, "loading model");
        let model = loader.load(model_name).await.map_err(|e| {
            error!(model = model_name, cause = %e.cause, "model load failed");
            e
        })?;
        info!(model = model_name, parameters = model.parameter_count(), "model loaded");

        Ok(Self {
            model_name: model_name.to_string(),
            model,
            executor,
        })
    }

    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, GatewayError> {
        request.validate()?;

        let key = self.cache_key(request);
        let text: String = self
            .executor
            .run(&key, || async move {
                let raw = self.model.generate(request).await.map_err(|e| {
                    error!(model = %self.model_name, error = %e, "generation attempt failed");
                    e
                })?;
                Ok::<_, GenerationError>(strip_special_tokens(&raw))
            })
            .await?;

        Ok(GenerationResult {
            text,
            model_name: self.model_name.clone(),
        })
    }

    pub fn model_info(&self) -> ModelInfo {
        ModelInfo {
            name: self.model_name.clone(),
            parameter_count: self.model.parameter_count(),
            supported_models: supported_models(),
        }
    }

    fn cache_key(&self, request: &GenerationRequest) -> CacheKey {
        let mut key = CacheKey::new("generate_text")
            .arg(&self.model_name)
            .arg(&request.prompt)
            .kwarg("max_length", request.max_length)
            .kwarg("temperature", request.temperature);
        for (name, value) in &request.extra {
            key = key.kwarg(format!("extra.{}", name), value);
        }
        key
    }
}
