use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{GenerationError, ModelLoadError};
use crate::generation::{LanguageModel, ModelLoader};
use crate::models::GenerationRequest;

// Ollama /api/generate request format
#[derive(Debug, Serialize, Clone)]
pub struct BackendGenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub stream: bool,
    pub options: Map<String, Value>,
}

// Ollama /api/generate response format
#[derive(Debug, Deserialize, Clone)]
pub struct BackendGenerateResponse {
    pub model: String,
    pub response: String,
}

#[derive(Debug, Deserialize)]
struct ShowResponse {
    #[serde(default)]
    model_info: Map<String, Value>,
}

/// Loads models from an Ollama-compatible backend. Loading asks the backend
/// for the model's metadata, so a model the backend does not have fails at
/// startup rather than on the first request.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaBackend {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl ModelLoader for OllamaBackend {
    type Model = OllamaModel;

    async fn load(&self, model_name: &str) -> Result<OllamaModel, ModelLoadError> {
        let load_error = |cause: String| ModelLoadError {
            model: model_name.to_string(),
            cause,
        };

        let res = self
            .client
            .post(format!("{}/api/show", self.base_url))
            .json(&serde_json::json!({ "model": model_name }))
            .send()
            .await
            .map_err(|e| load_error(format!("backend unreachable: {}", e)))?;
        if !res.status().is_success() {
            return Err(load_error(format!("backend returned {}", res.status())));
        }
        let show: ShowResponse = res
            .json()
            .await
            .map_err(|e| load_error(format!("unreadable model metadata: {}", e)))?;

        let parameter_count = show
            .model_info
            .get("general.parameter_count")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        debug!(model = model_name, parameter_count, "backend model metadata received");

        Ok(OllamaModel {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            name: model_name.to_string(),
            parameter_count,
        })
    }
}

#[derive(Debug, Clone)]
pub struct OllamaModel {
    client: reqwest::Client,
    base_url: String,
    name: String,
    parameter_count: u64,
}

impl OllamaModel {
    // Sampling options; explicit fields win over same-named extras
    pub fn options(request: &GenerationRequest) -> Map<String, Value> {
        let mut options = request.extra.clone();
        options.insert("num_predict".to_string(), Value::from(request.max_length));
        options.insert("temperature".to_string(), Value::from(request.temperature));
        options
    }
}

#[async_trait]
impl LanguageModel for OllamaModel {
    fn parameter_count(&self) -> u64 {
        self.parameter_count
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let body = BackendGenerateRequest {
            model: &self.name,
            prompt: &request.prompt,
            stream: false,
            options: Self::options(request),
        };

        let res = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError(format!("Request failed: {}", e)))?;
        if !res.status().is_success() {
            return Err(GenerationError(format!("backend returned {}", res.status())));
        }

        let body: BackendGenerateResponse = res
            .json()
            .await
            .map_err(|e| GenerationError(format!("Parse Error: {}", e)))?;
        debug!(model = %body.model, chars = body.response.len(), "backend generation complete");
        Ok(body.response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_carry_sampling_parameters() {
        let request = GenerationRequest::new("hi")
            .with_max_length(64)
            .with_temperature(1.1)
            .with_extra("top_k", 40)
            .with_extra("temperature", 0.1);
        let options = OllamaModel::options(&request);

        assert_eq!(options["num_predict"], 64);
        assert_eq!(options["temperature"], 1.1);
        assert_eq!(options["top_k"], 40);
    }

    #[test]
    fn request_body_disables_streaming() {
        let request = GenerationRequest::new("hi");
        let body = BackendGenerateRequest {
            model: "gpt2",
            prompt: &request.prompt,
            stream: false,
            options: OllamaModel::options(&request),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt2");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 100);
    }
}
