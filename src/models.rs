use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ValidationError;

pub const DEFAULT_MAX_LENGTH: u32 = 100;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const MAX_TEMPERATURE: f64 = 2.0;

fn default_max_length() -> u32 {
    DEFAULT_MAX_LENGTH
}

fn default_temperature() -> f64 {
    DEFAULT_TEMPERATURE
}

// Generation request format (also the /api/generate body)
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    #[serde(default = "default_max_length")]
    pub max_length: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    // extra sampling parameters passed through to the model
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            max_length: DEFAULT_MAX_LENGTH,
            temperature: DEFAULT_TEMPERATURE,
            extra: Map::new(),
        }
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_extra(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.prompt.trim().is_empty() {
            return Err(ValidationError::EmptyPrompt);
        }
        // NaN fails both comparisons
        if !(self.temperature > 0.0 && self.temperature <= MAX_TEMPERATURE) {
            return Err(ValidationError::Temperature(self.temperature));
        }
        if self.max_length == 0 {
            return Err(ValidationError::MaxLength);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct GenerationResult {
    pub text: String,
    pub model_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ModelInfo {
    pub name: String,
    pub parameter_count: u64,
    pub supported_models: Vec<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

pub type ConversationHistory = Vec<ConversationMessage>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_fields_missing() {
        let req: GenerationRequest = serde_json::from_str(r#"{"prompt": "hi"}"#).unwrap();
        assert_eq!(req, GenerationRequest::new("hi"));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn validation_rejects_out_of_range_input() {
        assert_eq!(GenerationRequest::new("  ").validate(), Err(ValidationError::EmptyPrompt));
        assert_eq!(
            GenerationRequest::new("p").with_temperature(0.0).validate(),
            Err(ValidationError::Temperature(0.0))
        );
        assert_eq!(
            GenerationRequest::new("p").with_temperature(2.5).validate(),
            Err(ValidationError::Temperature(2.5))
        );
        assert!(GenerationRequest::new("p").with_temperature(2.0).validate().is_ok());
        assert!(GenerationRequest::new("p").with_temperature(f64::NAN).validate().is_err());
        assert_eq!(
            GenerationRequest::new("p").with_max_length(0).validate(),
            Err(ValidationError::MaxLength)
        );
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_value(ConversationMessage::assistant("ok")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "ok"}));
        assert!(serde_json::from_str::<ConversationMessage>(r#"{"role":"bot","content":"x"}"#).is_err());
    }
}
