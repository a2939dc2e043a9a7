use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ValidationError;
use crate::retry::RetryPolicy;

pub const DEFAULT_MODEL: &str = "gpt2";
pub const SUPPORTED_MODELS: [&str; 4] = ["gpt2", "gpt2-medium", "gpt2-large", "gpt2-xl"];

// Exercise tunnel address, override with FASTAPI_URL
pub const DEFAULT_UPSTREAM_URL: &str = "https://f515-34-145-165-103.ngrok-free.app/generate";

// CLI argument structure
#[derive(Parser, Debug, Clone)]
#[command(name = "generation-gateway")]
#[command(about = "Cached text generation service and chat proxy")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    // Model to load at startup, must be one of SUPPORTED_MODELS
    #[arg(short, long, env = "MODEL_NAME", default_value = DEFAULT_MODEL)]
    pub model: String,

    // Inference backend serving the model
    #[arg(short, long, env = "MODEL_BACKEND_URL", default_value = "http://localhost:11434")]
    pub backend: String,

    // Generation endpoint the chat proxy forwards to
    #[arg(long, env = "FASTAPI_URL", default_value = DEFAULT_UPSTREAM_URL)]
    pub upstream_url: String,

    // Directory holding one json file per cached generation
    #[arg(long, env = "MODEL_CACHE_DIR", default_value = "cache/models")]
    pub cache_dir: PathBuf,

    // Attempts per generation before giving up
    #[arg(long, default_value_t = 3)]
    pub max_retries: u32,

    // Seconds to wait between attempts
    #[arg(long, default_value_t = 1.0)]
    pub retry_delay: f64,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn retry_policy(&self) -> RetryPolicy {
        let delay = Duration::try_from_secs_f64(self.retry_delay).unwrap_or(Duration::ZERO);
        RetryPolicy::new(self.max_retries, delay)
    }

    // Backend url with http:// added if missing
    pub fn backend_url(&self) -> String {
        let url = self.backend.trim().trim_end_matches('/');
        if url.starts_with("http") {
            url.to_string()
        } else {
            format!("http://{}", url)
        }
    }
}

pub fn supported_models() -> Vec<String> {
    SUPPORTED_MODELS.iter().map(|m| m.to_string()).collect()
}

pub fn validate_model_name(name: &str) -> Result<&str, ValidationError> {
    if SUPPORTED_MODELS.contains(&name) {
        Ok(name)
    } else {
        Err(ValidationError::UnsupportedModel(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_supported_models_pass() {
        assert_eq!(validate_model_name("gpt2-large"), Ok("gpt2-large"));
        assert_eq!(
            validate_model_name("llama3"),
            Err(ValidationError::UnsupportedModel("llama3".to_string()))
        );
    }

    #[test]
    fn cli_flags_build_retry_policy_and_backend() {
        let args = Args::parse_from([
            "generation-gateway",
            "--backend",
            "localhost:11434/",
            "--max-retries",
            "5",
            "--retry-delay",
            "0.25",
        ]);
        assert_eq!(args.backend_url(), "http://localhost:11434");
        assert_eq!(args.retry_policy(), RetryPolicy::new(5, Duration::from_millis(250)));
    }

    #[test]
    fn negative_delay_falls_back_to_zero() {
        let args = Args::parse_from(["generation-gateway", "--retry-delay=-1"]);
        assert_eq!(args.retry_policy().delay, Duration::ZERO);
    }
}
