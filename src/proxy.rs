use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::metrics::{CHAT_REQUEST_TOTAL, UPSTREAM_FAILURES};
use crate::models::{ConversationHistory, ConversationMessage};

pub const MAX_NEW_TOKENS: u32 = 512;
pub const TEMPERATURE: f64 = 0.7;
pub const TOP_P: f64 = 0.9;

pub const MISSING_MESSAGE_ERROR: &str = "message is required";
pub const PARSE_ERROR: &str = "request body is not valid JSON";

pub const CORS_HEADERS: [(&str, &str); 4] = [
    ("Content-Type", "application/json"),
    ("Access-Control-Allow-Origin", "*"),
    (
        "Access-Control-Allow-Headers",
        "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token",
    ),
    ("Access-Control-Allow-Methods", "OPTIONS,POST"),
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub conversation_history: Option<ConversationHistory>,
}

// Body sent to the generation endpoint
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UpstreamRequest {
    pub prompt: String,
    pub max_new_tokens: u32,
    pub do_sample: bool,
    pub temperature: f64,
    pub top_p: f64,
}

impl UpstreamRequest {
    pub fn for_message(message: &str) -> Self {
        Self {
            prompt: message.to_string(),
            max_new_tokens: MAX_NEW_TOKENS,
            do_sample: true,
            temperature: TEMPERATURE,
            top_p: TOP_P,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum UpstreamError {
    #[error("HTTP Error {status}: {reason}")]
    Http { status: u16, reason: String },
    #[error("upstream request failed: {0}")]
    Transport(String),
    #[error("upstream response is not valid JSON: {0}")]
    Decode(String),
    #[error("upstream response has no {0} field")]
    MissingField(&'static str),
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_history: Option<ConversationHistory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatReply {
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            response: None,
            conversation_history: None,
            error: Some(error.into()),
        }
    }
}

/// API Gateway style response: status, headers and a JSON string body.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl ProxyResponse {
    fn new(status_code: u16, body: String) -> Self {
        Self {
            status_code,
            headers: CORS_HEADERS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body,
        }
    }

    pub fn json(status_code: u16, reply: &ChatReply) -> Self {
        let body = serde_json::to_string(reply)
            .unwrap_or_else(|e| format!(r#"{{"success":false,"error":"{}"}}"#, e));
        Self::new(status_code, body)
    }

    pub fn reply(&self) -> Option<ChatReply> {
        serde_json::from_str(&self.body).ok()
    }
}

#[async_trait]
pub trait Upstream: Send + Sync {
    /// Returns the generated text.
    async fn generate(&self, request: &UpstreamRequest) -> Result<String, UpstreamError>;
}

/// Single POST per call; no retry and no timeout beyond the client's own.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    url: String,
}

impl HttpUpstream {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self { client, url: url.into() }
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn generate(&self, request: &UpstreamRequest) -> Result<String, UpstreamError> {
        let res = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| UpstreamError::Transport(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(UpstreamError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let body: Value = res.json().await.map_err(|e| UpstreamError::Decode(e.to_string()))?;
        body.get("generated_text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(UpstreamError::MissingField("generated_text"))
    }
}

/// Stateless chat forwarder. The caller owns the conversation history; each
/// successful call returns it extended by one user and one assistant message.
pub struct ChatProxyHandler<U: Upstream> {
    upstream: U,
}

impl<U: Upstream> ChatProxyHandler<U> {
    pub fn new(upstream: U) -> Self {
        Self { upstream }
    }

    pub fn upstream(&self) -> &U {
        &self.upstream
    }

    pub async fn handle(&self, body: &str) -> ProxyResponse {
        CHAT_REQUEST_TOTAL.inc();

        let raw: Value = match serde_json::from_str(body) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "chat request body is not json");
                return ProxyResponse::json(400, &ChatReply::failure(PARSE_ERROR));
            }
        };
        let request: ChatRequest = match serde_json::from_value(raw) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "chat request has the wrong shape");
                return ProxyResponse::json(400, &ChatReply::failure(format!("invalid request: {}", e)));
            }
        };

        let message = match request.message {
            Some(message) if !message.is_empty() => message,
            _ => return ProxyResponse::json(400, &ChatReply::failure(MISSING_MESSAGE_ERROR)),
        };
        let history = request.conversation_history.unwrap_or_default();

        let generated = match self.upstream.generate(&UpstreamRequest::for_message(&message)).await {
            Ok(text) => text,
            Err(UpstreamError::Http { status, reason }) => {
                UPSTREAM_FAILURES.inc();
                let detail = format!(
                    "request to generation endpoint failed: {}",
                    UpstreamError::Http { status, reason }
                );
                error!(status, "{}", detail);
                // non-error statuses cannot be relayed as a failure
                let status = if status >= 400 { status } else { 502 };
                return ProxyResponse::json(status, &ChatReply::failure(detail));
            }
            Err(e) => {
                UPSTREAM_FAILURES.inc();
                error!(error = %e, "chat proxy failed");
                return ProxyResponse::json(500, &ChatReply::failure(e.to_string()));
            }
        };

        let mut messages = history;
        messages.push(ConversationMessage::user(message));
        messages.push(ConversationMessage::assistant(generated.clone()));
        info!(history_len = messages.len(), "chat reply generated");

        ProxyResponse::json(
            200,
            &ChatReply {
                success: true,
                response: Some(generated),
                conversation_history: Some(messages),
                error: None,
            },
        )
    }

    /// Lambda-style entry: reads the `body` string out of an API Gateway event.
    pub async fn handle_event(&self, event: &Value) -> ProxyResponse {
        match event.get("body").and_then(Value::as_str) {
            Some(body) => self.handle(body).await,
            None => {
                error!("event has no string body");
                ProxyResponse::json(500, &ChatReply::failure("event body is missing or not a string"))
            }
        }
    }

    pub fn preflight(&self) -> ProxyResponse {
        ProxyResponse::new(200, String::new())
    }
}
