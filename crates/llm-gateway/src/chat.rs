//! Chat-completions client for OpenAI-compatible model services

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::Config;

/// Message role as sent over the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Developer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Developer => write!(f, "developer"),
        }
    }
}

/// One message of a chat request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Decoding options sent with every request
#[derive(Debug, Clone, PartialEq)]
pub struct ChatOptions {
    pub temperature: f32,
    /// Constrain the reply to a single JSON object
    pub json_mode: bool,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            json_mode: true,
        }
    }
}

impl ChatOptions {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_json_mode(mut self, json_mode: bool) -> Self {
        self.json_mode = json_mode;
        self
    }
}

/// Failure talking to the model service
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("model service is rate limiting requests (429 Too Many Requests)")]
    RateLimited,

    #[error("model service returned {status}: {body}")]
    Service { status: u16, body: String },

    #[error("failed to reach model service: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model service returned no message content")]
    EmptyResponse,

    #[error("failed to decode model service response: {0}")]
    Decode(String),
}

impl ChatError {
    /// Whether the request should be retried after a backoff
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ChatError::RateLimited)
    }
}

/// A service that turns a message sequence into one assistant reply
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send the full message sequence and return the raw reply text
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, ChatError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat-completions API client
#[derive(Clone)]
pub struct ChatClient {
    base_url: String,
    api_key: Option<String>,
    model: String,
    options: ChatOptions,
    client: reqwest::Client,
}

impl ChatClient {
    /// Create a new client with default timeout
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            model: model.into(),
            options: ChatOptions::default(),
            client: build_http_client(Duration::from_secs(120)),
        }
    }

    /// Create a client from the service configuration
    pub fn from_config(config: &Config) -> Self {
        let mut client = Self::new(config.service.base_url.clone(), config.service.model.clone())
            .with_timeout(Duration::from_secs(config.service.request_timeout_secs));
        client.api_key = config.api_key();
        client
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_http_client(timeout);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn options(&self) -> &ChatOptions {
        &self.options
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Request one completion for the given messages
    #[instrument(skip(self, messages), fields(model = %self.model, messages = messages.len()))]
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));

        let req = ChatRequest {
            model: &self.model,
            messages,
            temperature: self.options.temperature,
            response_format: self.options.json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let mut request = self.client.post(&url).json(&req);
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request.send().await?;

        match resp.status() {
            status if status.is_success() => {}
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("Model service returned 429");
                return Err(ChatError::RateLimited);
            }
            status => {
                let body = resp.text().await.unwrap_or_default();
                warn!(status = status.as_u16(), "Model service request failed");
                return Err(ChatError::Service {
                    status: status.as_u16(),
                    body,
                });
            }
        }

        let body = resp.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| ChatError::Decode(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ChatError::EmptyResponse)?;

        debug!(reply_len = content.len(), "Received model reply");
        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl ChatBackend for ChatClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        self.complete(messages).await
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("options", &self.options)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn build_http_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to build HTTP client with timeout, using defaults");
            reqwest::Client::new()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion(content: &str) -> serde_json::Value {
        json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
    }

    #[test]
    fn test_role_serialization() {
        let msg = ChatMessage::new(Role::Developer, "obs");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, json!({"role": "developer", "content": "obs"}));
    }

    #[tokio::test]
    async fn test_complete_sends_json_mode_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "temperature": 0.5,
                "response_format": { "type": "json_object" },
                "messages": [
                    { "role": "system", "content": "sys" },
                    { "role": "user", "content": "hi" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                "  {\"step\": \"OUTPUT\", \"content\": \"hello\"}\n",
            )))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChatClient::new(format!("{}/v1/", server.uri()), "test-model")
            .with_api_key("test-key")
            .with_options(ChatOptions::default().with_temperature(0.5));

        let reply = client
            .complete(&[ChatMessage::system("sys"), ChatMessage::user("hi")])
            .await
            .unwrap();
        assert_eq!(reply, r#"{"step": "OUTPUT", "content": "hello"}"#);
    }

    #[tokio::test]
    async fn test_complete_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let client = ChatClient::new(server.uri(), "test-model");
        let err = client.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(err.is_rate_limit());
    }

    #[tokio::test]
    async fn test_complete_service_error_is_not_rate_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let client = ChatClient::new(server.uri(), "test-model");
        let err = client.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(!err.is_rate_limit());
        match err {
            ChatError::Service { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_complete_empty_choices() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let client = ChatClient::new(server.uri(), "test-model");
        let err = client.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_complete_without_json_mode_omits_response_format() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("plain")))
            .mount(&server)
            .await;

        let client = ChatClient::new(server.uri(), "test-model")
            .with_options(ChatOptions::default().with_json_mode(false));
        client.complete(&[ChatMessage::user("hi")]).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body.get("response_format").is_none());
        assert!(requests[0].headers.get("authorization").is_none());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let client = ChatClient::new("http://localhost", "m").with_api_key("secret");
        let debug = format!("{:?}", client);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }
}
