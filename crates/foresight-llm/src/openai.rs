//! OpenAI-compatible chat-completions client.
//!
//! Works against any endpoint speaking the `/v1/chat/completions` shape.
//! Non-streaming: the engine consumes whole responses, the per-call
//! deadline lives in the agent retry loop.

use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, RETRY_AFTER};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::provider::{
    CompletionRequest, CompletionResponse, Provider, ProviderError, ProviderResult,
};

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Default model.
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Max error-body bytes carried into an error message.
const ERROR_BODY_LIMIT: usize = 512;

/// Client configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OpenAiConfig {
    /// API base URL (no trailing slash).
    pub base_url: String,
    /// Model name sent with every request.
    pub model: String,
    /// Bearer token. Empty disables the Authorization header (local
    /// OpenAI-compatible servers).
    pub api_key: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: String::new(),
        }
    }
}

/// OpenAI-compatible provider.
pub struct OpenAiProvider {
    config: OpenAiConfig,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    model: Option<String>,
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl OpenAiProvider {
    /// Create a new provider.
    #[must_use]
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Create a new provider with a shared HTTP client.
    #[must_use]
    pub fn with_client(config: OpenAiConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Build HTTP headers for the request.
    fn build_headers(&self) -> ProviderResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if !self.config.api_key.is_empty() {
            let auth_value = format!("Bearer {}", self.config.api_key);
            let _ = headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth_value).map_err(|e| ProviderError::Auth {
                    message: format!("invalid API key header: {e}"),
                })?,
            );
        }
        Ok(headers)
    }

    /// Map a failed HTTP status onto the error taxonomy.
    fn classify_status(status: StatusCode, retry_after_ms: Option<u64>, body: &str) -> ProviderError {
        // Char-based cut so multibyte bodies cannot split a boundary
        let message: String = body.trim().chars().take(ERROR_BODY_LIMIT).collect();
        match status {
            StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited { retry_after_ms },
            StatusCode::REQUEST_TIMEOUT => ProviderError::Timeout,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Auth { message },
            s if s.is_client_error() => ProviderError::InvalidRequest { message },
            s if s.is_server_error() => ProviderError::TransientNetwork {
                message: format!("upstream {status}: {message}"),
            },
            _ => ProviderError::Unknown {
                message: format!("unexpected status {status}: {message}"),
            },
        }
    }

    /// Map a transport-level `reqwest` failure.
    fn classify_transport(error: &reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout
        } else if error.is_connect() || error.is_request() {
            ProviderError::TransientNetwork {
                message: error.to_string(),
            }
        } else {
            ProviderError::Unknown {
                message: error.to_string(),
            }
        }
    }
}

#[async_trait::async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip_all, fields(model = %self.config.model))]
    async fn complete(&self, request: &CompletionRequest) -> ProviderResult<CompletionResponse> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let url = format!("{}/v1/chat/completions", self.config.base_url);
        debug!(
            prompt_len = request.prompt.len(),
            max_tokens = request.max_tokens,
            "sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .headers(self.build_headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::classify_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_ms = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(|secs| secs * 1_000);
            let body = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, retry_after_ms, &body));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Self::classify_transport(&e))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| ProviderError::Unknown {
                message: "response contained no choices".to_string(),
            })?;

        Ok(CompletionResponse {
            text,
            model: parsed.model.unwrap_or_else(|| self.config.model.clone()),
        })
    }
}
