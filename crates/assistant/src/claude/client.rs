//! Non-streaming client for the Anthropic Messages API.

use std::sync::Arc;

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::{debug, instrument};

use crate::config::ClaudeConfig;

use super::ChatModel;
use super::error::{ApiErrorResponse, ClaudeError};
use super::types::{ChatRequest, ChatResponse, Message, Tool};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Claude API client. Cheap to clone.
#[derive(Clone)]
pub struct ClaudeClient {
    inner: Arc<ClaudeClientInner>,
}

struct ClaudeClientInner {
    client: reqwest::Client,
    model: String,
    endpoint: String,
}

impl std::fmt::Debug for ClaudeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeClient")
            .field("model", &self.inner.model)
            .field("endpoint", &self.inner.endpoint)
            .finish_non_exhaustive()
    }
}

impl ClaudeClient {
    /// Create a client for the configured model.
    ///
    /// # Errors
    ///
    /// Returns [`ClaudeError::Config`] if the API key is not a valid header
    /// value, or an HTTP error if the client cannot be built.
    pub fn new(config: &ClaudeConfig) -> Result<Self, ClaudeError> {
        Self::with_endpoint(config, ANTHROPIC_API_URL)
    }

    /// Create a client that posts to `endpoint` instead of the public API.
    ///
    /// # Errors
    ///
    /// See [`ClaudeClient::new`].
    pub fn with_endpoint(
        config: &ClaudeConfig,
        endpoint: impl Into<String>,
    ) -> Result<Self, ClaudeError> {
        let mut api_key = HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|_| ClaudeError::Config("API key is not a valid header value".to_string()))?;
        api_key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-api-key", api_key);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(ClaudeClientInner {
                client,
                model: config.model.clone(),
                endpoint: endpoint.into(),
            }),
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.inner.model
    }

    /// Send the conversation and wait for the complete response.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API answers with an
    /// error status.
    #[instrument(skip(self, messages, system, tools), fields(model = %self.inner.model, messages = messages.len()))]
    pub async fn chat(
        &self,
        messages: &[Message],
        system: Option<&str>,
        tools: &[Tool],
    ) -> Result<ChatResponse, ClaudeError> {
        let request = ChatRequest {
            model: &self.inner.model,
            max_tokens: DEFAULT_MAX_TOKENS,
            messages,
            system,
            tools,
        };

        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(error_from_status(status, response).await);
        }

        let body = response.text().await?;
        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ClaudeError::Parse(format!("Failed to parse response: {e}")))?;
        debug!(
            stop_reason = ?parsed.stop_reason,
            input_tokens = parsed.usage.input_tokens,
            output_tokens = parsed.usage.output_tokens,
            "Claude response"
        );
        Ok(parsed)
    }
}

impl ChatModel for ClaudeClient {
    async fn respond(
        &self,
        messages: &[Message],
        system: &str,
        tools: &[Tool],
    ) -> Result<ChatResponse, ClaudeError> {
        self.chat(messages, Some(system).filter(|s| !s.is_empty()), tools)
            .await
    }
}

async fn error_from_status(status: StatusCode, response: reqwest::Response) -> ClaudeError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            ClaudeError::RateLimited(retry_after)
        }
        StatusCode::UNAUTHORIZED => ClaudeError::Unauthorized("Invalid API key".to_string()),
        _ => match response.text().await {
            Ok(body) => match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_error) => api_error.into(),
                Err(_) => ClaudeError::Api {
                    error_type: status.as_str().to_string(),
                    message: body,
                },
            },
            Err(e) => ClaudeError::Http(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn config(api_key: &str) -> ClaudeConfig {
        ClaudeConfig {
            api_key: SecretString::from(api_key.to_string()),
            model: "claude-test".to_string(),
        }
    }

    #[test]
    fn test_new_with_valid_key() {
        let client = ClaudeClient::new(&config("sk-ant-REDACTED")).expect("client");
        assert_eq!(client.model(), "claude-test");
        assert!(!format!("{client:?}").contains("sk-ant"));
    }

    #[test]
    fn test_new_rejects_header_breaking_key() {
        let result = ClaudeClient::new(&config("bad\nkey"));
        assert!(matches!(result, Err(ClaudeError::Config(_))));
    }

    #[test]
    fn test_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<ClaudeClient>();
    }
}
