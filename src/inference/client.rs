//! OpenAI-compatible inference client.
//!
//! Sends non-streaming chat completion requests and returns the assistant
//! text. The [`GenerativeBackend`] trait is the seam the planner depends on;
//! [`InferenceClient`] is the shipped implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client as HttpClient;

use crate::config::GenerationConfig;

use super::errors::InferenceError;
use super::types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};

// ─── Constants ───────────────────────────────────────────────────────────────

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

// ─── GenerativeBackend ───────────────────────────────────────────────────────

/// Text generation seam: system directive plus role-tagged messages in,
/// assistant text out.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<String, InferenceError>;
}

// ─── InferenceClient ─────────────────────────────────────────────────────────

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
///
/// The API key is resolved once at construction. A missing key does not
/// fail construction; each call reports it as
/// [`InferenceError::MissingCredentials`] instead.
pub struct InferenceClient {
    http: HttpClient,
    base_url: String,
    model: String,
    api_key: Option<String>,
    key_sources: Vec<String>,
    temperature: f32,
    max_tokens: u32,
    request_timeout_secs: u64,
}

impl InferenceClient {
    /// Build a client, reading the API key from the configured env vars.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, InferenceError> {
        let api_key = config.resolve_api_key(|name| std::env::var(name).ok());
        Self::with_api_key(config, api_key)
    }

    /// Build a client with an explicit key (or none).
    pub fn with_api_key(
        config: &GenerationConfig,
        api_key: Option<String>,
    ) -> Result<Self, InferenceError> {
        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| InferenceError::ConnectionFailed {
                endpoint: config.base_url.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            key_sources: config.api_key_env.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            request_timeout_secs: config.request_timeout_secs,
        })
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl GenerativeBackend for InferenceClient {
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
    ) -> Result<String, InferenceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| InferenceError::MissingCredentials {
                checked: self.key_sources.clone(),
            })?;

        let url = format!("{}/chat/completions", self.base_url);
        let mut all_messages = Vec::with_capacity(messages.len() + 1);
        all_messages.push(ChatMessage::system(system_prompt));
        all_messages.extend_from_slice(messages);

        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: all_messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stream: false,
        };

        tracing::debug!(
            model = %self.model,
            messages = body.messages.len(),
            prompt_chars = body.messages.iter().map(|m| m.content.len()).sum::<usize>(),
            "chat completion request"
        );
        let started = Instant::now();

        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout {
                        duration_secs: self.request_timeout_secs,
                    }
                } else {
                    InferenceError::ConnectionFailed {
                        endpoint: url.clone(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(InferenceError::HttpError {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let body_text = response
            .text()
            .await
            .map_err(|e| InferenceError::InvalidResponse {
                reason: format!("failed to read response body: {e}"),
            })?;

        let content = parse_completion_body(&body_text)?;
        tracing::info!(
            model = %self.model,
            reply_chars = content.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "chat completion received"
        );
        Ok(content)
    }
}

/// Pull `choices[0].message.content` out of a completion body.
fn parse_completion_body(body: &str) -> Result<String, InferenceError> {
    let parsed: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| InferenceError::InvalidResponse {
            reason: e.to_string(),
        })?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(InferenceError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completion_body() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"Bonjour!"}}]}"#;
        assert_eq!(parse_completion_body(body).unwrap(), "Bonjour!");
    }

    #[test]
    fn test_parse_completion_body_empty() {
        for body in [
            r#"{"choices":[]}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
            r#"{"choices":[{"message":{"content":"   "}}]}"#,
        ] {
            assert!(matches!(
                parse_completion_body(body),
                Err(InferenceError::EmptyResponse)
            ));
        }
    }

    #[test]
    fn test_parse_completion_body_invalid() {
        assert!(matches!(
            parse_completion_body("<html>502</html>"),
            Err(InferenceError::InvalidResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_missing_key_reported_per_call() {
        let config = GenerationConfig::default();
        let client = InferenceClient::with_api_key(&config, None).unwrap();
        assert!(!client.has_credentials());
        let err = client
            .complete("system", &[ChatMessage::user("hi")])
            .await
            .unwrap_err();
        assert!(matches!(err, InferenceError::MissingCredentials { .. }));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = GenerationConfig {
            base_url: "http://localhost:11434/v1/".into(),
            ..GenerationConfig::default()
        };
        let client = InferenceClient::with_api_key(&config, Some("k".into())).unwrap();
        assert_eq!(client.base_url, "http://localhost:11434/v1");
        assert_eq!(client.model(), "gpt-4o");
    }
}
