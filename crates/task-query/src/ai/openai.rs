//! OpenAI chat-completions provider.
//!
//! Works against any OpenAI-compatible endpoint through `with_base_url`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::{QueryError, QueryResult};

use super::provider::{AIMessage, AIProvider, AIResponse, GenerateOptions, TokenUsage};

/// OpenAI API endpoint
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

const API_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIChoiceMessage,
}

#[derive(Debug, Default, Deserialize)]
#[allow(clippy::struct_field_names)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    #[serde(default)]
    model: String,
    #[serde(default)]
    usage: OpenAIUsage,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

/// OpenAI provider.
pub struct OpenAIProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: Some(api_key.into()),
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env() -> Self {
        Self {
            client: Client::new(),
            api_key: std::env::var(API_KEY_ENV_VAR).ok(),
            base_url: OPENAI_API_URL.to_string(),
        }
    }

    /// Set a custom base URL (Azure OpenAI, proxies, local servers).
    ///
    /// A bare host is completed with `/v1/chat/completions`.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        let trimmed = url.trim_end_matches('/');
        self.base_url = if trimmed.ends_with("/chat/completions") {
            trimmed.to_string()
        } else if trimmed.ends_with("/v1") {
            format!("{trimmed}/chat/completions")
        } else {
            format!("{trimmed}/v1/chat/completions")
        };
        self
    }

    /// Apply a per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> QueryResult<Self> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    fn convert_messages(messages: &[AIMessage]) -> Vec<OpenAIMessage> {
        messages
            .iter()
            .map(|msg| OpenAIMessage {
                role: msg.role.as_str(),
                content: msg.content.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl AIProvider for OpenAIProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn api_key_env_var(&self) -> Option<&'static str> {
        Some(API_KEY_ENV_VAR)
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate_text(
        &self,
        model: &str,
        messages: &[AIMessage],
        options: &GenerateOptions,
    ) -> QueryResult<AIResponse> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| QueryError::ProviderNotConfigured {
                provider: format!("openai ({API_KEY_ENV_VAR} not set)"),
            })?;

        let request = OpenAIRequest {
            model,
            messages: Self::convert_messages(messages),
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            stop: options.stop_sequences.as_deref(),
            response_format: options.json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        tracing::info!(model, url = %self.base_url, "Calling OpenAI API");

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            if let Ok(error_response) = serde_json::from_str::<OpenAIErrorResponse>(&body) {
                return Err(QueryError::Ai(format!(
                    "OpenAI API error: {}",
                    error_response.error.message
                )));
            }
            return Err(QueryError::Ai(format!("OpenAI API error ({status}): {body}")));
        }

        let api_response: OpenAIResponse = serde_json::from_str(&body)
            .map_err(|e| QueryError::Ai(format!("Failed to parse response: {e}")))?;

        let text = api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        Ok(AIResponse {
            text,
            usage: TokenUsage::new(
                api_response.usage.prompt_tokens,
                api_response.usage.completion_tokens,
            ),
            model: api_response.model,
            provider: "openai".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_base_url_completion() {
        let provider = OpenAIProvider::new("k").with_base_url("http://localhost:1234");
        assert_eq!(provider.base_url, "http://localhost:1234/v1/chat/completions");

        let provider = OpenAIProvider::new("k").with_base_url("https://proxy.example/v1/");
        assert_eq!(provider.base_url, "https://proxy.example/v1/chat/completions");
    }

    #[test]
    fn test_message_conversion() {
        let messages = vec![AIMessage::system("rules"), AIMessage::user("query")];
        let converted = OpenAIProvider::convert_messages(&messages);

        assert_eq!(converted.len(), 2);
        assert_eq!(converted[0].role, "system");
        assert_eq!(converted[1].role, "user");
    }

    #[tokio::test]
    async fn test_generate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "gpt-4o-mini",
                "choices": [{"message": {"role": "assistant", "content": "{\"keywords\":[]}"}}],
                "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OpenAIProvider::new("test-key").with_base_url(server.uri());
        let response = provider
            .generate_text("gpt-4o-mini", &[AIMessage::user("hi")], &GenerateOptions::default())
            .await
            .unwrap();

        assert_eq!(response.text, "{\"keywords\":[]}");
        assert_eq!(response.usage.total_tokens, 15);
        assert_eq!(response.provider, "openai");
    }

    #[tokio::test]
    async fn test_error_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {"message": "Invalid API key", "type": "invalid_request_error"}
            })))
            .mount(&server)
            .await;

        let provider = OpenAIProvider::new("bad").with_base_url(server.uri());
        let err = provider
            .generate_text("gpt-4o-mini", &[AIMessage::user("hi")], &GenerateOptions::default())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let provider = OpenAIProvider {
            client: Client::new(),
            api_key: None,
            base_url: OPENAI_API_URL.to_string(),
        };
        assert!(!provider.is_configured());
        let err = provider
            .generate_text("gpt-4o-mini", &[], &GenerateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::ProviderNotConfigured { .. }));
    }
}
