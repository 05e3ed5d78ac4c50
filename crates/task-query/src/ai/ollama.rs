//! Ollama local chat provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::{QueryError, QueryResult};

use super::provider::{AIMessage, AIProvider, AIResponse, GenerateOptions, TokenUsage};

const OLLAMA_BASE_URL: &str = "http://localhost:11434";

#[derive(Debug, Serialize)]
struct OllamaMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Default, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: OllamaOptions,
}

#[derive(Debug, Deserialize)]
struct OllamaResponseMessage {
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    model: String,
    message: OllamaResponseMessage,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

#[derive(Debug, Deserialize)]
struct OllamaErrorResponse {
    error: String,
}

/// Ollama provider. Needs no API key.
pub struct OllamaProvider {
    client: Client,
    base_url: String,
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new(OLLAMA_BASE_URL)
    }
}

impl OllamaProvider {
    /// Create a provider for the Ollama server at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Apply a per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> QueryResult<Self> {
        self.client = Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

#[async_trait]
impl AIProvider for OllamaProvider {
    fn name(&self) -> &'static str {
        "ollama"
    }

    fn api_key_env_var(&self) -> Option<&'static str> {
        None
    }

    fn is_configured(&self) -> bool {
        true
    }

    async fn generate_text(
        &self,
        model: &str,
        messages: &[AIMessage],
        options: &GenerateOptions,
    ) -> QueryResult<AIResponse> {
        let request = OllamaRequest {
            model,
            messages: messages
                .iter()
                .map(|msg| OllamaMessage {
                    role: msg.role.as_str(),
                    content: msg.content.clone(),
                })
                .collect(),
            stream: false,
            format: options.json_mode.then_some("json"),
            options: OllamaOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
                stop: options.stop_sequences.clone(),
            },
        };

        let url = self.chat_url();
        tracing::info!(model, url = %url, "Calling Ollama");

        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            if let Ok(error_response) = serde_json::from_str::<OllamaErrorResponse>(&body) {
                return Err(QueryError::Ai(format!("Ollama error: {}", error_response.error)));
            }
            return Err(QueryError::Ai(format!("Ollama error ({status}): {body}")));
        }

        let api_response: OllamaResponse = serde_json::from_str(&body)
            .map_err(|e| QueryError::Ai(format!("Failed to parse response: {e}")))?;

        Ok(AIResponse {
            text: api_response.message.content,
            usage: TokenUsage::new(api_response.prompt_eval_count, api_response.eval_count),
            model: api_response.model,
            provider: "ollama".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_generate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({"stream": false, "format": "json"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "llama3.1",
                "message": {"role": "assistant", "content": "{}"},
                "done": true,
                "prompt_eval_count": 12,
                "eval_count": 3
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(format!("{}/", server.uri()));
        let options = GenerateOptions {
            json_mode: true,
            ..GenerateOptions::default()
        };
        let response = provider
            .generate_text("llama3.1", &[AIMessage::user("hi")], &options)
            .await
            .unwrap();

        assert_eq!(response.text, "{}");
        assert_eq!(response.usage.total_tokens, 15);
        assert!(provider.is_configured());
        assert!(provider.api_key_env_var().is_none());
    }

    #[tokio::test]
    async fn test_model_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({"error": "model 'nope' not found"})),
            )
            .mount(&server)
            .await;

        let provider = OllamaProvider::new(server.uri());
        let err = provider
            .generate_text("nope", &[AIMessage::user("hi")], &GenerateOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
