//! Language-model integration for query parsing.
//!
//! This module provides:
//! - The provider abstraction and adapters (OpenAI, Anthropic, Ollama)
//! - Handlebars prompt templates
//! - Recovery of structured results from raw model output

pub mod prompts;
pub mod provider;
pub mod recovery;

pub mod anthropic;
pub mod ollama;
pub mod openai;

use std::sync::Arc;
use std::time::Duration;

pub use anthropic::AnthropicProvider;
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
pub use prompts::{ParseQueryContext, PromptManager, PromptTemplate};
pub use provider::{
    AIMessage, AIProvider, AIResponse, AIRole, GenerateOptions, MessageBuilder, TokenUsage,
};
pub use recovery::{recover_model_result, ModelQueryResult, RecoveryStrategy};

use crate::entities::ModelSettings;
use crate::errors::{QueryError, QueryResult};

/// Build a provider from model settings.
///
/// The API key comes from the settings, else from the provider's
/// environment variable. A missing key is not an error here; the provider
/// reports itself as unconfigured and the parser falls back.
pub fn create_provider(settings: &ModelSettings) -> QueryResult<Arc<dyn AIProvider>> {
    let timeout = Duration::from_secs(settings.timeout_secs.max(1));
    let api_key = settings.api_key.clone().filter(|k| !k.trim().is_empty());

    let provider: Arc<dyn AIProvider> = match settings.provider.to_lowercase().as_str() {
        "openai" | "openai-compatible" => {
            let mut provider = api_key.map_or_else(OpenAIProvider::from_env, OpenAIProvider::new);
            if let Some(url) = &settings.base_url {
                provider = provider.with_base_url(url);
            }
            Arc::new(provider.with_timeout(timeout)?)
        }
        "anthropic" | "claude" => {
            let mut provider =
                api_key.map_or_else(AnthropicProvider::from_env, AnthropicProvider::new);
            if let Some(url) = &settings.base_url {
                provider = provider.with_base_url(url);
            }
            Arc::new(provider.with_timeout(timeout)?)
        }
        "ollama" => {
            let provider = settings
                .base_url
                .as_deref()
                .map_or_else(OllamaProvider::default, OllamaProvider::new);
            Arc::new(provider.with_timeout(timeout)?)
        }
        other => {
            return Err(QueryError::UnknownProvider {
                provider: other.to_string(),
            })
        }
    };

    tracing::debug!(
        provider = provider.name(),
        configured = provider.is_configured(),
        "Created model provider"
    );
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: &str) -> ModelSettings {
        ModelSettings {
            provider: provider.to_string(),
            api_key: Some("sk-test".to_string()),
            ..ModelSettings::default()
        }
    }

    #[test]
    fn test_create_known_providers() {
        assert_eq!(create_provider(&settings("openai")).unwrap().name(), "openai");
        assert_eq!(create_provider(&settings("Anthropic")).unwrap().name(), "anthropic");

        let ollama = create_provider(&settings("ollama")).unwrap();
        assert_eq!(ollama.name(), "ollama");
        assert!(ollama.is_configured());
    }

    #[test]
    fn test_settings_key_configures_provider() {
        let provider = create_provider(&settings("openai")).unwrap();
        assert!(provider.is_configured());
    }

    #[test]
    fn test_unknown_provider() {
        let err = create_provider(&settings("gemini-pro")).err().unwrap();
        assert!(matches!(err, QueryError::UnknownProvider { provider } if provider == "gemini-pro"));
    }
}
