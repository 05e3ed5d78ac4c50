//! Natural-language query parsing.
//!
//! Three branches, tried in order:
//! 1. fast path: deterministic templates, no I/O
//! 2. model path: one prompt to the configured provider, output recovered
//!    leniently and post-processed
//! 3. fallback: stop-word-filtered query tokens
//!
//! [`QueryParser::parse`] never fails; every problem on the model path is
//! logged and turned into the fallback.

pub mod fast_path;

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::ai::prompts::{ParseQueryContext, PromptManager, PARSE_QUERY_TEMPLATE_ID};
use crate::ai::{recover_model_result, AIProvider, GenerateOptions, MessageBuilder, ModelQueryResult};
use crate::dates::resolve_date_expression;
use crate::entities::{normalize_tag, ExpansionMetadata, ParseSource, ParsedQuery, QueryConfig};
use crate::errors::{QueryError, QueryResult};
use crate::keywords::{deduplicate, normalize, StopWords};
use crate::terms::TermRegistry;

pub use fast_path::try_fast_path;

/// Turns free-form query text into a [`ParsedQuery`].
pub struct QueryParser {
    config: QueryConfig,
    registry: TermRegistry,
    stop_words: StopWords,
    prompts: PromptManager,
    provider: Option<Arc<dyn AIProvider>>,
    today: Option<NaiveDate>,
}

impl QueryParser {
    /// Create a parser. Without a provider every non-template query takes
    /// the fallback branch.
    pub fn new(config: QueryConfig, provider: Option<Arc<dyn AIProvider>>) -> Self {
        Self {
            registry: TermRegistry::from_config(&config),
            stop_words: StopWords::new(&config.stop_words),
            prompts: PromptManager::new(),
            provider,
            today: None,
            config,
        }
    }

    /// Pin "today" instead of reading the local clock.
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    pub fn registry(&self) -> &TermRegistry {
        &self.registry
    }

    /// Synchronous template match; `None` if the query needs the model path.
    pub fn parse_fast(&self, text: &str) -> Option<ParsedQuery> {
        try_fast_path(text, &self.registry)
    }

    /// Parse a query. Never fails.
    pub async fn parse(&self, text: &str) -> ParsedQuery {
        let text = text.trim();
        if text.is_empty() {
            return ParsedQuery::new(text);
        }

        if let Some(query) = self.parse_fast(text) {
            return query;
        }

        match self.parse_with_model(text).await {
            Ok(result) => self.post_process(text, result),
            Err(e) => {
                tracing::warn!(error = %e, "Model parsing unavailable, falling back to keyword search");
                self.fallback(text)
            }
        }
    }

    /// Keyword-only result from the query text itself.
    pub fn fallback(&self, text: &str) -> ParsedQuery {
        let tokens = normalize(text, &self.stop_words);
        let mut query = ParsedQuery::new(text);
        query.core_keywords.clone_from(&tokens);
        query.keywords = tokens;
        query.expansion = ExpansionMetadata {
            enabled: false,
            language_count: self.config.languages.len(),
            ..ExpansionMetadata::default()
        };
        query.source = ParseSource::Fallback;
        query
    }

    async fn parse_with_model(&self, text: &str) -> QueryResult<ModelQueryResult> {
        let settings = &self.config.model;
        let provider = self
            .provider
            .as_ref()
            .filter(|p| p.is_configured())
            .ok_or_else(|| QueryError::ProviderNotConfigured {
                provider: settings.provider.clone(),
            })?;

        let context = ParseQueryContext::new(text, self.today(), &self.config, &self.registry);
        let (system, user) = self.prompts.render(PARSE_QUERY_TEMPLATE_ID, &context)?;
        let messages = MessageBuilder::new().system(system).user(user).build();
        let options = GenerateOptions {
            temperature: Some(settings.temperature),
            max_tokens: Some(settings.max_tokens),
            json_mode: true,
            ..GenerateOptions::default()
        };

        let response = provider
            .generate_text(&settings.model_id, &messages, &options)
            .await?;

        tracing::debug!(
            provider = %response.provider,
            output_tokens = response.usage.output_tokens,
            "Model response received"
        );

        recover_model_result(&response.text).ok_or_else(|| QueryError::AiResponseParseError {
            reason: format!("no JSON object in {} chars of model output", response.text.len()),
        })
    }

    /// Validate and normalize a recovered model result.
    fn post_process(&self, text: &str, result: ModelQueryResult) -> ParsedQuery {
        let today = self.today();
        let property_terms = self.registry.all_property_terms();
        let content_words = |words: Vec<String>| -> Vec<String> {
            words
                .into_iter()
                .map(|w| w.trim().to_lowercase())
                .filter(|w| {
                    !w.is_empty() && !self.stop_words.contains(w) && !property_terms.contains(w)
                })
                .collect()
        };

        let mut query = ParsedQuery::new(text);
        query.source = ParseSource::Model;
        query.priority = result
            .priority
            .as_deref()
            .and_then(|p| self.registry.resolve_priority_value(p));
        query.status = result
            .status
            .as_deref()
            .and_then(|s| self.registry.resolve_status_value(s));
        query.due_date = result.due_date.and_then(|due| {
            if resolve_date_expression(&due, today).is_filter() {
                Some(due)
            } else if let Some(token) = self.registry.resolve_due_date_term(&due) {
                Some(token.to_string())
            } else {
                tracing::debug!(due = %due, "Dropping unrecognized due date from model");
                None
            }
        });
        query.folder = result.folder;
        query.tags = result.tags.iter().map(|t| normalize_tag(t)).collect();

        let expanded = deduplicate(&content_words(result.keywords));
        let mut core = deduplicate(&content_words(result.core_keywords));
        if core.is_empty() {
            core.clone_from(&expanded);
        }

        let expansion = &self.config.expansion;
        let language_count = self.config.languages.len();
        let expected_per_keyword = usize::from(expansion.expansions_per_language) * language_count;

        let keywords = if expansion.enabled {
            let mut seen: HashSet<String> = core.iter().cloned().collect();
            core.iter()
                .cloned()
                .chain(expanded.into_iter().filter(|k| seen.insert(k.clone())))
                .collect()
        } else {
            core.clone()
        };

        #[allow(clippy::cast_precision_loss)]
        let (achieved_ratio, expected) = (
            if core.is_empty() {
                0.0
            } else {
                (keywords.len() - core.len()) as f64 / core.len() as f64
            },
            expected_per_keyword as f64,
        );

        if expansion.enabled && !core.is_empty() && achieved_ratio < expected / 2.0 {
            tracing::warn!(
                achieved = achieved_ratio,
                expected = expected_per_keyword,
                "Keyword expansion below half of the expected count"
            );
        }

        query.expansion = ExpansionMetadata {
            enabled: expansion.enabled,
            language_count,
            expected_per_keyword,
            achieved_ratio,
        };
        query.core_keywords = core;
        query.keywords = keywords;
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AIMessage, AIResponse, TokenUsage};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider returning a canned response and counting calls
    struct CannedProvider {
        response: QueryResult<String>,
        calls: AtomicUsize,
    }

    impl CannedProvider {
        fn new(response: QueryResult<&str>) -> Arc<Self> {
            Arc::new(Self {
                response: response.map(ToString::to_string),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl AIProvider for CannedProvider {
        fn name(&self) -> &'static str {
            "canned"
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
            _messages: &[AIMessage],
            _options: &GenerateOptions,
        ) -> QueryResult<AIResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone().map(|text| AIResponse {
                text,
                usage: TokenUsage::default(),
                model: model.to_string(),
                provider: "canned".to_string(),
            })
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn parser(provider: &Arc<CannedProvider>) -> QueryParser {
        let provider: Arc<dyn AIProvider> = provider.clone();
        QueryParser::new(QueryConfig::default(), Some(provider)).with_today(today())
    }

    #[tokio::test]
    async fn test_fast_path_skips_provider() {
        let provider = CannedProvider::new(Ok("{}"));
        let query = parser(&provider).parse("priority 2").await;

        assert_eq!(query.priority, Some(2));
        assert_eq!(query.source, ParseSource::FastPath);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_model_result_post_processing() {
        let provider = CannedProvider::new(Ok(r##"{
            "coreKeywords": ["Billing", "urgent", "the"],
            "keywords": ["billing", "invoice", "账单", "fakturering", "urgent"],
            "priority": "high",
            "dueDate": "this week",
            "status": "todo",
            "tags": ["#Finance"]
        }"##));
        let query = parser(&provider).parse("urgent billing stuff this week").await;

        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(query.source, ParseSource::Model);
        assert_eq!(query.core_keywords, vec!["billing"]);
        assert_eq!(query.keywords, vec!["billing", "invoice", "账单", "fakturering"]);
        assert_eq!(query.priority, Some(1));
        assert_eq!(query.due_date.as_deref(), Some("this week"));
        assert_eq!(query.status.as_deref(), Some("open"));
        assert!(query.tags.contains("finance"));
        assert!((query.expansion.achieved_ratio - 3.0).abs() < f64::EPSILON);
        assert_eq!(query.expansion.expected_per_keyword, 10);
    }

    #[tokio::test]
    async fn test_keywords_superset_of_core() {
        let provider = CannedProvider::new(Ok(r#"{"coreKeywords": ["deploy", "rollback"], "keywords": ["deployment"]}"#));
        let query = parser(&provider).parse("deploy rollback plan").await;

        for core in &query.core_keywords {
            assert!(query.keywords.contains(core));
        }
        assert_eq!(query.keywords, vec!["deploy", "rollback", "deployment"]);
    }

    #[tokio::test]
    async fn test_expansion_disabled_keeps_core_only() {
        let provider = CannedProvider::new(Ok(r#"{"coreKeywords": ["login"], "keywords": ["login", "signin"]}"#));
        let mut config = QueryConfig::default();
        config.expansion.enabled = false;
        let dyn_provider: Arc<dyn AIProvider> = provider.clone();
        let parser = QueryParser::new(config, Some(dyn_provider)).with_today(today());

        let query = parser.parse("login problems").await;
        assert_eq!(query.keywords, query.core_keywords);
        assert!(!query.expansion.enabled);
    }

    #[tokio::test]
    async fn test_unrecognized_values_dropped() {
        let provider = CannedProvider::new(Ok(r#"{"keywords": ["report"], "priority": 9, "dueDate": "someday", "status": "blocked"}"#));
        let query = parser(&provider).parse("report someday").await;

        assert_eq!(query.priority, None);
        assert_eq!(query.due_date, None);
        assert_eq!(query.status, None);
        assert_eq!(query.core_keywords, vec!["report"]);
    }

    #[tokio::test]
    async fn test_provider_error_falls_back() {
        let provider = CannedProvider::new(Err(QueryError::AiTimeout));
        let query = parser(&provider).parse("find the billing export bug").await;

        assert_eq!(query.source, ParseSource::Fallback);
        assert_eq!(query.keywords, vec!["billing", "export", "bug"]);
        assert_eq!(query.core_keywords, query.keywords);
    }

    #[tokio::test]
    async fn test_malformed_response_falls_back() {
        let provider = CannedProvider::new(Ok("Sure! Here are your tasks."));
        let query = parser(&provider).parse("quarterly report").await;

        assert_eq!(query.source, ParseSource::Fallback);
        assert_eq!(query.keywords, vec!["quarterly", "report"]);
    }

    #[tokio::test]
    async fn test_no_provider_falls_back() {
        let parser = QueryParser::new(QueryConfig::default(), None).with_today(today());
        let query = parser.parse("修复 login bug").await;

        assert_eq!(query.source, ParseSource::Fallback);
        assert_eq!(query.keywords, vec!["修复", "login", "bug"]);
    }

    #[tokio::test]
    async fn test_fallback_keeps_contained_words() {
        let parser = QueryParser::new(QueryConfig::default(), None).with_today(today());
        let query = parser.parse("fix prefix parsing bug").await;

        assert_eq!(query.source, ParseSource::Fallback);
        assert_eq!(query.keywords, vec!["fix", "prefix", "parsing", "bug"]);
        assert_eq!(query.core_keywords, query.keywords);
    }

    #[tokio::test]
    async fn test_empty_query() {
        let parser = QueryParser::new(QueryConfig::default(), None);
        let query = parser.parse("   ").await;
        assert!(query.is_empty());
    }
}
