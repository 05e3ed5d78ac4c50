//! Parse-query prompt template.
//!
//! Asks the model to split a free-form request into content keywords and
//! property filters, and to expand each keyword into the configured
//! languages.

use serde::Serialize;

use crate::entities::{QueryConfig, StatusCategoryConfig};
use crate::terms::{Property, PropertyTermSet, TermRegistry};

use super::PromptTemplate;

/// Template ID of the parse-query prompt
pub const PARSE_QUERY_TEMPLATE_ID: &str = "parse-query";

/// Status category as shown to the model
#[derive(Debug, Clone, Serialize)]
pub struct StatusCategorySummary {
    pub key: String,
    pub display_name: String,
    pub aliases: Vec<String>,
}

impl From<&StatusCategoryConfig> for StatusCategorySummary {
    fn from(category: &StatusCategoryConfig) -> Self {
        Self {
            key: category.key.clone(),
            display_name: category.display_name.clone(),
            aliases: category.aliases.clone(),
        }
    }
}

/// Context for the parse-query prompt.
#[derive(Debug, Clone, Serialize)]
pub struct ParseQueryContext {
    /// The user's query text
    pub query: String,
    /// Today's date (YYYY-MM-DD)
    pub today: String,
    pub languages: Vec<String>,
    pub language_count: usize,
    pub expansion_enabled: bool,
    pub expansions_per_language: usize,
    /// Expected expansions per core keyword across all languages
    pub expected_per_keyword: usize,
    pub priority_terms: PropertyTermSet,
    pub due_date_terms: PropertyTermSet,
    pub status_terms: PropertyTermSet,
    pub status_categories: Vec<StatusCategorySummary>,
}

impl ParseQueryContext {
    /// Build the context from configuration and the registry's merged terms.
    pub fn new(
        query: impl Into<String>,
        today: chrono::NaiveDate,
        config: &QueryConfig,
        registry: &TermRegistry,
    ) -> Self {
        let language_count = config.languages.len();
        let expansions_per_language = usize::from(config.expansion.expansions_per_language);
        Self {
            query: query.into(),
            today: today.format("%Y-%m-%d").to_string(),
            languages: config.languages.clone(),
            language_count,
            expansion_enabled: config.expansion.enabled,
            expansions_per_language,
            expected_per_keyword: expansions_per_language * language_count,
            priority_terms: registry.merged_terms(Property::Priority),
            due_date_terms: registry.merged_terms(Property::DueDate),
            status_terms: registry.merged_terms(Property::Status),
            status_categories: registry
                .status_categories()
                .into_iter()
                .map(StatusCategorySummary::from)
                .collect(),
        }
    }
}

/// Get the parse-query template.
pub fn template() -> PromptTemplate {
    PromptTemplate::new(PARSE_QUERY_TEMPLATE_ID, SYSTEM_PROMPT, USER_PROMPT)
        .with_description("Extract keywords and property filters from a task search query")
}

const SYSTEM_PROMPT: &str = r##"You are a query parser for a task manager. You turn a free-form search request into content keywords and structured filters. Today is {{today}}.

Property terms signal a filter and are NEVER content keywords. Recognized terms, grouped by meaning:

Priority terms:
{{{json priority_terms}}}

Due date terms:
{{{json due_date_terms}}}

Status terms:
{{{json status_terms}}}

Status categories (use the key):
{{#each status_categories}}- {{key}} ({{display_name}}){{#if aliases}}: {{join aliases ", "}}{{/if}}
{{/each}}
Rules:
- priority: an integer 1-4 (1 is highest) or null.
- dueDate: one of "today", "tomorrow", "overdue", "week", "next-week", "month", "future", "any", a relative expression such as "3 days" or "next friday", a YYYY-MM-DD date, or null.
- status: a status category key from the list above, or null.
- folder: a folder or project path the user restricts to, or null.
- tags: tag names without the leading "#".
- coreKeywords: the content words of the query, stop words and property terms removed.
{{#if expansion_enabled}}- keywords: every core keyword plus {{expansions_per_language}} semantic equivalents in each of these {{language_count}} languages: {{join languages ", "}}. That is about {{expected_per_keyword}} expansions per core keyword.
{{else}}- keywords: the same list as coreKeywords.
{{/if}}
IMPORTANT: Respond with ONLY a JSON object of this exact shape, no prose:
{
  "coreKeywords": ["string"],
  "keywords": ["string"],
  "priority": null,
  "dueDate": null,
  "status": null,
  "folder": null,
  "tags": []
}"##;

const USER_PROMPT: &str = r"Parse this task query:

{{query}}";
