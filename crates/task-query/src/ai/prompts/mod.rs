//! Prompt template system for model-assisted parsing.
//!
//! Templates are Handlebars strings rendered with a serializable context.
//! HTML escaping is disabled since output goes to a model, not a browser.

use std::collections::HashMap;

use handlebars::{handlebars_helper, Handlebars};
use serde::Serialize;

use crate::errors::{QueryError, QueryResult};

mod parse_query;

pub use parse_query::{ParseQueryContext, StatusCategorySummary, PARSE_QUERY_TEMPLATE_ID};

/// A prompt template with system and user messages.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// Template ID
    pub id: String,
    /// Template version
    pub version: String,
    pub description: String,
    /// System prompt template
    pub system: String,
    /// User prompt template
    pub user: String,
}

impl PromptTemplate {
    /// Create a new prompt template.
    pub fn new(id: impl Into<String>, system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: "1.0.0".to_string(),
            description: String::new(),
            system: system.into(),
            user: user.into(),
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Render the template, returning `(system, user)`.
    pub fn render<T: Serialize>(&self, context: &T) -> QueryResult<(String, String)> {
        let mut handlebars = create_handlebars();

        handlebars
            .register_template_string("system", &self.system)
            .map_err(|e| QueryError::TemplateError {
                reason: format!("Invalid system template '{}': {e}", self.id),
            })?;
        handlebars
            .register_template_string("user", &self.user)
            .map_err(|e| QueryError::TemplateError {
                reason: format!("Invalid user template '{}': {e}", self.id),
            })?;

        let system = handlebars
            .render("system", context)
            .map_err(|e| QueryError::TemplateError {
                reason: format!("Failed to render system prompt: {e}"),
            })?;
        let user = handlebars
            .render("user", context)
            .map_err(|e| QueryError::TemplateError {
                reason: format!("Failed to render user prompt: {e}"),
            })?;

        Ok((system, user))
    }
}

// {{#if (gt count 0)}}
handlebars_helper!(gt: |a: i64, b: i64| a > b);

// {{{json value}}}
handlebars_helper!(json: |value: Json| {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
});

// {{join list ", "}}
handlebars_helper!(join: |list: array, sep: str| {
    list.iter()
        .map(|v| v.as_str().map_or_else(|| v.to_string(), ToString::to_string))
        .collect::<Vec<_>>()
        .join(sep)
});

/// Create a Handlebars instance with custom helpers.
fn create_handlebars() -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.register_helper("gt", Box::new(gt));
    handlebars.register_helper("json", Box::new(json));
    handlebars.register_helper("join", Box::new(join));
    handlebars
}

/// Registry of named prompt templates.
pub struct PromptManager {
    templates: HashMap<String, PromptTemplate>,
}

impl PromptManager {
    /// Create a manager with the built-in templates registered.
    pub fn new() -> Self {
        let mut manager = Self {
            templates: HashMap::new(),
        };
        manager.register(parse_query::template());
        manager
    }

    /// Register a template, replacing any with the same ID.
    pub fn register(&mut self, template: PromptTemplate) {
        self.templates.insert(template.id.clone(), template);
    }

    pub fn get(&self, id: &str) -> Option<&PromptTemplate> {
        self.templates.get(id)
    }

    /// Render a template with context.
    pub fn render<T: Serialize>(&self, id: &str, context: &T) -> QueryResult<(String, String)> {
        let template = self.get(id).ok_or_else(|| QueryError::TemplateError {
            reason: format!("Template '{id}' not found"),
        })?;
        template.render(context)
    }

    /// List all template IDs.
    pub fn template_ids(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).collect()
    }
}

impl Default for PromptManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_template_rendering() {
        let template = PromptTemplate::new(
            "test",
            "You are a {{role}}",
            "{{#if (gt count 0)}}Expand {{count}}: {{/if}}{{query}}",
        );

        let context = json!({
            "role": "query parser",
            "count": 3,
            "query": "fix <login> & auth"
        });

        let (system, user) = template.render(&context).unwrap();

        assert_eq!(system, "You are a query parser");
        assert_eq!(user, "Expand 3: fix <login> & auth");
    }

    #[test]
    fn test_json_and_join_helpers() {
        let template = PromptTemplate::new("test", "{{join languages \", \"}}", "Terms: {{{json terms}}}");

        let context = json!({
            "languages": ["English", "中文"],
            "terms": {"general": ["priority"]}
        });

        let (system, user) = template.render(&context).unwrap();

        assert_eq!(system, "English, 中文");
        assert!(user.contains("\"general\": ["));
    }

    #[test]
    fn test_invalid_template() {
        let template = PromptTemplate::new("broken", "{{#if x}}", "");
        let err = template.render(&json!({})).unwrap_err();
        assert!(matches!(err, QueryError::TemplateError { .. }));
    }

    #[test]
    fn test_prompt_manager() {
        let manager = PromptManager::new();
        assert!(manager.get(PARSE_QUERY_TEMPLATE_ID).is_some());
        assert_eq!(manager.template_ids(), vec![PARSE_QUERY_TEMPLATE_ID]);
        assert!(manager.render("missing", &json!({})).is_err());
    }
}
