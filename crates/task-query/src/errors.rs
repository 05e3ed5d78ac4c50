//! Error types for the task-query crate.
//!
//! Query understanding itself never fails: parsing, ranking and date
//! resolution degrade to keyword search. These errors surface only from
//! loaders, provider adapters and the CLI.

use thiserror::Error;

/// Errors raised while loading inputs or talking to a model backend
#[derive(Error, Debug, Clone)]
pub enum QueryError {
    // Input errors
    #[error("Invalid priority: '{priority}'")]
    InvalidPriority { priority: String },

    #[error("Invalid date: '{date}'")]
    InvalidDate { date: String },

    #[error("Unknown sort field: '{field}'")]
    InvalidSortField { field: String },

    // File errors
    #[error("Failed to read file '{path}': {reason}")]
    FileReadError { path: String, reason: String },

    #[error("Failed to parse JSON: {reason}")]
    JsonParseError { reason: String },

    // Configuration errors
    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    // AI errors
    #[error("AI error: {0}")]
    Ai(String),

    #[error("AI provider not configured: {provider}")]
    ProviderNotConfigured { provider: String },

    #[error("Unknown AI provider: {provider}")]
    UnknownProvider { provider: String },

    #[error("AI response parse error: {reason}")]
    AiResponseParseError { reason: String },

    #[error("AI request timeout")]
    AiTimeout,

    // Template errors
    #[error("Prompt template error: {reason}")]
    TemplateError { reason: String },
}

impl From<std::io::Error> for QueryError {
    fn from(err: std::io::Error) -> Self {
        Self::FileReadError {
            path: String::new(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for QueryError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonParseError {
            reason: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for QueryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::AiTimeout
        } else {
            Self::Ai(format!("Request failed: {err}"))
        }
    }
}

/// Result type alias for task-query operations
pub type QueryResult<T> = Result<T, QueryError>;
