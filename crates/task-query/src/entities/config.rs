//! Configuration entities.
//!
//! Everything the engine needs at query time lives here and is passed in
//! explicitly; nothing is read from global state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::StatusCategory;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryConfig {
    /// Languages keywords are expanded into
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,

    /// User-configured property terms
    #[serde(default)]
    pub user_terms: UserTerms,

    /// Status category definitions
    #[serde(default = "default_status_categories")]
    pub status_categories: Vec<StatusCategoryConfig>,

    /// Extra words mapped to priority values
    #[serde(default)]
    pub priority_mapping: BTreeMap<u8, Vec<String>>,

    /// Scoring coefficients and bucket values
    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Semantic expansion limits
    #[serde(default)]
    pub expansion: ExpansionConfig,

    /// Additional stop words
    #[serde(default)]
    pub stop_words: Vec<String>,

    /// Language model backend
    #[serde(default)]
    pub model: ModelSettings,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl QueryConfig {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Find the definition for a status category
    pub fn status_category(&self, category: StatusCategory) -> Option<&StatusCategoryConfig> {
        self.status_categories.iter().find(|c| c.key == category.key())
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            languages: default_languages(),
            user_terms: UserTerms::default(),
            status_categories: default_status_categories(),
            priority_mapping: BTreeMap::new(),
            scoring: ScoringConfig::default(),
            expansion: ExpansionConfig::default(),
            stop_words: Vec::new(),
            model: ModelSettings::default(),
            log_level: default_log_level(),
        }
    }
}

/// User-configured terms per property, unioned into the `general` bucket
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTerms {
    #[serde(default)]
    pub priority: Vec<String>,
    #[serde(default)]
    pub due_date: Vec<String>,
    #[serde(default)]
    pub status: Vec<String>,
}

/// A status category definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCategoryConfig {
    /// Category key (e.g. "open", "inProgress")
    pub key: String,

    /// Display name
    pub display_name: String,

    /// Alternative names users may type
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Raw status symbols belonging to this category
    #[serde(default)]
    pub symbols: Vec<String>,

    /// Sort order (lower first)
    #[serde(default)]
    pub sort_order: u8,
}

impl StatusCategoryConfig {
    fn new(category: StatusCategory, display: &str, aliases: &[&str], symbols: &[&str], order: u8) -> Self {
        Self {
            key: category.key().to_string(),
            display_name: display.to_string(),
            aliases: aliases.iter().map(ToString::to_string).collect(),
            symbols: symbols.iter().map(ToString::to_string).collect(),
            sort_order: order,
        }
    }
}

fn default_status_categories() -> Vec<StatusCategoryConfig> {
    vec![
        StatusCategoryConfig::new(
            StatusCategory::Open,
            "Open",
            &["todo", "pending", "incomplete", "new", "未完成", "待办", "öppen"],
            &[" ", ""],
            1,
        ),
        StatusCategoryConfig::new(
            StatusCategory::InProgress,
            "In progress",
            &["in progress", "in-progress", "doing", "started", "wip", "进行中", "pågående"],
            &["/"],
            2,
        ),
        StatusCategoryConfig::new(
            StatusCategory::Completed,
            "Completed",
            &["done", "finished", "complete", "closed", "已完成", "完成", "klar"],
            &["x", "X"],
            3,
        ),
        StatusCategoryConfig::new(
            StatusCategory::Cancelled,
            "Cancelled",
            &["canceled", "abandoned", "dropped", "已取消", "取消", "avbruten"],
            &["-"],
            4,
        ),
    ]
}

/// Scoring coefficients and bucket values
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringConfig {
    #[serde(default = "default_relevance_coefficient")]
    pub relevance_coefficient: f64,

    #[serde(default = "default_due_date_coefficient")]
    pub due_date_coefficient: f64,

    #[serde(default = "default_unit_coefficient")]
    pub priority_coefficient: f64,

    #[serde(default = "default_unit_coefficient")]
    pub status_coefficient: f64,

    /// Extra weight for matches on core (pre-expansion) keywords
    #[serde(default = "default_core_keyword_weight")]
    pub core_keyword_weight: f64,

    #[serde(default)]
    pub due_date: DueDateScores,

    #[serde(default)]
    pub priority: PriorityScores,

    #[serde(default)]
    pub status: StatusScores,
}

const fn default_relevance_coefficient() -> f64 {
    20.0
}

const fn default_due_date_coefficient() -> f64 {
    4.0
}

const fn default_unit_coefficient() -> f64 {
    1.0
}

const fn default_core_keyword_weight() -> f64 {
    0.2
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            relevance_coefficient: default_relevance_coefficient(),
            due_date_coefficient: default_due_date_coefficient(),
            priority_coefficient: default_unit_coefficient(),
            status_coefficient: default_unit_coefficient(),
            core_keyword_weight: default_core_keyword_weight(),
            due_date: DueDateScores::default(),
            priority: PriorityScores::default(),
            status: StatusScores::default(),
        }
    }
}

/// Due-date urgency buckets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DueDateScores {
    pub overdue: f64,
    pub within_7_days: f64,
    pub within_1_month: f64,
    pub later: f64,
    pub none: f64,
}

impl Default for DueDateScores {
    fn default() -> Self {
        Self {
            overdue: 1.5,
            within_7_days: 1.0,
            within_1_month: 0.5,
            later: 0.2,
            none: 0.1,
        }
    }
}

/// Priority buckets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PriorityScores {
    pub p1: f64,
    pub p2: f64,
    pub p3: f64,
    pub p4: f64,
    pub none: f64,
}

impl Default for PriorityScores {
    fn default() -> Self {
        Self {
            p1: 1.0,
            p2: 0.75,
            p3: 0.5,
            p4: 0.2,
            none: 0.1,
        }
    }
}

/// Status category buckets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatusScores {
    pub open: f64,
    pub in_progress: f64,
    pub completed: f64,
    pub cancelled: f64,
    pub other: f64,
}

impl Default for StatusScores {
    fn default() -> Self {
        Self {
            open: 1.0,
            in_progress: 0.75,
            completed: 0.2,
            cancelled: 0.1,
            other: 0.5,
        }
    }
}

/// Semantic expansion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpansionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Expansions requested per core keyword per language
    #[serde(default = "default_expansions_per_language")]
    pub expansions_per_language: u8,
}

const fn default_true() -> bool {
    true
}

const fn default_expansions_per_language() -> u8 {
    5
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            expansions_per_language: default_expansions_per_language(),
        }
    }
}

/// Language model backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSettings {
    /// Provider name ("openai", "anthropic", "ollama")
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model ID
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// API key; the provider's environment variable is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Optional base URL override
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "baseURL")]
    pub base_url: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model_id() -> String {
    "gpt-4o-mini".to_string()
}

const fn default_max_tokens() -> u32 {
    2000
}

const fn default_temperature() -> f32 {
    0.1
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model_id: default_model_id(),
            api_key: None,
            base_url: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_languages() -> Vec<String> {
    vec!["English".to_string(), "中文".to_string()]
}

fn default_log_level() -> String {
    "warn".to_string()
}
