//! Parsed query entity.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::dates::{resolve_date_expression, DateFilter};

/// Which branch of the parser produced a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ParseSource {
    /// Deterministic template match, no model call
    FastPath,
    /// Structured result recovered from the language model
    Model,
    /// Keyword-only result after the model path was unavailable or failed
    #[default]
    Fallback,
}

impl std::fmt::Display for ParseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FastPath => write!(f, "fast-path"),
            Self::Model => write!(f, "model"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Metadata describing how keyword expansion went
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpansionMetadata {
    pub enabled: bool,
    pub language_count: usize,
    /// Expected expansions per core keyword (per-language count x languages)
    pub expected_per_keyword: usize,
    /// Expanded keywords actually obtained per core keyword
    pub achieved_ratio: f64,
}

/// Structured filter plus keyword set extracted from a free-text query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedQuery {
    /// The query text as typed
    pub original: String,

    /// Content tokens before expansion
    pub core_keywords: Vec<String>,

    /// Core keywords plus semantic expansions, deduplicated
    pub keywords: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,

    /// Due-date token (`today`, `next-week`, `2w`, ...) or ISO date
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,

    /// Status category key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,

    #[serde(default)]
    pub expansion: ExpansionMetadata,

    #[serde(default)]
    pub source: ParseSource,
}

impl ParsedQuery {
    /// Create an empty query for the given text
    pub fn new(original: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            ..Self::default()
        }
    }

    /// Resolve the due-date token against `today`
    pub fn due_filter(&self, today: NaiveDate) -> DateFilter {
        self.due_date
            .as_deref()
            .map_or(DateFilter::NoFilter, |token| {
                resolve_date_expression(token, today)
            })
    }

    /// Whether any structured property filter is set
    pub fn has_property_filters(&self) -> bool {
        self.priority.is_some() || self.due_date.is_some() || self.status.is_some()
    }

    /// Whether the query carries no filter and no keywords at all
    pub fn is_empty(&self) -> bool {
        !self.has_property_filters()
            && self.keywords.is_empty()
            && self.folder.is_none()
            && self.tags.is_empty()
    }
}
