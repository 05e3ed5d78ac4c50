//! Task entity and related types.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Status category derived from a task's raw status symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum StatusCategory {
    #[default]
    Open,
    InProgress,
    Completed,
    Cancelled,
    Other,
}

impl StatusCategory {
    /// All categories in their default sort order.
    pub const ALL: [Self; 5] = [
        Self::Open,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
        Self::Other,
    ];

    /// Configuration key for this category.
    pub fn key(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "inProgress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Other => "other",
        }
    }

    /// Look up a category by its configuration key (case-insensitive).
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(key))
    }

    /// Whether the task still needs work.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Open | Self::InProgress)
    }
}

impl std::fmt::Display for StatusCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::InProgress => write!(f, "in-progress"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A task record supplied by the task source.
///
/// Treated as an immutable value for the duration of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Identifier unique within the task source; assigned by position when absent
    #[serde(default)]
    pub id: String,

    /// Free text of the task line
    pub text: String,

    /// Raw status symbol (e.g. " ", "x", "/", "-")
    #[serde(default)]
    pub status: String,

    /// Category derived from `status`; filled in by the source when missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_category: Option<StatusCategory>,

    /// Priority 1-4, 1 is highest
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,

    /// Source path (folder and file) the task was read from
    #[serde(default)]
    pub folder: String,

    /// Line number within the source file
    #[serde(default)]
    pub line: usize,
}

impl Task {
    /// Create a new open task with minimal required fields
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            status: " ".to_string(),
            status_category: Some(StatusCategory::Open),
            priority: None,
            due_date: None,
            created_date: None,
            completed_date: None,
            tags: BTreeSet::new(),
            folder: String::new(),
            line: 0,
        }
    }

    /// Set the priority
    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the due date
    pub fn with_due_date(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }

    /// Set the status symbol and its category
    pub fn with_status(mut self, symbol: impl Into<String>, category: StatusCategory) -> Self {
        self.status = symbol.into();
        self.status_category = Some(category);
        self
    }

    /// Add a tag (leading `#` is stripped)
    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.insert(normalize_tag(tag));
        self
    }

    /// Set the source folder
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    /// Category, treating an underived one as `Other`
    pub fn category(&self) -> StatusCategory {
        self.status_category.unwrap_or(StatusCategory::Other)
    }

    /// Lowercased text used for keyword matching
    pub fn search_text(&self) -> String {
        self.text.to_lowercase()
    }

    /// Whether the task carries a tag (case-insensitive, `#` optional)
    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = normalize_tag(tag);
        self.tags.iter().any(|t| normalize_tag(t) == wanted)
    }
}

/// Normalize a tag for comparison: strip `#` and lowercase.
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().trim_start_matches('#').to_lowercase()
}
