//! Property term registry.
//!
//! Three term layers feed property recognition, in precedence order:
//! user-configured terms, built-in multilingual terms, and the semantic
//! expansions a language model produced for the current query. The layers
//! are combined by [`merge_term_sources`]; nothing here mutates a source.

mod builtin;

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::entities::{QueryConfig, StatusCategory, StatusCategoryConfig, Task, UserTerms};

pub use builtin::builtin_terms;
use builtin::{DUE_DATE_BUCKETS, PRIORITY_BUCKETS};

/// Name of the bucket user terms are merged into
pub const GENERAL: &str = "general";

/// A structured task property recognizable in query text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Property {
    Priority,
    DueDate,
    Status,
}

impl Property {
    pub const ALL: [Self; 3] = [Self::Priority, Self::DueDate, Self::Status];
}

/// Terms for one property, grouped by semantic bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PropertyTermSet {
    buckets: BTreeMap<String, Vec<String>>,
}

impl PropertyTermSet {
    /// Terms signalling the property in general ("priority", "due", ...)
    pub fn general(&self) -> &[String] {
        self.bucket(GENERAL).unwrap_or_default()
    }

    pub fn bucket(&self, name: &str) -> Option<&[String]> {
        self.buckets.get(name).map(Vec::as_slice)
    }

    pub fn buckets(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.buckets.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Every term in every bucket
    pub fn all_terms(&self) -> impl Iterator<Item = &str> {
        self.buckets.values().flatten().map(String::as_str)
    }

    /// Find the non-general bucket containing `term` (case-insensitive)
    pub fn bucket_of(&self, term: &str) -> Option<&str> {
        let term = term.trim().to_lowercase();
        self.buckets
            .iter()
            .filter(|(name, _)| name.as_str() != GENERAL)
            .find(|(_, terms)| terms.iter().any(|t| t.to_lowercase() == term))
            .map(|(name, _)| name.as_str())
    }

    /// Append terms to a bucket, skipping case-insensitive duplicates
    pub(crate) fn extend_bucket(&mut self, bucket: &str, terms: impl IntoIterator<Item = String>) {
        let list = self.buckets.entry(bucket.to_string()).or_default();
        let mut seen: HashSet<String> = list.iter().map(|t| t.to_lowercase()).collect();
        for term in terms {
            let trimmed = term.trim();
            if !trimmed.is_empty() && seen.insert(trimmed.to_lowercase()) {
                list.push(trimmed.to_string());
            }
        }
    }
}

/// Merge the three term layers for one property.
///
/// The `general` bucket becomes `user ++ builtin.general ++ expanded` with
/// case-insensitive duplicates dropped (first occurrence wins, so earlier
/// layers take precedence). Other buckets come from `builtin` unchanged.
pub fn merge_term_sources(
    user: &[String],
    builtin: &PropertyTermSet,
    expanded: &[String],
) -> PropertyTermSet {
    let mut merged = PropertyTermSet::default();
    merged.extend_bucket(
        GENERAL,
        user.iter()
            .chain(builtin.general())
            .chain(expanded)
            .cloned(),
    );
    for (name, terms) in builtin.buckets() {
        if name != GENERAL {
            merged.extend_bucket(name, terms.iter().cloned());
        }
    }
    merged
}

static PRIORITY_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:p|priority\s*|prio\s*)?([1-4])$").expect("Invalid regex")
});

/// Read-only registry of property terms built from configuration
#[derive(Debug, Clone)]
pub struct TermRegistry {
    user: UserTerms,
    status_categories: Vec<StatusCategoryConfig>,
    priority_mapping: BTreeMap<u8, Vec<String>>,
}

impl TermRegistry {
    /// Build a registry from configuration
    pub fn from_config(config: &QueryConfig) -> Self {
        Self {
            user: config.user_terms.clone(),
            status_categories: config.status_categories.clone(),
            priority_mapping: config.priority_mapping.clone(),
        }
    }

    fn user_terms(&self, property: Property) -> &[String] {
        match property {
            Property::Priority => &self.user.priority,
            Property::DueDate => &self.user.due_date,
            Property::Status => &self.user.status,
        }
    }

    /// Built-in terms plus the configured status aliases and priority mapping
    fn builtin_with_config(&self, property: Property) -> PropertyTermSet {
        let mut set = builtin_terms(property);
        match property {
            Property::Status => {
                for category in &self.status_categories {
                    set.extend_bucket(
                        &category.key,
                        std::iter::once(category.display_name.clone())
                            .chain(category.aliases.iter().cloned()),
                    );
                }
            }
            Property::Priority => {
                for (value, words) in &self.priority_mapping {
                    if let Some((bucket, _)) = PRIORITY_BUCKETS.iter().find(|(_, v)| v == value) {
                        set.extend_bucket(bucket, words.iter().cloned());
                    }
                }
            }
            Property::DueDate => {}
        }
        set
    }

    /// User terms unioned with built-in terms
    pub fn merged_terms(&self, property: Property) -> PropertyTermSet {
        self.merged_terms_with_expansion(property, &[])
    }

    /// All three layers: user, built-in, model-expanded
    pub fn merged_terms_with_expansion(
        &self,
        property: Property,
        expanded: &[String],
    ) -> PropertyTermSet {
        merge_term_sources(
            self.user_terms(property),
            &self.builtin_with_config(property),
            expanded,
        )
    }

    /// Resolve a status token to a category key.
    ///
    /// Checks the category key, then aliases and display name, then raw
    /// status symbols. First match wins.
    pub fn resolve_status_value(&self, token: &str) -> Option<String> {
        self.resolve_status_name(token)
            .or_else(|| self.symbol_match(token))
    }

    /// Like [`Self::resolve_status_value`] without the raw symbol stage
    pub fn resolve_status_name(&self, token: &str) -> Option<String> {
        let wanted = compact(token);
        if wanted.is_empty() {
            return None;
        }

        if let Some(category) = self
            .status_categories
            .iter()
            .find(|c| compact(&c.key) == wanted)
        {
            return Some(category.key.clone());
        }

        self.status_categories
            .iter()
            .find(|c| {
                compact(&c.display_name) == wanted
                    || c.aliases.iter().any(|a| compact(a) == wanted)
            })
            .map(|c| c.key.clone())
    }

    fn symbol_match(&self, token: &str) -> Option<String> {
        self.status_categories
            .iter()
            .find(|c| c.symbols.iter().any(|s| s == token))
            .map(|c| c.key.clone())
    }

    /// Category for a raw status symbol; unknown symbols are `Other`
    pub fn category_for_symbol(&self, symbol: &str) -> StatusCategory {
        self.symbol_match(symbol)
            .and_then(|key| StatusCategory::from_key(&key))
            .unwrap_or(StatusCategory::Other)
    }

    /// Category of a task, derived from its symbol when not set
    pub fn category_of(&self, task: &Task) -> StatusCategory {
        task.status_category
            .unwrap_or_else(|| self.category_for_symbol(&task.status))
    }

    /// Configured category key of a task.
    ///
    /// A built-in category set on the task wins; otherwise the symbol is
    /// looked up, which is the only way to reach custom categories.
    pub fn status_key_of(&self, task: &Task) -> String {
        match task.status_category {
            Some(category) if category != StatusCategory::Other => category.key().to_string(),
            _ => self
                .symbol_match(&task.status)
                .unwrap_or_else(|| StatusCategory::Other.key().to_string()),
        }
    }

    /// Configured categories ordered by their sort order
    pub fn status_categories(&self) -> Vec<&StatusCategoryConfig> {
        let mut categories: Vec<_> = self.status_categories.iter().collect();
        categories.sort_by_key(|c| c.sort_order);
        categories
    }

    /// Resolve a priority token (`1`, `p2`, `priority 3`, `high`, `低`) to 1-4
    pub fn resolve_priority_value(&self, token: &str) -> Option<u8> {
        let wanted = token.trim().to_lowercase();
        if let Some(cap) = PRIORITY_NUMBER.captures(&wanted) {
            return cap[1].parse().ok();
        }

        if let Some((value, _)) = self
            .priority_mapping
            .iter()
            .find(|(_, words)| words.iter().any(|w| w.trim().to_lowercase() == wanted))
        {
            return Some(*value);
        }

        let bucket = builtin_terms(Property::Priority).bucket_of(&wanted)?.to_string();
        PRIORITY_BUCKETS
            .iter()
            .find(|(name, _)| *name == bucket)
            .map(|(_, value)| *value)
    }

    /// Resolve a due-date term (`今天`, `next week`, `overdue`) to a date token
    pub fn resolve_due_date_term(&self, term: &str) -> Option<&'static str> {
        let bucket = builtin_terms(Property::DueDate).bucket_of(term)?.to_string();
        DUE_DATE_BUCKETS
            .iter()
            .find(|(name, _)| *name == bucket)
            .map(|(_, token)| *token)
    }

    /// Every recognized property term, lowercased
    pub fn all_property_terms(&self) -> BTreeSet<String> {
        Property::ALL
            .into_iter()
            .flat_map(|p| {
                self.merged_terms(p)
                    .all_terms()
                    .map(str::to_lowercase)
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

/// Lowercase and drop spaces, dashes and underscores
fn compact(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> TermRegistry {
        let mut config = QueryConfig::default();
        config.user_terms.priority = vec!["Wichtig".to_string(), "priority".to_string()];
        config.priority_mapping.insert(1, vec!["asap".to_string()]);
        TermRegistry::from_config(&config)
    }

    #[test]
    fn test_merge_precedence_and_dedup() {
        let builtin = builtin_terms(Property::Priority);
        let user = vec!["Wichtig".to_string(), "PRIORITY".to_string()];
        let expanded = vec!["wichtig".to_string(), "prioridad".to_string()];

        let merged = merge_term_sources(&user, &builtin, &expanded);
        let general = merged.general();

        assert_eq!(general[0], "Wichtig");
        assert_eq!(general[1], "PRIORITY");
        assert!(!general.iter().any(|t| t == "priority"));
        assert_eq!(general.last().map(String::as_str), Some("prioridad"));
        assert_eq!(general.iter().filter(|t| t.eq_ignore_ascii_case("wichtig")).count(), 1);
        assert_eq!(merged.bucket("high"), builtin.bucket("high"));
    }

    #[test]
    fn test_merge_does_not_mutate_sources() {
        let builtin = builtin_terms(Property::Status);
        let before = builtin.clone();
        let user = vec!["zustand".to_string()];
        let _ = merge_term_sources(&user, &builtin, &[]);
        assert_eq!(builtin, before);
    }

    #[test]
    fn test_user_terms_never_replace_general() {
        let merged = registry().merged_terms(Property::Priority);
        let builtin = builtin_terms(Property::Priority);
        for term in builtin.general() {
            assert!(merged.general().iter().any(|t| t.eq_ignore_ascii_case(term)));
        }
        assert!(merged.general().iter().any(|t| t == "Wichtig"));
    }

    #[test]
    fn test_resolve_status_value_order() {
        let registry = registry();
        assert_eq!(registry.resolve_status_value("completed"), Some("completed".to_string()));
        assert_eq!(registry.resolve_status_value("In-Progress"), Some("inProgress".to_string()));
        assert_eq!(registry.resolve_status_value("done"), Some("completed".to_string()));
        assert_eq!(registry.resolve_status_value("已完成"), Some("completed".to_string()));
        assert_eq!(registry.resolve_status_value("x"), Some("completed".to_string()));
        assert_eq!(registry.resolve_status_value("/"), Some("inProgress".to_string()));
        assert_eq!(registry.resolve_status_value(" "), Some("open".to_string()));
        assert_eq!(registry.resolve_status_value("nonsense"), None);
    }

    #[test]
    fn test_key_match_beats_alias() {
        let mut config = QueryConfig::default();
        // An alias that collides with another category's key
        config.status_categories[0].aliases.push("completed".to_string());
        let registry = TermRegistry::from_config(&config);
        assert_eq!(registry.resolve_status_value("completed"), Some("completed".to_string()));
    }

    #[test]
    fn test_category_for_symbol() {
        let registry = registry();
        assert_eq!(registry.category_for_symbol("X"), StatusCategory::Completed);
        assert_eq!(registry.category_for_symbol("-"), StatusCategory::Cancelled);
        assert_eq!(registry.category_for_symbol("?"), StatusCategory::Other);
    }

    fn waiting_config() -> QueryConfig {
        let mut config = QueryConfig::default();
        config.status_categories.push(
            serde_json::from_str(
                r#"{"key": "waiting", "displayName": "Waiting", "aliases": ["blocked"], "symbols": ["w"]}"#,
            )
            .unwrap(),
        );
        config
    }

    #[test]
    fn test_status_key_of_custom_category() {
        let registry = TermRegistry::from_config(&waiting_config());
        let derived = Task {
            status: "w".into(),
            status_category: None,
            ..Task::new("1", "Wait for vendor")
        };
        let loaded = Task {
            status_category: Some(StatusCategory::Other),
            ..derived.clone()
        };

        assert_eq!(registry.resolve_status_value("blocked"), Some("waiting".to_string()));
        assert_eq!(registry.status_key_of(&derived), "waiting");
        assert_eq!(registry.status_key_of(&loaded), "waiting");
        assert_eq!(registry.category_of(&derived), StatusCategory::Other);
    }

    #[test]
    fn test_status_key_of_prefers_explicit_category() {
        let registry = registry();
        let task = Task::new("1", "Ship").with_status("x", StatusCategory::Cancelled);
        assert_eq!(registry.status_key_of(&task), "cancelled");

        let derived = Task {
            status: "/".into(),
            status_category: None,
            ..Task::new("2", "Refactor")
        };
        assert_eq!(registry.status_key_of(&derived), "inProgress");
        assert_eq!(registry.category_of(&derived), StatusCategory::InProgress);
    }

    #[test]
    fn test_resolve_priority_value() {
        let registry = registry();
        assert_eq!(registry.resolve_priority_value("1"), Some(1));
        assert_eq!(registry.resolve_priority_value("P3"), Some(3));
        assert_eq!(registry.resolve_priority_value("priority 2"), Some(2));
        assert_eq!(registry.resolve_priority_value("high"), Some(1));
        assert_eq!(registry.resolve_priority_value("低"), Some(3));
        assert_eq!(registry.resolve_priority_value("asap"), Some(1));
        assert_eq!(registry.resolve_priority_value("5"), None);
        assert_eq!(registry.resolve_priority_value("whenever"), None);
    }

    #[test]
    fn test_resolve_due_date_term() {
        let registry = registry();
        assert_eq!(registry.resolve_due_date_term("今天"), Some("today"));
        assert_eq!(registry.resolve_due_date_term("Next Week"), Some("next-week"));
        assert_eq!(registry.resolve_due_date_term("due"), None);
    }

    #[test]
    fn test_all_property_terms_include_user_terms() {
        let terms = registry().all_property_terms();
        assert!(terms.contains("wichtig"));
        assert!(terms.contains("deadline"));
        assert!(terms.contains("已完成"));
    }
}
