//! Deterministic templates for common single-filter queries.
//!
//! A query is handled here only if it matches a template completely;
//! anything else goes to the model path.

use std::sync::LazyLock;

use regex::Regex;

use crate::entities::{normalize_tag, ParseSource, ParsedQuery};
use crate::terms::TermRegistry;

/// Bare date keywords accepted on their own
const DATE_KEYWORDS: &[&str] = &[
    "today",
    "tomorrow",
    "overdue",
    "this week",
    "this-week",
    "next week",
    "next-week",
    "future",
    "any",
];

static PRIORITY_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:priority|prio)\s*:?\s*([1-4])$").expect("Invalid regex"));
static PRIORITY_SHORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^p([1-4])$").expect("Invalid regex"));
static PRIORITY_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)\s+priority$").expect("Invalid regex"));
static DUE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^due\s*:?\s+(.+)$").expect("Invalid regex"));
static STATUS_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^status\s*:?\s+(.+)$").expect("Invalid regex"));

/// Try the fast-path templates. Never performs I/O.
pub fn try_fast_path(text: &str, registry: &TermRegistry) -> Option<ParsedQuery> {
    let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    if normalized.is_empty() {
        return None;
    }

    let mut query = ParsedQuery::new(text.trim());
    query.source = ParseSource::FastPath;

    if let Some(priority) = match_priority(&normalized, registry) {
        query.priority = Some(priority);
    } else if let Some(due) = match_due_date(&normalized, registry) {
        query.due_date = Some(due);
    } else if let Some(status) = match_status(&normalized, registry) {
        query.status = Some(status);
    } else if let Some(tags) = match_tags(&normalized) {
        query.tags = tags.into_iter().collect();
    } else {
        return None;
    }

    tracing::debug!(query = %normalized, "Fast path matched");
    Some(query)
}

fn match_priority(text: &str, registry: &TermRegistry) -> Option<u8> {
    if let Some(cap) = PRIORITY_PREFIX
        .captures(text)
        .or_else(|| PRIORITY_SHORT.captures(text))
    {
        return cap[1].parse().ok();
    }
    // "2 priority", "high priority"
    let cap = PRIORITY_SUFFIX.captures(text)?;
    registry.resolve_priority_value(&cap[1])
}

fn match_due_date(text: &str, registry: &TermRegistry) -> Option<String> {
    let expression = DUE_PREFIX
        .captures(text)
        .map_or(text, |cap| cap.get(1).map_or(text, |m| m.as_str()));

    if DATE_KEYWORDS.contains(&expression) {
        return Some(expression.replace(' ', "-"));
    }
    registry
        .resolve_due_date_term(expression)
        .map(ToString::to_string)
}

fn match_status(text: &str, registry: &TermRegistry) -> Option<String> {
    match STATUS_PREFIX.captures(text) {
        Some(cap) => registry.resolve_status_value(&cap[1]),
        None => registry.resolve_status_name(text),
    }
}

fn match_tags(text: &str) -> Option<Vec<String>> {
    let tags: Vec<String> = text
        .split_whitespace()
        .map(|word| {
            word.strip_prefix('#')
                .filter(|tag| !tag.is_empty() && !tag.contains('#'))
                .map(normalize_tag)
        })
        .collect::<Option<_>>()?;
    (!tags.is_empty()).then_some(tags)
}
