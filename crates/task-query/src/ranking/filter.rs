//! Hard filtering of tasks by a parsed query.

use chrono::NaiveDate;

use crate::entities::{ParsedQuery, Task};
use crate::terms::TermRegistry;

/// Keep tasks matching every filter the query sets.
///
/// Property filters must all hold; keywords match if any one of them is a
/// substring of the task text. A query without keywords keeps every task
/// that passes the property filters.
pub fn filter_tasks<'a>(
    tasks: &'a [Task],
    query: &ParsedQuery,
    registry: &TermRegistry,
    today: NaiveDate,
) -> Vec<&'a Task> {
    let due_filter = query.due_filter(today);
    let folder = query.folder.as_deref().map(str::to_lowercase);
    let keywords: Vec<String> = query.keywords.iter().map(|k| k.to_lowercase()).collect();

    let kept: Vec<&Task> = tasks
        .iter()
        .filter(|task| query.priority.map_or(true, |p| task.priority == Some(p)))
        .filter(|task| due_filter.matches(task.due_date))
        .filter(|task| {
            query
                .status
                .as_deref()
                .map_or(true, |status| registry.status_key_of(task).eq_ignore_ascii_case(status))
        })
        .filter(|task| {
            folder
                .as_deref()
                .map_or(true, |f| task.folder.to_lowercase().contains(f))
        })
        .filter(|task| query.tags.iter().all(|tag| task.has_tag(tag)))
        .filter(|task| {
            if keywords.is_empty() {
                return true;
            }
            let text = task.search_text();
            keywords.iter().any(|k| text.contains(k.as_str()))
        })
        .collect();

    tracing::debug!(total = tasks.len(), kept = kept.len(), "Filtered tasks");
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{QueryConfig, StatusCategory};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn tasks() -> Vec<Task> {
        let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
        vec![
            Task::new("1", "Fix billing export")
                .with_priority(1)
                .with_due_date(d(1, 1))
                .with_tag("#work")
                .with_folder("projects/billing"),
            Task::new("2", "Update invoice template")
                .with_priority(2)
                .with_due_date(d(1, 20))
                .with_status("x", StatusCategory::Completed),
            Task::new("3", "Call the bank").with_tag("personal"),
            Task {
                status: "/".into(),
                status_category: None,
                ..Task::new("4", "Billing dashboard redesign")
            },
        ]
    }

    fn filter(query: &ParsedQuery) -> Vec<String> {
        let registry = TermRegistry::from_config(&QueryConfig::default());
        let tasks = tasks();
        filter_tasks(&tasks, query, &registry, today())
            .into_iter()
            .map(|t| t.id.clone())
            .collect()
    }

    #[test]
    fn test_empty_query_keeps_all() {
        assert_eq!(filter(&ParsedQuery::new("")).len(), 4);
    }

    #[test]
    fn test_property_filters() {
        let mut query = ParsedQuery::new("");
        query.priority = Some(1);
        assert_eq!(filter(&query), vec!["1"]);

        let mut query = ParsedQuery::new("");
        query.due_date = Some("today".into());
        assert_eq!(filter(&query), vec!["1"]);

        let mut query = ParsedQuery::new("");
        query.due_date = Some("any".into());
        assert_eq!(filter(&query), vec!["1", "2"]);

        let mut query = ParsedQuery::new("");
        query.status = Some("completed".into());
        assert_eq!(filter(&query), vec!["2"]);
    }

    #[test]
    fn test_status_derived_from_symbol() {
        let mut query = ParsedQuery::new("");
        query.status = Some("inProgress".into());
        assert_eq!(filter(&query), vec!["4"]);
    }

    #[test]
    fn test_custom_status_category() {
        let mut config = QueryConfig::default();
        config.status_categories.push(
            serde_json::from_str(
                r#"{"key": "waiting", "displayName": "Waiting", "aliases": ["blocked"], "symbols": ["w"]}"#,
            )
            .unwrap(),
        );
        let registry = TermRegistry::from_config(&config);
        let tasks = vec![
            Task {
                status: "w".into(),
                status_category: None,
                ..Task::new("w1", "Vendor reply")
            },
            Task {
                status: "w".into(),
                status_category: Some(StatusCategory::Other),
                ..Task::new("w2", "Legal review")
            },
            Task::new("o1", "Open item"),
        ];

        let mut query = ParsedQuery::new("blocked");
        query.status = registry.resolve_status_value("blocked");
        let kept: Vec<_> = filter_tasks(&tasks, &query, &registry, today())
            .into_iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(kept, vec!["w1", "w2"]);
    }

    #[test]
    fn test_keywords_tags_folder() {
        let mut query = ParsedQuery::new("");
        query.keywords = vec!["billing".into(), "invoice".into()];
        assert_eq!(filter(&query), vec!["1", "2", "4"]);

        query.tags.insert("work".into());
        assert_eq!(filter(&query), vec!["1"]);

        let mut query = ParsedQuery::new("");
        query.folder = Some("Projects".into());
        assert_eq!(filter(&query), vec!["1"]);
    }
}
