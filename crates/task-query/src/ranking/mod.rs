//! Weighted ranking of tasks against a parsed query.
//!
//! Each task gets four component scores (relevance, due date, priority,
//! status). A component only counts when it is activated: relevance when
//! the query has keywords, the others when the query filters on that
//! property or the caller sorts by it.

mod components;
pub mod filter;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::entities::{ParsedQuery, ScoringConfig, StatusCategory, Task};
use crate::errors::QueryError;
use crate::terms::TermRegistry;

pub use components::{due_date_score, priority_score, relevance_score, status_score};
pub use filter::filter_tasks;

/// A field the caller asked to sort by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Relevance,
    DueDate,
    Priority,
    Status,
}

impl FromStr for SortField {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "relevance" | "score" => Ok(Self::Relevance),
            "due" | "duedate" | "date" => Ok(Self::DueDate),
            "priority" | "prio" => Ok(Self::Priority),
            "status" => Ok(Self::Status),
            _ => Err(QueryError::InvalidSortField {
                field: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relevance => write!(f, "relevance"),
            Self::DueDate => write!(f, "due-date"),
            Self::Priority => write!(f, "priority"),
            Self::Status => write!(f, "status"),
        }
    }
}

/// Which scoring components count toward the final score
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activation {
    pub relevance: bool,
    pub due_date: bool,
    pub priority: bool,
    pub status: bool,
}

impl Activation {
    pub fn for_query(query: &ParsedQuery, sort_fields: &[SortField]) -> Self {
        Self {
            relevance: !query.keywords.is_empty(),
            due_date: query.due_date.is_some() || sort_fields.contains(&SortField::DueDate),
            priority: query.priority.is_some() || sort_fields.contains(&SortField::Priority),
            status: query.status.is_some() || sort_fields.contains(&SortField::Status),
        }
    }
}

fn gate(active: bool) -> f64 {
    if active {
        1.0
    } else {
        0.0
    }
}

/// Component scores for one task
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown<'a> {
    pub task: &'a Task,
    /// Status category the status score was taken from
    pub category: StatusCategory,
    pub relevance: f64,
    pub due_date: f64,
    pub priority: f64,
    pub status: f64,
    pub activation: Activation,
    /// Weighted sum of the active components
    pub score: f64,
}

impl<'a> ScoreBreakdown<'a> {
    pub fn compute(
        task: &'a Task,
        query: &ParsedQuery,
        registry: &TermRegistry,
        scoring: &ScoringConfig,
        activation: Activation,
        today: NaiveDate,
    ) -> Self {
        let relevance = relevance_score(&task.search_text(), query, scoring.core_keyword_weight);
        let due_date = due_date_score(task.due_date, today, &scoring.due_date);
        let priority = priority_score(task.priority, &scoring.priority);
        let category = registry.category_of(task);
        let status = status_score(category, &scoring.status);

        let score = relevance * scoring.relevance_coefficient * gate(activation.relevance)
            + due_date * scoring.due_date_coefficient * gate(activation.due_date)
            + priority * scoring.priority_coefficient * gate(activation.priority)
            + status * scoring.status_coefficient * gate(activation.status);

        Self {
            task,
            category,
            relevance,
            due_date,
            priority,
            status,
            activation,
            score,
        }
    }
}

/// Score and order tasks, highest score first.
///
/// The sort is stable: equal scores keep their input order. `sort_fields`
/// only activate components; use [`sort_by_fields`] for plain ordering.
pub fn rank_tasks<'a>(
    tasks: &'a [Task],
    query: &ParsedQuery,
    registry: &TermRegistry,
    scoring: &ScoringConfig,
    sort_fields: &[SortField],
    today: NaiveDate,
) -> Vec<ScoreBreakdown<'a>> {
    let activation = Activation::for_query(query, sort_fields);
    tracing::debug!(?activation, tasks = tasks.len(), "Ranking tasks");

    let mut ranked: Vec<_> = tasks
        .iter()
        .map(|task| ScoreBreakdown::compute(task, query, registry, scoring, activation, today))
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

/// Priority order: 1 before 4, unset last.
pub fn compare_priority(a: Option<u8>, b: Option<u8>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Due-date order: earliest first, unset last.
pub fn compare_due_date(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn status_rank(category: StatusCategory) -> usize {
    StatusCategory::ALL
        .iter()
        .position(|c| *c == category)
        .unwrap_or(StatusCategory::ALL.len())
}

fn compare_by_fields(a: &Task, b: &Task, fields: &[SortField], registry: &TermRegistry) -> Ordering {
    fields
        .iter()
        .map(|field| match field {
            SortField::Relevance => Ordering::Equal,
            SortField::DueDate => compare_due_date(a.due_date, b.due_date),
            SortField::Priority => compare_priority(a.priority, b.priority),
            SortField::Status => {
                status_rank(registry.category_of(a)).cmp(&status_rank(registry.category_of(b)))
            }
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Multi-criteria ordering without scoring. Stable.
pub fn sort_by_fields(tasks: &mut [&Task], fields: &[SortField], registry: &TermRegistry) {
    tasks.sort_by(|a, b| compare_by_fields(a, b, fields, registry));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn registry() -> TermRegistry {
        TermRegistry::from_config(&crate::entities::QueryConfig::default())
    }

    fn ids(ranked: &[ScoreBreakdown<'_>]) -> Vec<String> {
        ranked.iter().map(|r| r.task.id.clone()).collect()
    }

    #[test]
    fn test_sort_field_parsing() {
        assert_eq!("due-date".parse::<SortField>().unwrap(), SortField::DueDate);
        assert_eq!("Priority".parse::<SortField>().unwrap(), SortField::Priority);
        assert_eq!("score".parse::<SortField>().unwrap(), SortField::Relevance);
        let err = "size".parse::<SortField>().unwrap_err();
        assert!(matches!(err, QueryError::InvalidSortField { .. }));
    }

    #[test]
    fn test_priority_only_activation() {
        let tasks = vec![
            Task::new("low", "Write report").with_priority(3),
            Task::new("high", "Write report").with_priority(1),
        ];
        let mut query = ParsedQuery::new("p1");
        query.priority = Some(1);

        let ranked = rank_tasks(&tasks, &query, &registry(), &ScoringConfig::default(), &[], today());

        assert_eq!(ids(&ranked), vec!["high", "low"]);
        assert!(!ranked[0].activation.relevance);
        assert!(!ranked[0].activation.due_date);
        assert!((ranked[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_inactive_components_do_not_count() {
        let tasks = vec![Task::new("1", "Billing export").with_priority(1)];
        let query = ParsedQuery::new("");

        let ranked = rank_tasks(&tasks, &query, &registry(), &ScoringConfig::default(), &[], today());
        assert!(ranked[0].score.abs() < f64::EPSILON);
        // components are still reported
        assert!(ranked[0].priority > 0.0);
    }

    #[test]
    fn test_relevance_dominates() {
        let tasks = vec![
            Task::new("urgent", "Call the dentist").with_due_date(today()),
            Task::new("match", "Fix billing export"),
        ];
        let mut query = ParsedQuery::new("billing due today");
        query.core_keywords = vec!["billing".into()];
        query.keywords = vec!["billing".into(), "invoice".into()];
        query.due_date = Some("today".into());

        let ranked = rank_tasks(&tasks, &query, &registry(), &ScoringConfig::default(), &[], today());
        assert_eq!(ids(&ranked), vec!["match", "urgent"]);
    }

    #[test]
    fn test_stable_for_equal_scores() {
        let tasks = vec![Task::new("a", "x"), Task::new("b", "x"), Task::new("c", "x")];
        let ranked = rank_tasks(&tasks, &ParsedQuery::new(""), &registry(), &ScoringConfig::default(), &[], today());
        assert_eq!(ids(&ranked), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sort_fields_activate_without_reordering_ties() {
        let d = |day| NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
        let tasks = vec![
            Task::new("later", "x").with_due_date(d(20)),
            Task::new("none", "x"),
            Task::new("sooner", "x").with_due_date(d(10)),
        ];
        let ranked = rank_tasks(
            &tasks,
            &ParsedQuery::new(""),
            &registry(),
            &ScoringConfig::default(),
            &[SortField::DueDate],
            today(),
        );
        assert!(ranked[0].activation.due_date);
        // "later" and "sooner" share a bucket, so input order holds
        assert_eq!(ids(&ranked), vec!["later", "sooner", "none"]);
    }

    #[test]
    fn test_status_score_uses_derived_category() {
        let tasks = vec![Task {
            status: "/".into(),
            status_category: None,
            ..Task::new("wip", "Refactor parser")
        }];
        let mut query = ParsedQuery::new("in progress");
        query.status = Some("inProgress".into());

        let ranked = rank_tasks(&tasks, &query, &registry(), &ScoringConfig::default(), &[], today());
        assert_eq!(ranked[0].category, StatusCategory::InProgress);
        assert!((ranked[0].status - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_compare_priority_is_strict_weak_order() {
        let values = [Some(1), Some(2), Some(4), None];
        for a in values {
            assert_eq!(compare_priority(a, a), Ordering::Equal);
            for b in values {
                assert_eq!(compare_priority(a, b), compare_priority(b, a).reverse());
                for c in values {
                    if compare_priority(a, b).is_lt() && compare_priority(b, c).is_lt() {
                        assert!(compare_priority(a, c).is_lt());
                    }
                }
            }
        }
        assert_eq!(compare_priority(Some(4), None), Ordering::Less);
    }

    #[test]
    fn test_sort_by_fields() {
        let d = |day| NaiveDate::from_ymd_opt(2025, 3, day).unwrap();
        let tasks = [
            Task::new("a", "x").with_priority(2).with_due_date(d(5)),
            Task::new("b", "x").with_priority(1),
            Task::new("c", "x").with_priority(2).with_due_date(d(1)),
            Task::new("d", "x"),
        ];
        let mut refs: Vec<&Task> = tasks.iter().collect();
        sort_by_fields(&mut refs, &[SortField::Priority, SortField::DueDate], &registry());

        let order: Vec<_> = refs.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a", "d"]);
    }
}
