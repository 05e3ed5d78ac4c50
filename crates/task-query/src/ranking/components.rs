//! Individual scoring components. All pure.

use chrono::NaiveDate;

use crate::entities::{DueDateScores, ParsedQuery, PriorityScores, StatusCategory, StatusScores};

/// Keyword relevance of a task's lowercased text.
///
/// `core_matches / n_core * core_weight + all_matches / n_core`, where
/// `n_core` is the number of core keywords. Zero without core keywords.
#[allow(clippy::cast_precision_loss)]
pub fn relevance_score(search_text: &str, query: &ParsedQuery, core_weight: f64) -> f64 {
    let n_core = query.core_keywords.len();
    if n_core == 0 {
        return 0.0;
    }

    let hits = |keywords: &[String]| {
        keywords
            .iter()
            .filter(|k| search_text.contains(k.to_lowercase().as_str()))
            .count() as f64
    };

    let n_core = n_core as f64;
    hits(&query.core_keywords) / n_core * core_weight + hits(&query.keywords) / n_core
}

/// Urgency of a due date relative to `today`.
pub fn due_date_score(due: Option<NaiveDate>, today: NaiveDate, scores: &DueDateScores) -> f64 {
    let Some(due) = due else {
        return scores.none;
    };

    match (due - today).num_days() {
        days if days < 0 => scores.overdue,
        0..=7 => scores.within_7_days,
        8..=30 => scores.within_1_month,
        _ => scores.later,
    }
}

pub fn priority_score(priority: Option<u8>, scores: &PriorityScores) -> f64 {
    match priority {
        Some(1) => scores.p1,
        Some(2) => scores.p2,
        Some(3) => scores.p3,
        Some(4) => scores.p4,
        _ => scores.none,
    }
}

pub fn status_score(category: StatusCategory, scores: &StatusScores) -> f64 {
    match category {
        StatusCategory::Open => scores.open,
        StatusCategory::InProgress => scores.in_progress,
        StatusCategory::Completed => scores.completed,
        StatusCategory::Cancelled => scores.cancelled,
        StatusCategory::Other => scores.other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn query(core: &[&str], keywords: &[&str]) -> ParsedQuery {
        let mut query = ParsedQuery::new("test");
        query.core_keywords = core.iter().map(ToString::to_string).collect();
        query.keywords = keywords.iter().map(ToString::to_string).collect();
        query
    }

    #[test]
    fn test_relevance() {
        let q = query(&["billing", "export"], &["billing", "export", "invoice", "账单"]);

        // 2 core hits, 3 total hits
        let score = relevance_score("fix billing export for invoice", &q, 0.2);
        assert!((score - (2.0 / 2.0 * 0.2 + 3.0 / 2.0)).abs() < 1e-9);

        assert!(relevance_score("unrelated", &q, 0.2).abs() < f64::EPSILON);
        assert!(relevance_score("anything", &query(&[], &["x"]), 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn test_due_date_buckets() {
        let scores = DueDateScores::default();
        let today = date(2025, 1, 1);

        assert!((due_date_score(Some(date(2024, 12, 31)), today, &scores) - 1.5).abs() < 1e-9);
        assert!((due_date_score(Some(today), today, &scores) - 1.0).abs() < 1e-9);
        assert!((due_date_score(Some(date(2025, 1, 8)), today, &scores) - 1.0).abs() < 1e-9);
        assert!((due_date_score(Some(date(2025, 1, 9)), today, &scores) - 0.5).abs() < 1e-9);
        assert!((due_date_score(Some(date(2025, 1, 31)), today, &scores) - 0.5).abs() < 1e-9);
        assert!((due_date_score(Some(date(2025, 3, 1)), today, &scores) - 0.2).abs() < 1e-9);
        assert!((due_date_score(None, today, &scores) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_priority_and_status_buckets() {
        let priority = PriorityScores::default();
        assert!(priority_score(Some(1), &priority) > priority_score(Some(2), &priority));
        assert!(priority_score(Some(4), &priority) > priority_score(None, &priority));
        assert!((priority_score(Some(7), &priority) - priority.none).abs() < f64::EPSILON);

        let status = StatusScores::default();
        assert!(status_score(StatusCategory::Open, &status) > status_score(StatusCategory::InProgress, &status));
        assert!(status_score(StatusCategory::Other, &status) > status_score(StatusCategory::Completed, &status));
        assert!(status_score(StatusCategory::Completed, &status) > status_score(StatusCategory::Cancelled, &status));
    }
}
