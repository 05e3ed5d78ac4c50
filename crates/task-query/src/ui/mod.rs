//! Terminal UI helpers for query results.
//!
//! This module uses println! for CLI output, which is appropriate
//! for terminal user interfaces.

#![allow(clippy::disallowed_macros)]

use colored::Colorize;
use comfy_table::{Cell, Color, ContentArrangement, Table};

use crate::dates::DateFilter;
use crate::entities::{ParsedQuery, StatusCategory};
use crate::ranking::ScoreBreakdown;

fn status_color(category: StatusCategory) -> Color {
    match category {
        StatusCategory::Open => Color::Yellow,
        StatusCategory::InProgress => Color::Cyan,
        StatusCategory::Completed => Color::Green,
        StatusCategory::Cancelled => Color::Red,
        StatusCategory::Other => Color::Magenta,
    }
}

fn priority_color(priority: Option<u8>) -> Color {
    match priority {
        Some(1) => Color::Red,
        Some(2) => Color::Yellow,
        Some(3) => Color::White,
        _ => Color::DarkGrey,
    }
}

/// Create a table of ranked tasks
pub fn ranked_table(ranked: &[ScoreBreakdown<'_>]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("#").fg(Color::Cyan),
        Cell::new("Score").fg(Color::Cyan),
        Cell::new("Task").fg(Color::Cyan),
        Cell::new("Status").fg(Color::Cyan),
        Cell::new("Priority").fg(Color::Cyan),
        Cell::new("Due").fg(Color::Cyan),
        Cell::new("Tags").fg(Color::Cyan),
    ]);

    for (rank, entry) in ranked.iter().enumerate() {
        let task = entry.task;
        let priority = task.priority.map_or_else(|| "-".to_string(), |p| format!("p{p}"));
        let due = task
            .due_date
            .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string());
        let tags = if task.tags.is_empty() {
            "-".to_string()
        } else {
            task.tags.iter().map(|t| format!("#{t}")).collect::<Vec<_>>().join(" ")
        };

        table.add_row(vec![
            Cell::new(rank + 1).fg(Color::DarkGrey),
            Cell::new(format!("{:.2}", entry.score)),
            Cell::new(&task.text),
            Cell::new(entry.category.to_string()).fg(status_color(entry.category)),
            Cell::new(priority).fg(priority_color(task.priority)),
            Cell::new(due),
            Cell::new(tags),
        ]);
    }

    table
}

/// Describe a date filter in one line
pub fn describe_date_filter(filter: &DateFilter) -> String {
    let day = |d: Option<chrono::NaiveDate>| d.map_or_else(|| "…".to_string(), |d| d.to_string());
    match filter {
        DateFilter::NoFilter => "no filter".to_string(),
        DateFilter::HasAny => "any date".to_string(),
        DateFilter::Range(range) if range.start.is_some() && range.start == range.end => {
            day(range.start)
        }
        DateFilter::Range(range) => format!("{} → {}", day(range.start), day(range.end)),
    }
}

/// Display a parsed query in a formatted way
pub fn display_parsed_query(query: &ParsedQuery, due: &DateFilter) {
    let none = || "-".dimmed().to_string();

    println!("{}", "═".repeat(60).dimmed());
    println!(
        "{} {}",
        "Query".cyan().bold(),
        format!("[{}]", query.source).yellow()
    );
    println!("{}", "═".repeat(60).dimmed());
    println!("{:>14} {}", "Text:".bold(), query.original);
    println!(
        "{:>14} {}",
        "Core:".bold(),
        if query.core_keywords.is_empty() { none() } else { query.core_keywords.join(", ") }
    );
    println!(
        "{:>14} {}",
        "Keywords:".bold(),
        if query.keywords.is_empty() { none() } else { query.keywords.join(", ") }
    );
    println!(
        "{:>14} {}",
        "Priority:".bold(),
        query.priority.map_or_else(none, |p| format!("p{p}"))
    );
    println!(
        "{:>14} {}",
        "Due:".bold(),
        query
            .due_date
            .as_ref()
            .map_or_else(none, |d| format!("{d} ({})", describe_date_filter(due)))
    );
    println!(
        "{:>14} {}",
        "Status:".bold(),
        query.status.clone().unwrap_or_else(none)
    );
    if let Some(folder) = &query.folder {
        println!("{:>14} {}", "Folder:".bold(), folder);
    }
    if !query.tags.is_empty() {
        let tags: Vec<_> = query.tags.iter().map(|t| format!("#{t}")).collect();
        println!("{:>14} {}", "Tags:".bold(), tags.join(" "));
    }
    if query.expansion.enabled {
        println!(
            "{:>14} {:.1} of {} per keyword ({} languages)",
            "Expansion:".bold(),
            query.expansion.achieved_ratio,
            query.expansion.expected_per_keyword,
            query.expansion.language_count
        );
    }
}

/// Print success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Print warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}
