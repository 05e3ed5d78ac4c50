//! Natural-language date fallback.
//!
//! Free-form calendar dates (`January 15, 2025`, `15 jan 2025`,
//! `1/15/2025`, `2025/04/15`, `2025年4月15日`) go through `dateparser`.
//! Words that only make sense against an injected "today" (`yesterday`,
//! `end of month`, `明天`, `igår`, a month and day without a year) are
//! anchored here before the hand-off.

use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate, Utc};
use regex::Regex;

/// Words mapped to a day offset from today
const RELATIVE_WORDS: &[(&str, i64)] = &[
    ("yesterday", -1),
    ("day before yesterday", -2),
    ("the day before yesterday", -2),
    ("day after tomorrow", 2),
    ("the day after tomorrow", 2),
    ("今天", 0),
    ("明天", 1),
    ("后天", 2),
    ("昨天", -1),
    ("前天", -2),
    ("idag", 0),
    ("i dag", 0),
    ("imorgon", 1),
    ("i morgon", 1),
    ("igår", -1),
    ("i går", -1),
];

// "jan 15th", "on march 3, 2025"
static MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:on\s+)?([a-z]+)\.?\s+(\d{1,2})(?:st|nd|rd|th)?(?:,?\s*(\d{4}))?$")
        .expect("Invalid regex")
});
// "15 march", "the 3rd of dec 2024"
static DAY_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:on\s+)?(?:the\s+)?(\d{1,2})(?:st|nd|rd|th)?\s+(?:of\s+)?([a-z]+)\.?(?:,?\s*(\d{4}))?$")
        .expect("Invalid regex")
});
static HAS_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d{4}").expect("Invalid regex"));
static END_OF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:by\s+)?end\s+of\s+(?:the\s+|this\s+)?(week|month|quarter|year)$")
        .expect("Invalid regex")
});

/// Parse a natural-language expression into a single date.
///
/// `text` is expected lowercased and whitespace-collapsed.
pub fn parse_natural_date(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    if let Some((_, offset)) = RELATIVE_WORDS.iter().find(|(word, _)| *word == text) {
        return today.checked_add_signed(Duration::try_days(*offset)?);
    }

    if let Some(cap) = END_OF.captures(text) {
        return end_of(&cap[1], today);
    }

    // Month-name dates are rewritten to "<month> <day>, <year>" so the year
    // defaults to today's and ordinals are gone
    let canonical = MONTH_DAY
        .captures(text)
        .map(|cap| (cap[1].to_string(), cap[2].to_string(), cap.get(3)))
        .or_else(|| {
            DAY_MONTH
                .captures(text)
                .map(|cap| (cap[2].to_string(), cap[1].to_string(), cap.get(3)))
        })
        .map(|(month, day, year)| {
            let year = year.map_or_else(|| today.year().to_string(), |y| y.as_str().to_string());
            format!("{month} {day}, {year}")
        });

    parse_calendar_date(canonical.as_deref().unwrap_or(text))
}

/// Hand a calendar date to `dateparser`, keeping only plausible years.
///
/// Inputs without a year are rejected so times of day and bare
/// timestamps are never read against the wall clock.
fn parse_calendar_date(text: &str) -> Option<NaiveDate> {
    if !HAS_YEAR.is_match(text) || text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Interpreted in UTC so a date-only input keeps its calendar day
    let date = dateparser::parse_with_timezone(text, &Utc).ok()?.date_naive();
    (1900..=2100).contains(&date.year()).then_some(date)
}

fn end_of(period: &str, today: NaiveDate) -> Option<NaiveDate> {
    match period {
        "week" => {
            let to_sunday = 6 - i64::from(today.weekday().num_days_from_monday());
            today.checked_add_signed(Duration::days(to_sunday))
        }
        "month" => last_day_of_month(today.year(), today.month()),
        "quarter" => {
            let quarter_end_month = ((today.month() - 1) / 3 + 1) * 3;
            last_day_of_month(today.year(), quarter_end_month)
        }
        "year" => NaiveDate::from_ymd_opt(today.year(), 12, 31),
        _ => None,
    }
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}
