//! Date expression resolution.
//!
//! Turns a due-date token (`today`, `overdue`, `2w`, `last 3 days`,
//! `next friday`, `2025-01-15`, ...) into a concrete [`DateFilter`].
//! Grammars are tried in a fixed order and the first match wins; several
//! of them overlap syntactically (`3 days` vs `3 days ago`), so the order
//! is part of the contract.
//!
//! All arithmetic is date-only. Sub-day units are not accepted except for
//! the `+N hours` shorthand, which rounds up to whole days.

mod natural;

use std::sync::LazyLock;

use chrono::{Datelike, Duration, Local, Months, NaiveDate, Weekday};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use natural::parse_natural_date;

/// An inclusive date window; either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Create a range, swapping the bounds if they are reversed.
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        match (start, end) {
            (Some(s), Some(e)) if s > e => Self {
                start: Some(e),
                end: Some(s),
            },
            _ => Self { start, end },
        }
    }

    /// A single-day range.
    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: Some(day),
            end: Some(day),
        }
    }

    /// Whether `date` falls inside the range (bounds inclusive).
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.map_or(true, |s| date >= s) && self.end.map_or(true, |e| date <= e)
    }
}

/// Result of resolving a date expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum DateFilter {
    /// No date constraint
    #[default]
    NoFilter,
    /// The task must have some date, any value
    HasAny,
    /// The date must fall in the range
    Range(DateRange),
}

impl DateFilter {
    /// Whether the expression was recognized at all.
    pub fn is_filter(&self) -> bool {
        !matches!(self, Self::NoFilter)
    }

    /// The concrete range, if any.
    pub fn range(&self) -> Option<&DateRange> {
        match self {
            Self::Range(range) => Some(range),
            _ => None,
        }
    }

    /// Whether a task date satisfies the filter.
    pub fn matches(&self, date: Option<NaiveDate>) -> bool {
        match self {
            Self::NoFilter => true,
            Self::HasAny => date.is_some(),
            Self::Range(range) => date.is_some_and(|d| range.contains(d)),
        }
    }
}

/// Resolver anchored on a fixed "today".
#[derive(Debug, Clone, Copy)]
pub struct DateResolver {
    today: NaiveDate,
}

impl Default for DateResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl DateResolver {
    /// Anchor on the local current date.
    pub fn new() -> Self {
        Self {
            today: Local::now().date_naive(),
        }
    }

    /// Anchor on a specific date.
    pub fn with_today(today: NaiveDate) -> Self {
        Self { today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Resolve a token; unrecognized input yields [`DateFilter::NoFilter`].
    pub fn resolve(&self, token: &str) -> DateFilter {
        resolve_date_expression(token, self.today)
    }
}

/// Resolve a date expression relative to `today`.
pub fn resolve_date_expression(token: &str, today: NaiveDate) -> DateFilter {
    let normalized = token.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    if normalized.is_empty() {
        return DateFilter::NoFilter;
    }

    let resolved = resolve_keyword(&normalized, today)
        .or_else(|| resolve_duration(&normalized, today))
        .or_else(|| resolve_signed(&normalized, today))
        .or_else(|| resolve_phrase(&normalized, today))
        .or_else(|| parse_natural_date(&normalized, today).map(|d| DateFilter::Range(DateRange::single(d))))
        .or_else(|| parse_iso_date(&normalized).map(|d| DateFilter::Range(DateRange::single(d))));

    match resolved {
        Some(filter) => {
            tracing::debug!(token, ?filter, "Resolved date expression");
            filter
        }
        None => {
            tracing::debug!(token, "Unrecognized date expression");
            DateFilter::NoFilter
        }
    }
}

/// Calendar unit used by the duration and phrase grammars
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Day,
    Week,
    Month,
    Year,
}

impl Unit {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "d" | "day" | "days" => Some(Self::Day),
            "w" | "wk" | "wks" | "week" | "weeks" => Some(Self::Week),
            "m" | "mo" | "mos" | "month" | "months" => Some(Self::Month),
            "y" | "yr" | "yrs" | "year" | "years" => Some(Self::Year),
            _ => None,
        }
    }
}

/// Unit alternation shared by the regexes; longer spellings first.
const UNIT: &str = r"days|day|d|weeks|week|wks|wk|w|months|month|mos|mo|m|years|year|yrs|yr|y";

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("Invalid regex")
}

static DURATION_FULL: LazyLock<Regex> =
    LazyLock::new(|| regex(&format!(r"^(?:\d+\s*(?:{UNIT})\s*)+$")));
static DURATION_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| regex(&format!(r"(\d+)\s*({UNIT})")));
static SIGNED_DAYS: LazyLock<Regex> =
    LazyLock::new(|| regex(r"^([+-])\s*(\d+)\s*(days|day|d|weeks|week|w)$"));
static SIGNED_HOURS: LazyLock<Regex> =
    LazyLock::new(|| regex(r"^\+\s*(\d+)\s*(hours|hour|hrs|hr|h)$"));
static AGO: LazyLock<Regex> = LazyLock::new(|| regex(&format!(r"^(\d+)\s*({UNIT})\s+ago$")));
static WITHIN: LazyLock<Regex> = LazyLock::new(|| {
    regex(&format!(r"^(?:within|next|in the next)\s+(\d+)\s*({UNIT})$"))
});
static LAST: LazyLock<Regex> = LazyLock::new(|| {
    regex(&format!(r"^(?:last|past|in the last|in the past)\s+(\d+)\s*({UNIT})$"))
});
static FROM_NOW: LazyLock<Regex> =
    LazyLock::new(|| regex(&format!(r"^(?:(\d+)\s*({UNIT})\s+from now|in\s+(\d+)\s*({UNIT}))$")));
static FIRST_DAY: LazyLock<Regex> =
    LazyLock::new(|| regex(r"^first day(?: of (this|next) (week|month|year))?$"));
static WEEKDAY: LazyLock<Regex> =
    LazyLock::new(|| regex(r"^(?:(?:next|this|on)\s+)?([a-z]+)$"));
static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| regex(r"^\d{4}-\d{2}-\d{2}$"));

/// Shift `date` by `amount` units (negative goes back).
fn shift(date: NaiveDate, amount: i64, unit: Unit) -> Option<NaiveDate> {
    match unit {
        Unit::Day => date.checked_add_signed(Duration::try_days(amount)?),
        Unit::Week => date.checked_add_signed(Duration::try_weeks(amount)?),
        Unit::Month | Unit::Year => {
            let months = if unit == Unit::Year {
                amount.checked_mul(12)?
            } else {
                amount
            };
            let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
            if months >= 0 {
                date.checked_add_months(magnitude)
            } else {
                date.checked_sub_months(magnitude)
            }
        }
    }
}

fn days(date: NaiveDate, amount: i64) -> Option<NaiveDate> {
    shift(date, amount, Unit::Day)
}

/// Step 1: fixed keyword table.
fn resolve_keyword(token: &str, today: NaiveDate) -> Option<DateFilter> {
    let key = token.replace(['_', ' '], "-");
    let range = match key.as_str() {
        "any" => return Some(DateFilter::HasAny),
        "today" => DateRange::single(today),
        "tomorrow" => DateRange::single(days(today, 1)?),
        "overdue" => DateRange::new(None, Some(days(today, -1)?)),
        "future" => DateRange::new(Some(days(today, 1)?), None),
        "week" | "this-week" => DateRange::new(Some(today), Some(days(today, 6)?)),
        "next-week" => DateRange::new(Some(days(today, 7)?), Some(days(today, 13)?)),
        "month" | "this-month" => DateRange::new(Some(today), Some(shift(today, 1, Unit::Month)?)),
        "next-month" => DateRange::new(
            Some(shift(today, 1, Unit::Month)?),
            Some(shift(today, 2, Unit::Month)?),
        ),
        _ => return None,
    };
    Some(DateFilter::Range(range))
}

/// Step 2: `<n><unit>` segments added cumulatively, start is today.
fn resolve_duration(token: &str, today: NaiveDate) -> Option<DateFilter> {
    if !DURATION_FULL.is_match(token) {
        return None;
    }

    let mut end = today;
    for cap in DURATION_SEGMENT.captures_iter(token) {
        let amount: i64 = cap[1].parse().ok()?;
        let unit = Unit::parse(&cap[2])?;
        end = shift(end, amount, unit)?;
    }

    Some(DateFilter::Range(DateRange::new(Some(today), Some(end))))
}

/// Step 3: `+3 days`, `-2w`, `+12 hours`.
fn resolve_signed(token: &str, today: NaiveDate) -> Option<DateFilter> {
    if let Some(cap) = SIGNED_DAYS.captures(token) {
        let amount: i64 = cap[2].parse().ok()?;
        let unit = Unit::parse(&cap[3])?;
        let range = if &cap[1] == "+" {
            DateRange::new(Some(today), Some(shift(today, amount, unit)?))
        } else {
            DateRange::new(Some(shift(today, -amount, unit)?), Some(today))
        };
        return Some(DateFilter::Range(range));
    }

    if let Some(cap) = SIGNED_HOURS.captures(token) {
        let hours: i64 = cap[1].parse().ok()?;
        let whole_days = hours.checked_add(23)? / 24;
        return Some(DateFilter::Range(DateRange::new(
            Some(today),
            Some(days(today, whole_days)?),
        )));
    }

    None
}

/// Step 4: relative phrases, `first day`, weekday names.
fn resolve_phrase(token: &str, today: NaiveDate) -> Option<DateFilter> {
    if let Some(cap) = AGO.captures(token) {
        let day = shift(today, -cap[1].parse::<i64>().ok()?, Unit::parse(&cap[2])?)?;
        return Some(DateFilter::Range(DateRange::single(day)));
    }

    if let Some(cap) = WITHIN.captures(token) {
        let end = shift(today, cap[1].parse().ok()?, Unit::parse(&cap[2])?)?;
        return Some(DateFilter::Range(DateRange::new(Some(today), Some(end))));
    }

    if let Some(cap) = LAST.captures(token) {
        let start = shift(today, -cap[1].parse::<i64>().ok()?, Unit::parse(&cap[2])?)?;
        return Some(DateFilter::Range(DateRange::new(Some(start), Some(today))));
    }

    if let Some(cap) = FROM_NOW.captures(token) {
        let (amount, unit) = match (cap.get(1), cap.get(2)) {
            (Some(n), Some(u)) => (n.as_str(), u.as_str()),
            _ => (cap.get(3)?.as_str(), cap.get(4)?.as_str()),
        };
        let day = shift(today, amount.parse().ok()?, Unit::parse(unit)?)?;
        return Some(DateFilter::Range(DateRange::single(day)));
    }

    if let Some(cap) = FIRST_DAY.captures(token) {
        let day = match (cap.get(1).map(|m| m.as_str()), cap.get(2).map(|m| m.as_str())) {
            (Some(which), Some("week")) => {
                let monday = days(today, -i64::from(today.weekday().num_days_from_monday()))?;
                if which == "next" { days(monday, 7)? } else { monday }
            }
            (Some(which), Some("year")) => {
                let year = if which == "next" { today.year() + 1 } else { today.year() };
                NaiveDate::from_ymd_opt(year, 1, 1)?
            }
            (Some("next"), Some(_)) => shift(today.with_day(1)?, 1, Unit::Month)?,
            _ => today.with_day(1)?,
        };
        return Some(DateFilter::Range(DateRange::single(day)));
    }

    if let Some(cap) = WEEKDAY.captures(token) {
        if let Some(weekday) = parse_weekday(&cap[1]) {
            return Some(DateFilter::Range(DateRange::single(next_weekday(today, weekday))));
        }
    }

    None
}

/// Parse an English weekday name or abbreviation.
pub(crate) fn parse_weekday(name: &str) -> Option<Weekday> {
    match name {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thur" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Next occurrence of `weekday` strictly after `today`.
fn next_weekday(today: NaiveDate, weekday: Weekday) -> NaiveDate {
    let current = i64::from(today.weekday().num_days_from_monday());
    let target = i64::from(weekday.num_days_from_monday());
    let mut ahead = (target - current).rem_euclid(7);
    if ahead == 0 {
        ahead = 7;
    }
    today + Duration::days(ahead)
}

/// Step 6: strict `YYYY-MM-DD`.
fn parse_iso_date(token: &str) -> Option<NaiveDate> {
    if !ISO_DATE.is_match(token) {
        return None;
    }
    NaiveDate::parse_from_str(token, "%Y-%m-%d").ok()
}
