//! Free-text date parsing
//!
//! Dates in the legacy exports and in hand-typed notes come in several
//! shapes. Strategies are tried in a fixed order and the first one that
//! yields a valid calendar date wins:
//!
//! 1. ISO 8601 date or date-time (`Z` accepted as `+00:00`)
//! 2. `D/M/Y`, day first
//! 3. `<day> <French month> [<year>]`, e.g. `15 janvier 2024`
//! 4. `<English month> <day>[, <year>]`, e.g. `January 15, 2024`
//!
//! An impossible date (day 31 of a 30-day month) only fails the strategy
//! that produced it.

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

const FRENCH_MONTHS: [(&str, u32); 15] = [
    ("janvier", 1),
    ("février", 2),
    ("fevrier", 2),
    ("mars", 3),
    ("avril", 4),
    ("mai", 5),
    ("juin", 6),
    ("juillet", 7),
    ("août", 8),
    ("aout", 8),
    ("septembre", 9),
    ("octobre", 10),
    ("novembre", 11),
    ("décembre", 12),
    ("decembre", 12),
];

const ENGLISH_MONTHS: [(&str, u32); 12] = [
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
];

const MIN_YEAR: i32 = 1;
const MAX_YEAR: i32 = 9999;

/// Date-times with an explicit UTC offset
const ISO_OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M%:z",
];

/// Date-times without offset
const ISO_NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// ISO input always starts with a zero-padded `YYYY-MM-DD`
static ISO_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}").expect("ISO prefix pattern is valid"));

struct MonthPattern {
    regex: Regex,
    month: u32,
}

static FRENCH_PATTERNS: Lazy<Vec<MonthPattern>> = Lazy::new(|| {
    month_patterns(&FRENCH_MONTHS, |name| {
        format!(r"(?i)(?P<day>[0-9]{{1,2}})\s+{name}(?:\s+(?P<year>[0-9]{{4}}))?")
    })
});

static ENGLISH_PATTERNS: Lazy<Vec<MonthPattern>> = Lazy::new(|| {
    month_patterns(&ENGLISH_MONTHS, |name| {
        format!(r"(?i){name}\s+(?P<day>[0-9]{{1,2}})(?:,?\s+(?P<year>[0-9]{{4}}))?")
    })
});

fn month_patterns(lexicon: &[(&str, u32)], pattern: impl Fn(&str) -> String) -> Vec<MonthPattern> {
    lexicon
        .iter()
        .map(|(name, month)| MonthPattern {
            regex: Regex::new(&pattern(&regex::escape(name))).expect("month pattern is valid"),
            month: *month,
        })
        .collect()
}

/// Parse a free-text date into `YYYY-MM-DD`
///
/// `default_year` fills in dates written without a year; when `None`, the
/// current calendar year is used. Returns `None` for missing, blank or
/// unrecognized input.
pub fn parse_flexible_date(date_str: Option<&str>, default_year: Option<i32>) -> Option<String> {
    parse_flexible_naive_date(date_str, default_year)
        .map(|date| date.format("%Y-%m-%d").to_string())
}

/// Same as [`parse_flexible_date`], returning the date itself
pub fn parse_flexible_naive_date(
    date_str: Option<&str>,
    default_year: Option<i32>,
) -> Option<NaiveDate> {
    let raw = date_str?.trim();
    if raw.is_empty() {
        return None;
    }
    let default_year = default_year.unwrap_or_else(|| Local::now().year());

    parse_iso(raw)
        .or_else(|| parse_day_first_slashes(raw))
        .or_else(|| parse_month_name(raw, &FRENCH_PATTERNS, default_year))
        .or_else(|| parse_month_name(raw, &ENGLISH_PATTERNS, default_year))
}

/// Calendar date as written; offsets are not applied
fn parse_iso(raw: &str) -> Option<NaiveDate> {
    if !ISO_PREFIX.is_match(raw) {
        return None;
    }
    let normalized = raw.replace('Z', "+00:00");

    if let Ok(date) = NaiveDate::parse_from_str(&normalized, "%Y-%m-%d") {
        return within_calendar_years(date);
    }

    ISO_OFFSET_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(&normalized, format).ok())
        .map(|dt| dt.date_naive())
        .or_else(|| {
            ISO_NAIVE_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(&normalized, format).ok())
                .map(|dt| dt.date())
        })
        .and_then(within_calendar_years)
}

fn parse_day_first_slashes(raw: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = raw.split('/').collect();
    let [day, month, year] = parts.as_slice() else {
        return None;
    };

    let day: u32 = day.trim().parse().ok()?;
    let month: u32 = month.trim().parse().ok()?;
    let year: i32 = year.trim().parse().ok()?;
    calendar_date(year, month, day)
}

/// Every occurrence of every month name, in lexicon order
fn parse_month_name(raw: &str, patterns: &[MonthPattern], default_year: i32) -> Option<NaiveDate> {
    for pattern in patterns {
        for caps in pattern.regex.captures_iter(raw) {
            let Some(day) = caps.name("day").and_then(|m| m.as_str().parse::<u32>().ok()) else {
                continue;
            };
            let year = match caps.name("year") {
                Some(m) => match m.as_str().parse::<i32>() {
                    Ok(year) => year,
                    Err(_) => continue,
                },
                None => default_year,
            };
            if let Some(date) = calendar_date(year, pattern.month, day) {
                return Some(date);
            }
        }
    }
    None
}

/// Valid date with a year in `1..=9999`, so `%Y` always renders four digits
fn calendar_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).and_then(within_calendar_years)
}

fn within_calendar_years(date: NaiveDate) -> Option<NaiveDate> {
    (MIN_YEAR..=MAX_YEAR).contains(&date.year()).then_some(date)
}
