//! Date-time literals and partial-match decomposition.
//!
//! A partial comparison against a date-time field (`created=2019%`) is not a
//! substring match on some rendering of the timestamp. The literal is split on
//! its date and time separators and each piece is compared to a calendar
//! component instead.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::ast::ComparisonKind;
use crate::error::ParseError;

const DATE_TIME_DIVIDERS: [char; 2] = ['t', ' '];
const DATE_DIVIDERS: [char; 2] = ['-', '/'];
const TIME_DIVIDERS: [char; 3] = [':', '.', 'z'];

const NAIVE_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S%.f",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Parses a date-time literal or a serialized item value.
///
/// Offsets are normalized to UTC. Bare dates resolve to midnight.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    let unzoned = raw.strip_suffix(['Z', 'z']).unwrap_or(raw);
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(unzoned, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(unzoned, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// ISO-8601 rendering with seven fractional digits: `2019-01-01T00:00:00.0000000`.
pub fn format_iso(dt: &NaiveDateTime) -> String {
    format!(
        "{}.{:07}",
        dt.format("%Y-%m-%dT%H:%M:%S"),
        dt.nanosecond() % 1_000_000_000 / 100
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePart {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

impl DatePart {
    const ASCENDING: [DatePart; 7] = [
        DatePart::Year,
        DatePart::Month,
        DatePart::Day,
        DatePart::Hour,
        DatePart::Minute,
        DatePart::Second,
        DatePart::Millisecond,
    ];

    pub fn extract(&self, dt: &NaiveDateTime) -> i64 {
        match self {
            DatePart::Year => i64::from(dt.year()),
            DatePart::Month => i64::from(dt.month()),
            DatePart::Day => i64::from(dt.day()),
            DatePart::Hour => i64::from(dt.hour()),
            DatePart::Minute => i64::from(dt.minute()),
            DatePart::Second => i64::from(dt.second()),
            DatePart::Millisecond => i64::from(dt.nanosecond() % 1_000_000_000 / 1_000_000),
        }
    }
}

/// Boolean combination of component comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatePattern {
    Part(DatePart, i64),
    All(Vec<DatePattern>),
    Any(Vec<DatePattern>),
}

impl DatePattern {
    pub fn matches(&self, dt: &NaiveDateTime) -> bool {
        match self {
            DatePattern::Part(part, expected) => part.extract(dt) == *expected,
            DatePattern::All(patterns) => patterns.iter().all(|p| p.matches(dt)),
            DatePattern::Any(patterns) => patterns.iter().any(|p| p.matches(dt)),
        }
    }

    /// Decomposes the stripped value of a partial comparison.
    pub fn decompose(value: &str, kind: ComparisonKind) -> Result<Self, ParseError> {
        let lowered = value.trim().to_lowercase();
        match kind {
            ComparisonKind::Contains => contains_pattern(&lowered, value),
            ComparisonKind::StartsWith => ordered_pattern(&lowered, value, false),
            ComparisonKind::EndsWith => ordered_pattern(&lowered, value, true),
            ComparisonKind::Full => Err(ParseError::InvalidDateTimeFormat(value.to_string())),
        }
    }
}

fn split_on<'a>(value: &'a str, dividers: &[char]) -> Vec<&'a str> {
    value
        .split(|c: char| dividers.contains(&c))
        .filter(|part| !part.is_empty())
        .collect()
}

fn component(raw: &str, original: &str) -> Result<i64, ParseError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ParseError::InvalidDateTimeFormat(original.to_string()))
}

/// Milliseconds are written as a fraction of a second, so `.5` is 500.
fn part_value(part: DatePart, raw: &str, original: &str) -> Result<i64, ParseError> {
    if part != DatePart::Millisecond {
        return component(raw, original);
    }
    let digits: String = format!("{:0<3}", raw.trim()).chars().take(3).collect();
    component(&digits, original)
}

fn all_of(parts: &[DatePart], values: &[&str], original: &str) -> Result<DatePattern, ParseError> {
    let patterns = parts
        .iter()
        .zip(values)
        .map(|(part, raw)| Ok(DatePattern::Part(*part, part_value(*part, raw, original)?)))
        .collect::<Result<Vec<_>, ParseError>>()?;
    Ok(DatePattern::All(patterns))
}

fn any_of(parts: &[DatePart], raw: &str, original: &str) -> Result<DatePattern, ParseError> {
    let patterns = parts
        .iter()
        .map(|part| Ok(DatePattern::Part(*part, part_value(*part, raw, original)?)))
        .collect::<Result<Vec<_>, ParseError>>()?;
    Ok(DatePattern::Any(patterns))
}

/// Components in calendar order for StartsWith, reversed for EndsWith.
fn ordered_pattern(lowered: &str, original: &str, reversed: bool) -> Result<DatePattern, ParseError> {
    let mut dividers = Vec::with_capacity(7);
    dividers.extend(DATE_TIME_DIVIDERS);
    dividers.extend(DATE_DIVIDERS);
    dividers.extend(TIME_DIVIDERS);

    let mut values = split_on(lowered, &dividers);
    if values.is_empty() || values.len() > DatePart::ASCENDING.len() {
        return Err(ParseError::InvalidDateTimeFormat(original.to_string()));
    }

    let mut parts = DatePart::ASCENDING.to_vec();
    if reversed {
        parts.reverse();
        values.reverse();
    }
    all_of(&parts, &values, original)
}

fn contains_pattern(lowered: &str, original: &str) -> Result<DatePattern, ParseError> {
    let halves = split_on(lowered, &DATE_TIME_DIVIDERS);
    let (date, time) = if halves.len() == 2 {
        (Some(halves[0]), Some(halves[1]))
    } else if lowered.contains(DATE_DIVIDERS) {
        (Some(lowered), None)
    } else if lowered.contains(TIME_DIVIDERS) {
        (None, Some(lowered))
    } else {
        return any_of(&[DatePart::Year, DatePart::Month, DatePart::Day], lowered, original);
    };

    let mut patterns = Vec::new();
    if let Some(date) = date {
        patterns.push(date_pattern(date, original)?);
    }
    if let Some(time) = time {
        patterns.push(time_pattern(time, original)?);
    }
    Ok(if patterns.len() == 1 {
        patterns.remove(0)
    } else {
        DatePattern::All(patterns)
    })
}

fn date_pattern(date: &str, original: &str) -> Result<DatePattern, ParseError> {
    use DatePart::*;
    let parts = split_on(date, &DATE_DIVIDERS);
    match parts.len() {
        1 => any_of(&[Year, Month, Day], parts[0], original),
        2 => Ok(DatePattern::Any(vec![
            all_of(&[Year, Month], &parts, original)?,
            all_of(&[Month, Day], &parts, original)?,
        ])),
        3 => all_of(&[Year, Month, Day], &parts, original),
        _ => Err(ParseError::InvalidDateTimeFormat(original.to_string())),
    }
}

fn time_pattern(time: &str, original: &str) -> Result<DatePattern, ParseError> {
    use DatePart::*;
    let has_fraction = time.contains('.');
    let parts = split_on(time, &TIME_DIVIDERS);
    match parts.len() {
        1 => any_of(&[Hour, Minute, Second, Millisecond], parts[0], original),
        2 => {
            let mut options = vec![
                all_of(&[Hour, Minute], &parts, original)?,
                all_of(&[Minute, Second], &parts, original)?,
            ];
            if has_fraction {
                options.push(all_of(&[Second, Millisecond], &parts, original)?);
            }
            Ok(DatePattern::Any(options))
        }
        3 if has_fraction => Ok(DatePattern::Any(vec![
            all_of(&[Hour, Minute, Second], &parts, original)?,
            all_of(&[Minute, Second, Millisecond], &parts, original)?,
        ])),
        3 => all_of(&[Hour, Minute, Second], &parts, original),
        4 => all_of(&[Hour, Minute, Second, Millisecond], &parts, original),
        _ => Err(ParseError::InvalidDateTimeFormat(original.to_string())),
    }
}
