//! Fail-soft coercion of raw cell text into numbers, dates and month keys.
//!
//! Nothing in here returns an error: bad numbers become `0.0`, bad dates
//! become `None`. Callers decide what an invalid date means for them.

use crate::record::Record;
use crate::schema::MonthKey;
use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d %b %Y",
    "%d-%b-%Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%b %d %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
];

/// Strips thousands separators and parses as `f64`. Absent, empty,
/// non-numeric and non-finite inputs all yield `0.0`.
pub fn normalize_numeric(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return 0.0;
    };
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return 0.0;
    }
    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => value,
        _ => 0.0,
    }
}

/// Parses the date formats the spreadsheet is known to emit. Returns `None`
/// for anything unrecognised. A bare `YYYY-MM` reads as the first of the month.
pub fn normalize_date(raw: Option<&str>) -> Option<NaiveDate> {
    let text = raw?.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }

    MonthKey::parse(text).ok().map(|m| m.first_day())
}

/// `None` in, `None` out; otherwise the date's calendar month.
pub fn month_key_of(date: Option<NaiveDate>) -> Option<MonthKey> {
    date.map(MonthKey::from_date)
}

pub fn numeric_field(record: &Record, field: &str) -> f64 {
    normalize_numeric(record.get(field))
}

pub fn date_field(record: &Record, field: &str) -> Option<NaiveDate> {
    normalize_date(record.get(field))
}

pub fn month_field(record: &Record, field: &str) -> Option<MonthKey> {
    month_key_of(date_field(record, field))
}
