use crate::error::{AnalyticsError, Result};
use crate::schema::MonthKey;
use chrono::{Datelike, NaiveDate};

pub fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let year_diff = end.year() - start.year();
    let month_diff = end.month() as i32 - start.month() as i32;
    year_diff * 12 + month_diff
}

/// Whole days from `start` to `end`, floored at one so it can be used as a
/// rate denominator.
pub fn elapsed_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days().max(1)
}

/// Rounds halves toward positive infinity (`2.5 -> 3`, `-2.5 -> -2`).
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Parses a period string in the format "YYYY-MM" or "YYYY-MM:YYYY-MM"
/// Returns (start_month, end_month) without checking their order.
pub fn parse_period_string(period: &str) -> Result<(MonthKey, MonthKey)> {
    let parts: Vec<&str> = period.split(':').collect();

    match parts.len() {
        1 => {
            let month = MonthKey::parse(parts[0])?;
            Ok((month, month))
        }
        2 => {
            let start = MonthKey::parse(parts[0])?;
            let end = MonthKey::parse(parts[1])?;
            Ok((start, end))
        }
        _ => Err(AnalyticsError::InvalidMonthKey(format!(
            "{} (expected 'YYYY-MM' or 'YYYY-MM:YYYY-MM')",
            period
        ))),
    }
}
