use crate::error::{AnalyticsError, Result};
use crate::normalize::{date_field, numeric_field};
use crate::record::{fields, Record};
use crate::schema::MonthKey;
use crate::utils::elapsed_days;
use chrono::{Duration, NaiveDate};
use log::debug;

/// First day of the trailing window: the start of the month
/// `window_months` before the reference month.
pub fn window_start(reference: NaiveDate, window_months: i32) -> Result<NaiveDate> {
    if window_months < 0 {
        return Err(AnalyticsError::NegativeWindow(window_months));
    }
    Ok(MonthKey::from_date(reference)
        .try_add_months(-window_months)?
        .first_day())
}

/// Average daily amount of `measure_field` over the trailing window ending
/// at `reference`. Rows are placed by the date in `date_field_name`; rows
/// without a parseable date are left out.
pub fn trailing_daily_rate<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    date_field_name: &str,
    measure_field: &str,
    reference: NaiveDate,
    window_months: i32,
) -> Result<f64> {
    let start = window_start(reference, window_months)?;

    let mut rows = 0usize;
    let total: f64 = records
        .into_iter()
        .filter(|record| {
            date_field(record, date_field_name)
                .map_or(false, |date| start <= date && date <= reference)
        })
        .inspect(|_| rows += 1)
        .map(|record| numeric_field(record, measure_field))
        .sum();

    let days = elapsed_days(start, reference);
    debug!(
        "Run-rate from {} to {}: {} over {} days from {} rows",
        start, reference, total, days, rows
    );

    Ok(total / days as f64)
}

/// Daily consumption of `product` by `client` over the last `window_months`
/// months (plus the current one) up to `reference`.
pub fn daily_rate(
    consumption: &[Record],
    client: &str,
    product: &str,
    reference: NaiveDate,
    window_months: i32,
) -> Result<f64> {
    let scoped = consumption.iter().filter(|r| {
        r.get(fields::CLIENT_NAME) == Some(client) && r.get(fields::PRODUCT) == Some(product)
    });
    trailing_daily_rate(scoped, fields::MONTH, fields::VOLUME, reference, window_months)
}

/// Date on which `remaining` runs out at `rate` per day, counting from
/// `reference`. `None` when the rate is not positive, since no projection
/// can be made.
pub fn project_exhaustion_date(remaining: f64, rate: f64, reference: NaiveDate) -> Option<NaiveDate> {
    if rate.is_nan() || rate <= 0.0 || !rate.is_finite() || !remaining.is_finite() {
        return None;
    }
    let days = (remaining / rate).ceil() as i64;
    reference.checked_add_signed(Duration::try_days(days)?)
}
