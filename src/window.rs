use crate::normalize::date_field;
use crate::record::{fields, Record};
use chrono::NaiveDate;
use log::debug;

/// The in-force period of a contract-like record, if both ends parse.
pub fn window_of(record: &Record) -> Option<(NaiveDate, NaiveDate)> {
    let start = date_field(record, fields::START_DATE)?;
    let end = date_field(record, fields::END_DATE)?;
    Some((start, end))
}

/// True when StartDate and EndDate both parse and `reference` lies within
/// them, inclusive on both ends.
pub fn is_active(record: &Record, reference: NaiveDate) -> bool {
    match window_of(record) {
        Some((start, end)) => start <= reference && reference <= end,
        None => false,
    }
}

/// Placeholder rows for deals that are not signed yet. Not every view
/// excludes these, so it is kept apart from the window check.
pub fn is_unsigned_prospect(record: &Record, prospect_description: &str) -> bool {
    record.get(fields::DESCRIPTION) == Some(prospect_description)
}

/// Status-only notion of "active", independent of any dates.
pub fn has_status(record: &Record, status: &str) -> bool {
    record.get(fields::STATUS) == Some(status)
}

/// Records active at `reference` that also satisfy `extra`, when given.
pub fn filter_active<'a>(
    records: &'a [Record],
    reference: NaiveDate,
    extra: Option<&dyn Fn(&Record) -> bool>,
) -> Vec<&'a Record> {
    filter_active_refs(records.iter(), reference, extra)
}

/// Same as [`filter_active`] over an already-selected set of rows.
pub fn filter_active_refs<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    reference: NaiveDate,
    extra: Option<&dyn Fn(&Record) -> bool>,
) -> Vec<&'a Record> {
    let mut invalid_windows = 0usize;
    let active: Vec<&Record> = records
        .into_iter()
        .filter(|record| {
            if window_of(record).is_none() {
                invalid_windows += 1;
                return false;
            }
            is_active(record, reference) && extra.map_or(true, |predicate| predicate(record))
        })
        .collect();

    if invalid_windows > 0 {
        debug!(
            "{} records skipped for {} because their start/end dates did not parse",
            invalid_windows, reference
        );
    }

    active
}
