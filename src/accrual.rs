//! Linear licence-allocation line.
//!
//! Spreads the total ordered quantity of the active contracts evenly over
//! the whole months they span. This is a display approximation rather than
//! a ledger: the increment is rounded once and then repeated, so the last
//! point can miss the ordered total by up to half a unit per month when the
//! total does not divide evenly.

use crate::normalize::numeric_field;
use crate::record::Record;
use crate::schema::{MonthKey, MonthRange, Series};
use crate::utils::round_half_up;
use crate::window::window_of;
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};

/// Category name of the accrual line when it is rendered as a series.
pub const ORDERED_CATEGORY: &str = "LicenseOrdered";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccrualProjection {
    /// Whole months from the earliest start to the latest end.
    pub window: MonthRange,
    pub total_ordered: f64,
    pub per_month_increment: f64,
}

impl AccrualProjection {
    pub fn month_count(&self) -> usize {
        self.window.len()
    }

    /// Accrued quantity after the `index`-th month of the window (0-based).
    pub fn cumulative_at_index(&self, index: usize) -> f64 {
        (index as f64 + 1.0) * self.per_month_increment
    }

    /// Accrued quantity at `month`: zero before the window, the final value
    /// after it.
    pub fn cumulative_at(&self, month: MonthKey) -> f64 {
        if month < self.window.start() {
            0.0
        } else if month > self.window.end() {
            self.final_value()
        } else {
            let index = self.window.start().months_until(month) as usize;
            self.cumulative_at_index(index)
        }
    }

    pub fn final_value(&self) -> f64 {
        self.cumulative_at_index(self.month_count() - 1)
    }

    /// The accrual line as a single-category series over its own window.
    pub fn to_series(&self) -> Series {
        let mut series = Series::zeroed(vec![ORDERED_CATEGORY.to_string()], &self.window);
        for index in 0..series.len() {
            series.add(index, ORDERED_CATEGORY, self.cumulative_at_index(index));
        }
        series
    }
}

/// Builds the accrual line for a set of contract rows, normally the active
/// contracts of one client and product. Rows whose window does not parse,
/// or ends before it starts, are ignored. Returns `None` when nothing is
/// left.
pub fn project_accrual<'a>(
    contracts: impl IntoIterator<Item = &'a Record>,
    ordered_field: &str,
) -> Option<AccrualProjection> {
    let mut min_start: Option<NaiveDate> = None;
    let mut max_end: Option<NaiveDate> = None;
    let mut total_ordered = 0.0;
    let mut used = 0usize;

    for record in contracts {
        let Some((start, end)) = window_of(record) else {
            continue;
        };
        if end < start {
            continue;
        }
        min_start = Some(min_start.map_or(start, |s| s.min(start)));
        max_end = Some(max_end.map_or(end, |e| e.max(end)));
        total_ordered += numeric_field(record, ordered_field);
        used += 1;
    }

    let window = MonthRange::covering(min_start?, max_end?).ok()?;
    let per_month_increment = round_half_up(total_ordered / window.len() as f64);

    debug!(
        "Accrual over {} contracts: {} ordered across {} months ({}/month)",
        used,
        total_ordered,
        window.len(),
        per_month_increment
    );

    Some(AccrualProjection {
        window,
        total_ordered,
        per_month_increment,
    })
}
