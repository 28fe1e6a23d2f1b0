use crate::correlate::unique_values;
use crate::normalize::{month_field, numeric_field};
use crate::record::Record;
use crate::schema::{MonthKey, MonthRange, Series, UNSPECIFIED_CATEGORY};
use log::debug;
use std::collections::BTreeMap;

/// Which columns drive a month bucketing: the date the row belongs to, the
/// column it is grouped by and the amount that gets summed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucketizer<'f> {
    month_field: &'f str,
    category_field: &'f str,
    measure_field: &'f str,
}

impl<'f> Bucketizer<'f> {
    pub fn new(month_field: &'f str, category_field: &'f str, measure_field: &'f str) -> Self {
        Self {
            month_field,
            category_field,
            measure_field,
        }
    }

    /// Sums the measure into one bucket per month of `range`. Categories come
    /// from every supplied record, so a category with no rows inside the
    /// range still shows up as zeros.
    pub fn bucket<'a>(
        &self,
        records: impl IntoIterator<Item = &'a Record>,
        range: &MonthRange,
    ) -> Series {
        let records: Vec<&Record> = records.into_iter().collect();
        let categories = self.series_categories(&records);
        let mut series = Series::zeroed(categories, range);

        let start = range.start();
        let mut outside = 0usize;
        for record in &records {
            let Some(month) = month_field(record, self.month_field) else {
                outside += 1;
                continue;
            };
            if !range.contains(month) {
                outside += 1;
                continue;
            }
            let index = start.months_until(month) as usize;
            let category = self.category_of(record);
            series.add(index, category, numeric_field(record, self.measure_field));
        }

        debug!(
            "Bucketed {} of {} rows by {} over {} months ({} categories)",
            records.len() - outside,
            records.len(),
            self.category_field,
            range.len(),
            series.categories.len()
        );

        series
    }

    /// All-time sum of the measure per category, ignoring dates.
    pub fn totals<'a>(&self, records: impl IntoIterator<Item = &'a Record>) -> BTreeMap<String, f64> {
        let mut totals = BTreeMap::new();
        for record in records {
            *totals.entry(self.category_of(record).to_string()).or_insert(0.0) +=
                numeric_field(record, self.measure_field);
        }
        totals
    }

    fn category_of<'r>(&self, record: &'r Record) -> &'r str {
        record
            .get(self.category_field)
            .unwrap_or(UNSPECIFIED_CATEGORY)
    }

    fn series_categories(&self, records: &[&Record]) -> Vec<String> {
        let mut categories = distinct_categories(records.iter().copied(), self.category_field);
        if records.iter().any(|r| r.get(self.category_field).is_none()) {
            categories.push(UNSPECIFIED_CATEGORY.to_string());
        }
        categories
    }
}

/// Groups rows into calendar-month buckets over `range`, summing
/// `measure_field` per value of `category_field`. The result has exactly one
/// bucket per month of the range.
pub fn bucket_by_month<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    month_field: &str,
    category_field: &str,
    measure_field: &str,
    range: &MonthRange,
) -> Series {
    Bucketizer::new(month_field, category_field, measure_field).bucket(records, range)
}

/// Distinct non-empty values of `category_field`. Order is first-seen,
/// though nothing downstream relies on it.
pub fn distinct_categories<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    category_field: &str,
) -> Vec<String> {
    unique_values(records, category_field)
}

/// Sum of `measure_field` over rows falling in `month`.
pub fn month_total<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    month_field_name: &str,
    measure_field: &str,
    month: MonthKey,
) -> f64 {
    records
        .into_iter()
        .filter(|r| month_field(r, month_field_name) == Some(month))
        .map(|r| numeric_field(r, measure_field))
        .sum()
}
