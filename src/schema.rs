use crate::error::{AnalyticsError, Result};
use crate::utils::{last_day_of_month, months_between, parse_period_string};
use chrono::{Datelike, Months, NaiveDate};
use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Category used for records whose category field is absent or empty.
pub const UNSPECIFIED_CATEGORY: &str = "(unspecified)";

/// A calendar year-month. Internally pinned to the first day of the month so
/// ordering and arithmetic come straight from `NaiveDate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey(NaiveDate);

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    /// Discards the day-of-month.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.with_day(1).unwrap_or(date))
    }

    /// Parses strict `YYYY-MM` text: four-digit year, two-digit month.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let well_formed = trimmed.len() == 7
            && trimmed.as_bytes()[4] == b'-'
            && trimmed
                .bytes()
                .enumerate()
                .all(|(i, b)| i == 4 || b.is_ascii_digit());
        if !well_formed {
            return Err(AnalyticsError::InvalidMonthKey(trimmed.to_string()));
        }
        let first = format!("{}-01", trimmed);
        NaiveDate::parse_from_str(&first, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| AnalyticsError::InvalidMonthKey(trimmed.to_string()))
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    pub fn last_day(&self) -> NaiveDate {
        last_day_of_month(self.year(), self.month()).unwrap_or(self.0)
    }

    /// The following month; stays put at the last month chrono can represent.
    pub fn next(&self) -> Self {
        self.checked_add_months(1).unwrap_or(*self)
    }

    /// The preceding month; stays put at the first month chrono can represent.
    pub fn prev(&self) -> Self {
        self.checked_add_months(-1).unwrap_or(*self)
    }

    /// Shifts by `delta` months. `None` when the result falls outside the
    /// calendar chrono supports.
    pub fn checked_add_months(&self, delta: i32) -> Option<Self> {
        let shifted = if delta >= 0 {
            self.0.checked_add_months(Months::new(delta.unsigned_abs()))
        } else {
            self.0.checked_sub_months(Months::new(delta.unsigned_abs()))
        };
        shifted.map(Self)
    }

    /// Same as [`MonthKey::checked_add_months`], reporting overflow as an error.
    pub fn try_add_months(&self, delta: i32) -> Result<Self> {
        self.checked_add_months(delta)
            .ok_or_else(|| AnalyticsError::MonthOutOfRange {
                month: self.to_string(),
                delta: i64::from(delta),
            })
    }

    /// Signed number of months from `self` to `other`.
    pub fn months_until(&self, other: MonthKey) -> i32 {
        months_between(self.0, other.0)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        MonthKey::parse(&text).map_err(serde::de::Error::custom)
    }
}

impl JsonSchema for MonthKey {
    fn schema_name() -> String {
        "MonthKey".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        String::json_schema(gen)
    }
}

/// An inclusive, ascending, gap-free run of months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(try_from = "MonthRangeBounds")]
pub struct MonthRange {
    start: MonthKey,
    end: MonthKey,
}

impl MonthRange {
    pub fn new(start: MonthKey, end: MonthKey) -> Result<Self> {
        if start > end {
            return Err(AnalyticsError::InvalidMonthRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn single(month: MonthKey) -> Self {
        Self {
            start: month,
            end: month,
        }
    }

    /// Accepts "YYYY-MM" or "YYYY-MM:YYYY-MM".
    pub fn parse(period: &str) -> Result<Self> {
        let (start, end) = parse_period_string(period)?;
        Self::new(start, end)
    }

    /// Expands a date window to the whole months it touches.
    pub fn covering(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        Self::new(MonthKey::from_date(start), MonthKey::from_date(end))
    }

    /// The last `count` months ending with the month of `reference`. Fails
    /// rather than shortening the range when `count` reaches past the
    /// supported calendar.
    pub fn trailing(reference: NaiveDate, count: usize) -> Result<Self> {
        if count == 0 {
            return Err(AnalyticsError::EmptyWindow);
        }
        let end = MonthKey::from_date(reference);
        let out_of_range = || AnalyticsError::MonthOutOfRange {
            month: end.to_string(),
            delta: -i64::try_from(count - 1).unwrap_or(i64::MAX),
        };
        let back = i32::try_from(count - 1).map_err(|_| out_of_range())?;
        let start = end.checked_add_months(-back).ok_or_else(out_of_range)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> MonthKey {
        self.start
    }

    pub fn end(&self) -> MonthKey {
        self.end
    }

    pub fn len(&self) -> usize {
        self.start.months_until(self.end) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn contains(&self, month: MonthKey) -> bool {
        self.start <= month && month <= self.end
    }

    pub fn months(&self) -> Vec<MonthKey> {
        let mut months = Vec::with_capacity(self.len());
        let mut current = self.start;
        while current <= self.end {
            months.push(current);
            let next = current.next();
            if next == current {
                break;
            }
            current = next;
        }
        months
    }
}

#[derive(Deserialize)]
struct MonthRangeBounds {
    start: MonthKey,
    end: MonthKey,
}

impl TryFrom<MonthRangeBounds> for MonthRange {
    type Error = AnalyticsError;

    fn try_from(bounds: MonthRangeBounds) -> Result<Self> {
        Self::new(bounds.start, bounds.end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MonthBucket {
    #[schemars(description = "Calendar month in YYYY-MM form")]
    pub month: MonthKey,

    #[schemars(
        description = "Sum of the measure per category for this month. Every category of the series is present, zero when no record contributed."
    )]
    pub values: BTreeMap<String, f64>,
}

impl MonthBucket {
    pub fn get(&self, category: &str) -> f64 {
        self.values.get(category).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.values.values().sum()
    }
}

/// Month buckets covering a contiguous range, each holding one sum per category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Series {
    #[schemars(description = "Categories in the order they were first observed in the data")]
    pub categories: Vec<String>,

    #[schemars(description = "One bucket per month of the requested range, ascending")]
    pub buckets: Vec<MonthBucket>,
}

impl Series {
    /// A series with every (month, category) cell set to zero.
    pub fn zeroed(categories: Vec<String>, range: &MonthRange) -> Self {
        let buckets = range
            .months()
            .into_iter()
            .map(|month| MonthBucket {
                month,
                values: categories.iter().map(|c| (c.clone(), 0.0)).collect(),
            })
            .collect();
        Self {
            categories,
            buckets,
        }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn months(&self) -> impl Iterator<Item = MonthKey> + '_ {
        self.buckets.iter().map(|b| b.month)
    }

    pub fn bucket(&self, month: MonthKey) -> Option<&MonthBucket> {
        self.buckets.iter().find(|b| b.month == month)
    }

    pub fn value(&self, month: MonthKey, category: &str) -> f64 {
        self.bucket(month).map(|b| b.get(category)).unwrap_or(0.0)
    }

    pub fn category_total(&self, category: &str) -> f64 {
        self.buckets.iter().map(|b| b.get(category)).sum()
    }

    pub fn last_value(&self, category: &str) -> f64 {
        self.buckets.last().map(|b| b.get(category)).unwrap_or(0.0)
    }

    pub(crate) fn add(&mut self, index: usize, category: &str, amount: f64) {
        if let Some(bucket) = self.buckets.get_mut(index) {
            *bucket.values.entry(category.to_string()).or_insert(0.0) += amount;
        }
    }

    /// Combines two series over the same months into one with the union of
    /// their categories. Months missing from `other` read as zero.
    pub fn merge(&self, other: &Series) -> Series {
        let mut categories = self.categories.clone();
        for category in &other.categories {
            if !categories.contains(category) {
                categories.push(category.clone());
            }
        }

        let buckets = self
            .buckets
            .iter()
            .map(|bucket| MonthBucket {
                month: bucket.month,
                values: categories
                    .iter()
                    .map(|c| {
                        let value = if self.categories.contains(c) {
                            bucket.get(c)
                        } else {
                            other.value(bucket.month, c)
                        };
                        (c.clone(), value)
                    })
                    .collect(),
            })
            .collect();

        Series {
            categories,
            buckets,
        }
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(Series)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}
