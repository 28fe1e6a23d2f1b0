use crate::schema::{MonthKey, Series};
use serde::{Deserialize, Serialize};

const MONTHS_PER_YEAR: f64 = 12.0;

/// Flat annualisation of a monthly figure, no compounding.
pub fn annualize(monthly_value: f64) -> f64 {
    monthly_value * MONTHS_PER_YEAR
}

/// `part` as a percentage of `whole`; zero when `whole` is not positive.
pub fn percent_of_total(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        100.0 * part / whole
    } else {
        0.0
    }
}

/// The value of `category` in the bucket for `month`, or zero when the
/// series has no such bucket or category.
pub fn current_period_value(series: &Series, category: &str, month: MonthKey) -> f64 {
    series.value(month, category)
}

/// A client's slice of a portfolio figure for one month, with the annualised
/// values and the client's share.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShareMetric {
    pub monthly: f64,
    pub portfolio_monthly: f64,
    pub annualized: f64,
    pub portfolio_annualized: f64,
    pub percent_of_total: f64,
}

impl ShareMetric {
    /// Builds the metric from a series bucketed by client, where every
    /// category is one client.
    pub fn from_series(by_client: &Series, client: &str, month: MonthKey) -> Self {
        let monthly = current_period_value(by_client, client, month);
        let portfolio_monthly = by_client.bucket(month).map_or(0.0, |b| b.total());
        Self::new(monthly, portfolio_monthly)
    }

    pub fn new(monthly: f64, portfolio_monthly: f64) -> Self {
        let annualized = annualize(monthly);
        let portfolio_annualized = annualize(portfolio_monthly);
        Self {
            monthly,
            portfolio_monthly,
            annualized,
            portfolio_annualized,
            percent_of_total: percent_of_total(annualized, portfolio_annualized),
        }
    }
}
