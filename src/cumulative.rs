use crate::schema::{MonthBucket, Series};
use std::collections::BTreeMap;

/// Running total per category: each bucket holds the sum of that category
/// over every bucket up to and including itself.
pub fn to_cumulative(series: &Series) -> Series {
    let mut running: BTreeMap<&str, f64> = series
        .categories
        .iter()
        .map(|c| (c.as_str(), 0.0))
        .collect();

    let buckets = series
        .buckets
        .iter()
        .map(|bucket| {
            let values = series
                .categories
                .iter()
                .map(|category| {
                    let total = running.entry(category.as_str()).or_insert(0.0);
                    *total += bucket.get(category);
                    (category.clone(), *total)
                })
                .collect();
            MonthBucket {
                month: bucket.month,
                values,
            }
        })
        .collect();

    Series {
        categories: series.categories.clone(),
        buckets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{MonthKey, MonthRange};

    fn series_with(values: &[(usize, &str, f64)], range: &str, categories: &[&str]) -> Series {
        let range = MonthRange::parse(range).unwrap();
        let mut series = Series::zeroed(categories.iter().map(|c| c.to_string()).collect(), &range);
        for (index, category, amount) in values {
            series.add(*index, category, *amount);
        }
        series
    }

    #[test]
    fn test_running_totals_per_category() {
        let series = series_with(
            &[(0, "X", 1000.0), (1, "X", 500.0), (1, "Y", 20.0), (3, "Y", 5.0)],
            "2024-01:2024-04",
            &["X", "Y"],
        );
        let cumulative = to_cumulative(&series);

        let x: Vec<f64> = cumulative.buckets.iter().map(|b| b.get("X")).collect();
        let y: Vec<f64> = cumulative.buckets.iter().map(|b| b.get("Y")).collect();
        assert_eq!(x, vec![1000.0, 1500.0, 1500.0, 1500.0]);
        assert_eq!(y, vec![0.0, 20.0, 20.0, 25.0]);
        assert_eq!(cumulative.len(), series.len());
    }

    #[test]
    fn test_non_negative_measures_never_decrease() {
        let series = series_with(
            &[(0, "A", 3.0), (2, "A", 0.0), (4, "A", 7.5), (5, "A", 1.0)],
            "2023-09:2024-02",
            &["A"],
        );
        let cumulative = to_cumulative(&series);
        let values: Vec<f64> = cumulative.buckets.iter().map(|b| b.get("A")).collect();
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(
            cumulative.value(MonthKey::parse("2024-02").unwrap(), "A"),
            series.category_total("A")
        );
    }

    #[test]
    fn test_empty_series_stays_empty() {
        let series = series_with(&[], "2024-01:2024-03", &[]);
        let cumulative = to_cumulative(&series);
        assert_eq!(cumulative.len(), 3);
        assert!(cumulative.categories.is_empty());
    }
}
