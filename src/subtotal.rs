use crate::normalize::numeric_field;
use crate::record::Record;
use crate::schema::UNSPECIFIED_CATEGORY;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Rows sharing one group key, with a sum per measure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedSubtotal<'a> {
    pub key: String,
    pub members: Vec<&'a Record>,
    pub sums: BTreeMap<String, f64>,
}

impl GroupedSubtotal<'_> {
    pub fn sum(&self, measure: &str) -> f64 {
        self.sums.get(measure).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtotalRollup<'a> {
    /// Groups in the order their key was first seen.
    pub groups: Vec<GroupedSubtotal<'a>>,
    /// Sums over every group.
    pub totals: BTreeMap<String, f64>,
}

impl<'a> SubtotalRollup<'a> {
    pub fn total(&self, measure: &str) -> f64 {
        self.totals.get(measure).copied().unwrap_or(0.0)
    }

    pub fn group(&self, key: &str) -> Option<&GroupedSubtotal<'a>> {
        self.groups.iter().find(|g| g.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Partitions rows by `group_key_field` and sums each of `measure_fields`
/// per group and overall. Rows without a key fall into one unspecified group.
pub fn group_and_subtotal<'a>(
    records: impl IntoIterator<Item = &'a Record>,
    group_key_field: &str,
    measure_fields: &[&str],
) -> SubtotalRollup<'a> {
    let zeroed = || -> BTreeMap<String, f64> {
        measure_fields.iter().map(|m| (m.to_string(), 0.0)).collect()
    };

    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<GroupedSubtotal<'a>> = Vec::new();
    let mut totals = zeroed();

    for record in records {
        let key = record.get(group_key_field).unwrap_or(UNSPECIFIED_CATEGORY);
        let position = *positions.entry(key.to_string()).or_insert_with(|| {
            groups.push(GroupedSubtotal {
                key: key.to_string(),
                members: Vec::new(),
                sums: zeroed(),
            });
            groups.len() - 1
        });

        let group = &mut groups[position];
        group.members.push(record);
        for measure in measure_fields {
            let amount = numeric_field(record, measure);
            *group.sums.entry(measure.to_string()).or_insert(0.0) += amount;
            *totals.entry(measure.to_string()).or_insert(0.0) += amount;
        }
    }

    SubtotalRollup { groups, totals }
}
