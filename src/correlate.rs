use crate::record::{JoinKey, Record};
use log::debug;
use std::collections::{BTreeMap, HashSet};

/// Rows whose fields equal every value in `criteria`. Fields not named in
/// `criteria` are unconstrained, so an empty map selects everything.
pub fn select_by_equality<'a>(
    records: &'a [Record],
    criteria: &BTreeMap<String, String>,
) -> Vec<&'a Record> {
    records
        .iter()
        .filter(|record| matches_all(record, criteria))
        .collect()
}

pub fn matches_all(record: &Record, criteria: &BTreeMap<String, String>) -> bool {
    criteria
        .iter()
        .all(|(field, expected)| record.get(field) == Some(expected.as_str()))
}

/// Distinct non-empty values of `key_field`, ready to be used as a parent
/// key set.
pub fn key_set<'a>(records: impl IntoIterator<Item = &'a Record>, key_field: &str) -> HashSet<String> {
    records
        .into_iter()
        .filter_map(|r| r.get(key_field))
        .map(str::to_string)
        .collect()
}

/// Children whose `key_field` value is one of the parent keys. Children
/// without a parent are dropped.
pub fn correlate_by_key<'a>(
    children: &'a [Record],
    parent_keys: &HashSet<String>,
    key_field: &str,
) -> Vec<&'a Record> {
    let matched: Vec<&Record> = children
        .iter()
        .filter(|child| {
            child
                .get(key_field)
                .map_or(false, |key| parent_keys.contains(key))
        })
        .collect();

    let unmatched = children.len() - matched.len();
    if unmatched > 0 {
        debug!(
            "{} of {} rows had no parent on {}",
            unmatched,
            children.len(),
            key_field
        );
    }

    matched
}

/// Joins two tables on a declared business key, resolving the column name
/// on each side.
pub fn correlate<'a, 'p>(
    children: &'a [Record],
    child_table: &str,
    parents: impl IntoIterator<Item = &'p Record>,
    parent_table: &str,
    key: JoinKey,
) -> Vec<&'a Record> {
    let keys = key_set(parents, key.field_for(parent_table));
    correlate_by_key(children, &keys, key.field_for(child_table))
}

/// The first row whose `field` equals `value`, e.g. a client's metadata row.
pub fn find_first<'a>(records: &'a [Record], field: &str, value: &str) -> Option<&'a Record> {
    records.iter().find(|r| r.get(field) == Some(value))
}

/// Distinct non-empty values of `field` in first-seen order.
pub fn unique_values<'a>(records: impl IntoIterator<Item = &'a Record>, field: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut values = Vec::new();
    for value in records.into_iter().filter_map(|r| r.get(field)) {
        if seen.insert(value) {
            values.push(value.to_string());
        }
    }
    values
}
