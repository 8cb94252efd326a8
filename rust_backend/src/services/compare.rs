use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::models::{IndexedObservation, MergedRow, SystemProfile};
use crate::services::aggregation::{process_dataset, AggregationMode};
use crate::transformations::filtering::ComparisonGroups;

/// Series key of one group's value, e.g. `"az (Neubau)"`.
pub fn series_key(metric: &str, group: &str) -> String {
    format!("{} ({})", metric, group)
}

/// `name`, or `name #2`, `name #3`, ... when an earlier group already uses it.
fn unique_series_name(name: &str, used: &mut HashSet<String>) -> String {
    let mut candidate = name.to_string();
    let mut n = 2;
    while used.contains(&candidate) {
        candidate = format!("{} #{}", name, n);
        n += 1;
    }
    if candidate != name {
        log::warn!(
            "Duplicate comparison group name '{}', using '{}' for its series",
            name,
            candidate
        );
    }
    used.insert(candidate.clone());
    candidate
}

/// Aggregate each named group by index and join the results on the index.
///
/// Every group contributes `az (<name>)` and `az_heating (<name>)` plus the
/// temperature series it observed. Rows follow `canonical_index` when given
/// (unlisted indices come after it, sorted), else lexicographic order. Rows
/// where no group has a positive efficiency value are dropped. A repeated
/// group name gets a ` #2` suffix so no group overwrites another.
pub fn merge_comparison_datasets(
    groups: &[(String, Vec<IndexedObservation>)],
    canonical_index: Option<&[String]>,
) -> Vec<MergedRow> {
    let mut merged: BTreeMap<String, (MergedRow, bool)> = BTreeMap::new();
    let mut used_names: HashSet<String> = HashSet::new();

    for (group_name, observations) in groups {
        let name = unique_series_name(group_name, &mut used_names);
        for bucket in process_dataset(observations, AggregationMode::Averaged, None) {
            let (row, has_positive) = merged
                .entry(bucket.index.clone())
                .or_insert_with(|| (MergedRow::new(bucket.index.clone()), false));

            *has_positive |= bucket.has_positive_value();
            row.values.insert(series_key("az", &name), bucket.az);
            row.values
                .insert(series_key("az_heating", &name), bucket.az_heating);
            if let Some(t) = bucket.outdoor_temperature_c {
                row.values
                    .insert(series_key("outdoor_temperature_c", &name), t);
            }
            if let Some(t) = bucket.flow_temperature_c {
                row.values.insert(series_key("flow_temperature_c", &name), t);
            }
        }
    }

    let mut ordered = Vec::with_capacity(merged.len());
    if let Some(canonical) = canonical_index {
        for index in canonical {
            if let Some(entry) = merged.remove(index) {
                ordered.push(entry);
            }
        }
    }
    ordered.extend(merged.into_values());

    let total = ordered.len();
    let rows: Vec<MergedRow> = ordered
        .into_iter()
        .filter(|(_, has_positive)| *has_positive)
        .map(|(row, _)| row)
        .collect();

    log::debug!(
        "Merged {} groups into {} rows ({} without data dropped)",
        groups.len(),
        rows.len(),
        total - rows.len()
    );
    rows
}

/// Size of one comparison group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub name: String,
    pub color: String,
    pub system_count: usize,
    pub observation_count: usize,
}

/// Two-group comparison chart data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupComparison {
    pub groups: Vec<GroupSummary>,
    pub rows: Vec<MergedRow>,
}

/// Partition systems by their profiles, then aggregate and merge the
/// observations of each group.
///
/// A system matching both groups is counted in both.
pub fn compare_groups(
    observations: &[IndexedObservation],
    profiles: &[SystemProfile],
    groups: &ComparisonGroups,
    canonical_index: Option<&[String]>,
) -> GroupComparison {
    let subsets = groups.partition(profiles);

    let mut summaries = Vec::with_capacity(subsets.len());
    let mut datasets = Vec::with_capacity(subsets.len());
    for subset in subsets {
        let ids: HashSet<&str> = subset.rows.iter().map(|p| p.heating_id.as_str()).collect();
        let selected: Vec<IndexedObservation> = observations
            .iter()
            .filter(|o| ids.contains(o.heating_id.as_str()))
            .cloned()
            .collect();

        summaries.push(GroupSummary {
            name: subset.name.clone(),
            color: subset.color.clone(),
            system_count: ids.len(),
            observation_count: selected.len(),
        });
        datasets.push((subset.name, selected));
    }

    GroupComparison {
        groups: summaries,
        rows: merge_comparison_datasets(&datasets, canonical_index),
    }
}
