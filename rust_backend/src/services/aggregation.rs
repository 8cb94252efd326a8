//! Energy readings to efficiency values, and index-keyed chart buckets.
//!
//! Two shapes of input are supported. Period totals (monthly, yearly) are
//! summed per system by [`calculate_system_az`]. Cumulative counter readings
//! (hourly, daily) are differenced by [`calculate_daily_taz`]: consumption over
//! the window is the last reading minus the first.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::{
    BucketRow, DailyEfficiency, EnergySums, IndexedObservation, MeasurementRow, SystemEfficiency,
};

/// Sum the four energy fields per system and derive `az`/`az_heating`.
///
/// Missing values contribute nothing. Output is sorted by `heating_id`.
pub fn calculate_system_az(rows: &[MeasurementRow]) -> Vec<SystemEfficiency> {
    let mut sums: BTreeMap<&str, EnergySums> = BTreeMap::new();
    for row in rows {
        sums.entry(row.heating_id.as_str()).or_default().add_row(row);
    }

    let systems: Vec<SystemEfficiency> = sums
        .into_iter()
        .map(|(id, totals)| totals.into_efficiency(id))
        .collect();

    log::debug!(
        "Aggregated {} rows into {} systems",
        rows.len(),
        systems.len()
    );
    systems
}

fn cmp_optional(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Chronological order; equal timestamps are broken by the readings so the
/// result never depends on input order.
fn chronological(a: &&MeasurementRow, b: &&MeasurementRow) -> Ordering {
    a.timestamp.cmp(&b.timestamp).then_with(|| {
        a.energy_fields()
            .iter()
            .zip(b.energy_fields().iter())
            .map(|(x, y)| cmp_optional(*x, *y))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    })
}

/// `last - first` over the non-null readings of one counter, `0.0` with fewer
/// than two.
fn counter_delta(sorted: &[&MeasurementRow], field: usize) -> f64 {
    let mut readings = sorted.iter().filter_map(|row| row.energy_fields()[field]);
    let Some(first) = readings.next() else {
        return 0.0;
    };
    match readings.last() {
        Some(last) => last - first,
        None => 0.0,
    }
}

fn system_delta(heating_id: &str, rows: &mut Vec<&MeasurementRow>) -> SystemEfficiency {
    rows.sort_by(chronological);
    SystemEfficiency::from_totals(
        heating_id,
        counter_delta(rows, 0),
        counter_delta(rows, 1),
        counter_delta(rows, 2),
        counter_delta(rows, 3),
    )
}

/// Efficiency from cumulative counters (TAZ): per system, sort by timestamp
/// and take `last - first` of every counter.
///
/// Rows without a timestamp are skipped. A system with a single reading gets
/// zero deltas and `None` efficiency. Output is sorted by `heating_id` and
/// does not depend on the order of `rows`.
pub fn calculate_daily_taz(rows: &[MeasurementRow]) -> Vec<SystemEfficiency> {
    let mut by_system: BTreeMap<&str, Vec<&MeasurementRow>> = BTreeMap::new();
    let mut skipped = 0usize;
    for row in rows {
        if row.timestamp.is_none() {
            skipped += 1;
            continue;
        }
        by_system.entry(row.heating_id.as_str()).or_default().push(row);
    }

    if skipped > 0 {
        log::debug!("Skipped {} counter rows without timestamp", skipped);
    }

    by_system
        .into_iter()
        .map(|(id, mut system_rows)| system_delta(id, &mut system_rows))
        .collect()
}

/// Daily TAZ series: [`calculate_daily_taz`] applied to every
/// `(heating_id, UTC date)` group. Sorted by system, then date.
pub fn calculate_taz_per_day(rows: &[MeasurementRow]) -> Vec<DailyEfficiency> {
    let mut by_day: BTreeMap<(&str, NaiveDate), Vec<&MeasurementRow>> = BTreeMap::new();
    for row in rows {
        if let Some(timestamp) = row.timestamp {
            by_day
                .entry((row.heating_id.as_str(), timestamp.date_naive()))
                .or_default()
                .push(row);
        }
    }

    by_day
        .into_iter()
        .map(|((id, date), mut day_rows)| DailyEfficiency {
            date,
            system: system_delta(id, &mut day_rows),
        })
        .collect()
}

/// How [`process_dataset`] shapes observations into chart rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// One row per index value, averaging the observations in it.
    #[default]
    Averaged,
    /// One row per observation, in input order.
    Passthrough,
}

#[derive(Debug, Clone, Copy, Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.count += 1;
    }

    fn value(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

#[derive(Debug, Default)]
struct Bucket {
    az: Mean,
    az_heating: Mean,
    outdoor: Mean,
    flow: Mean,
    samples: usize,
}

impl Bucket {
    fn add(&mut self, observation: &IndexedObservation) {
        self.samples += 1;
        let positive = |v: &f64| *v > 0.0 && v.is_finite();
        if let Some(v) = observation.az.filter(positive) {
            self.az.add(v);
        }
        if let Some(v) = observation.az_heating.filter(positive) {
            self.az_heating.add(v);
        }
        if let Some(v) = observation.outdoor_temperature_c.filter(|v| v.is_finite()) {
            self.outdoor.add(v);
        }
        if let Some(v) = observation.flow_temperature_c.filter(|v| v.is_finite()) {
            self.flow.add(v);
        }
    }

    fn into_row(self, index: String) -> BucketRow {
        BucketRow {
            index,
            az: self.az.value().unwrap_or(0.0),
            az_heating: self.az_heating.value().unwrap_or(0.0),
            outdoor_temperature_c: self.outdoor.value(),
            flow_temperature_c: self.flow.value(),
            sample_count: self.samples,
        }
    }
}

/// Bucket observations by index and average them.
///
/// Only positive `az`/`az_heating` values enter the averages (zero or
/// negative marks a period without heat demand); a bucket without any gets
/// `0.0`. Temperatures average every non-null value.
///
/// With a `canonical_index` the rows follow that order and every canonical
/// value gets a row, empty ones included. Observed indices outside the list
/// are appended in lexicographic order. Without one, rows are sorted
/// lexicographically.
pub fn group_data_by_index(
    observations: &[IndexedObservation],
    canonical_index: Option<&[String]>,
) -> Vec<BucketRow> {
    let mut buckets: BTreeMap<String, Bucket> = BTreeMap::new();
    for observation in observations {
        buckets
            .entry(observation.index.clone())
            .or_default()
            .add(observation);
    }

    let Some(canonical) = canonical_index else {
        return buckets
            .into_iter()
            .map(|(index, bucket)| bucket.into_row(index))
            .collect();
    };

    let mut rows = Vec::with_capacity(canonical.len().max(buckets.len()));
    for index in canonical {
        match buckets.remove(index) {
            Some(bucket) => rows.push(bucket.into_row(index.clone())),
            None => rows.push(BucketRow::empty(index.clone())),
        }
    }
    if !buckets.is_empty() {
        log::warn!(
            "{} index values are not part of the canonical index",
            buckets.len()
        );
    }
    rows.extend(
        buckets
            .into_iter()
            .map(|(index, bucket)| bucket.into_row(index)),
    );
    rows
}

fn passthrough_row(observation: &IndexedObservation) -> BucketRow {
    let positive = |value: Option<f64>| match value {
        Some(v) if v > 0.0 && v.is_finite() => v,
        _ => 0.0,
    };
    BucketRow {
        index: observation.index.clone(),
        az: positive(observation.az),
        az_heating: positive(observation.az_heating),
        outdoor_temperature_c: observation.outdoor_temperature_c,
        flow_temperature_c: observation.flow_temperature_c,
        sample_count: 1,
    }
}

/// Shape observations into chart rows according to `mode`.
///
/// `canonical_index` only applies to [`AggregationMode::Averaged`].
pub fn process_dataset(
    observations: &[IndexedObservation],
    mode: AggregationMode,
    canonical_index: Option<&[String]>,
) -> Vec<BucketRow> {
    match mode {
        AggregationMode::Averaged => group_data_by_index(observations, canonical_index),
        AggregationMode::Passthrough => observations.iter().map(passthrough_row).collect(),
    }
}

/// `"01"` through `"12"`.
pub fn month_index() -> Vec<String> {
    (1..=12).map(|m| format!("{:02}", m)).collect()
}

/// `"00"` through `"23"`.
pub fn hour_index() -> Vec<String> {
    (0..24).map(|h| format!("{:02}", h)).collect()
}
