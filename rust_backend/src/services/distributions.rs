use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{SystemEfficiency, SystemEnergy};

/// Initial guess for the floor formula against `2.9999999999999996` style
/// division error; the bin edges have the final say.
const BIN_EPSILON: f64 = 1e-9;

/// Which value of a per-system record a histogram counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistogramField {
    Az,
    AzHeating,
    Energy,
    EnergyHeating,
}

impl HistogramField {
    /// The (total, heating-only) pair a combined histogram shows.
    pub fn combined_pair(self) -> (HistogramField, HistogramField) {
        match self {
            HistogramField::Az | HistogramField::AzHeating => {
                (HistogramField::Az, HistogramField::AzHeating)
            }
            HistogramField::Energy | HistogramField::EnergyHeating => {
                (HistogramField::Energy, HistogramField::EnergyHeating)
            }
        }
    }
}

/// Records a histogram can be built from.
pub trait HistogramSource {
    fn source_id(&self) -> &str;

    /// Value of `field`, or `None` when the record has no such value.
    fn histogram_value(&self, field: HistogramField) -> Option<f64>;
}

impl HistogramSource for SystemEfficiency {
    fn source_id(&self) -> &str {
        &self.heating_id
    }

    fn histogram_value(&self, field: HistogramField) -> Option<f64> {
        match field {
            HistogramField::Az => self.az,
            HistogramField::AzHeating => self.az_heating,
            HistogramField::Energy | HistogramField::EnergyHeating => None,
        }
    }
}

impl HistogramSource for SystemEnergy {
    fn source_id(&self) -> &str {
        &self.heating_id
    }

    fn histogram_value(&self, field: HistogramField) -> Option<f64> {
        match field {
            HistogramField::Energy => Some(self.energy_kwh),
            HistogramField::EnergyHeating => Some(self.energy_heating_kwh),
            HistogramField::Az | HistogramField::AzHeating => None,
        }
    }
}

/// One half-open bin `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub label: String,
    pub start: f64,
    pub end: f64,
    pub count: usize,
    pub heating_ids: Vec<String>,
    /// Only filled by combined histograms.
    #[serde(default)]
    pub count_heating: usize,
    #[serde(default)]
    pub heating_ids_heating: Vec<String>,
}

/// Summary statistics over the values that went into the bins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HistogramStats {
    pub mean: f64,
    /// Lower-middle element on an even count.
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistogramResult {
    pub bins: Vec<HistogramBin>,
    pub stats: HistogramStats,
}

impl HistogramResult {
    /// Sum of `count` over all bins.
    pub fn total_count(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Compute statistics for a set of values.
/// Empty input yields all zeros.
pub fn compute_stats(values: &[f64]) -> HistogramStats {
    if values.is_empty() {
        return HistogramStats::default();
    }

    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let median = sorted[(count - 1) / 2];

    HistogramStats {
        mean,
        median,
        min: sorted[0],
        max: sorted[count - 1],
        count,
    }
}

/// Decimal places of `bin_size` when it is a short decimal.
fn decimal_places(bin_size: f64) -> Option<usize> {
    if bin_size.fract() == 0.0 {
        return Some(0);
    }
    (1..=4).find(|&digits| {
        let scaled = bin_size * 10f64.powi(digits as i32);
        (scaled - scaled.round()).abs() < 1e-6
    })
}

/// Decimal places needed to print multiples of `bin_size` exactly.
fn label_precision(bin_size: f64) -> usize {
    decimal_places(bin_size).unwrap_or(4)
}

/// Bin boundaries at multiples of the bin size.
///
/// For short decimal sizes the boundaries are rounded to the label's decimals,
/// so `3 * 0.1` starts its bin at `0.3` and not at `0.30000000000000004`.
struct BinEdges {
    size: f64,
    scale: Option<f64>,
}

impl BinEdges {
    fn new(size: f64) -> Self {
        Self {
            size,
            scale: decimal_places(size).map(|digits| 10f64.powi(digits as i32)),
        }
    }

    fn edge(&self, index: i64) -> f64 {
        let raw = index as f64 * self.size;
        match self.scale {
            Some(scale) => (raw * scale).round() / scale,
            None => raw,
        }
    }

    /// Index `i` with `edge(i) <= value < edge(i + 1)`.
    fn index_of(&self, value: f64) -> i64 {
        let mut index = (value / self.size + BIN_EPSILON).floor() as i64;
        while index > i64::MIN && self.edge(index) > value {
            index -= 1;
        }
        while index < i64::MAX && self.edge(index + 1) <= value {
            index += 1;
        }
        index
    }
}

fn collect_values<T: HistogramSource>(systems: &[T], field: HistogramField) -> Vec<(&str, f64)> {
    systems
        .iter()
        .filter_map(|s| match s.histogram_value(field) {
            Some(v) if v.is_finite() => Some((s.source_id(), v)),
            _ => None,
        })
        .collect()
}

#[derive(Default)]
struct BinMembers {
    ids: Vec<String>,
    ids_heating: Vec<String>,
}

/// Build fixed-width histogram bins with boundaries at multiples of `bin_size`.
///
/// Every valid value lands in exactly one bin, `floor(value / bin_size)`,
/// and always satisfies `start <= value < end` for that bin.
/// Bins without members are left out. `stats` cover the values of `field`
/// (the total series when `combined`).
///
/// With `combined == true` the total and heating-only series share one set of
/// bins; the heating series fills `count_heating` and `heating_ids_heating`.
///
/// A non-positive or non-finite `bin_size` gives an empty result.
///
/// # Examples
///
/// ```
/// use heatpump_analytics::models::SystemEfficiency;
/// use heatpump_analytics::services::distributions::{create_histogram_bins, HistogramField};
///
/// let systems: Vec<SystemEfficiency> = [2.2, 2.7, 3.3]
///     .iter()
///     .enumerate()
///     .map(|(i, cop)| SystemEfficiency::from_totals(format!("hp-{i}"), cop * 100.0, 100.0, 0.0, 0.0))
///     .collect();
///
/// let result = create_histogram_bins(&systems, HistogramField::Az, 0.5, false);
/// let labels: Vec<&str> = result.bins.iter().map(|b| b.label.as_str()).collect();
/// assert_eq!(labels, vec!["2.0-2.5", "2.5-3.0", "3.0-3.5"]);
/// assert!((result.stats.median - 2.7).abs() < 1e-9);
/// ```
pub fn create_histogram_bins<T: HistogramSource>(
    systems: &[T],
    field: HistogramField,
    bin_size: f64,
    combined: bool,
) -> HistogramResult {
    if !(bin_size.is_finite() && bin_size > 0.0) {
        log::debug!("Skipping histogram with invalid bin size {}", bin_size);
        return HistogramResult::default();
    }

    let (primary_field, heating_field) = if combined {
        field.combined_pair()
    } else {
        (field, field)
    };

    let primary = collect_values(systems, primary_field);
    let heating = if combined {
        collect_values(systems, heating_field)
    } else {
        Vec::new()
    };

    let primary_values: Vec<f64> = primary.iter().map(|(_, v)| *v).collect();
    let stats = compute_stats(&primary_values);

    let edges = BinEdges::new(bin_size);
    let mut members: BTreeMap<i64, BinMembers> = BTreeMap::new();
    for (id, value) in &primary {
        members
            .entry(edges.index_of(*value))
            .or_default()
            .ids
            .push(id.to_string());
    }
    for (id, value) in &heating {
        members
            .entry(edges.index_of(*value))
            .or_default()
            .ids_heating
            .push(id.to_string());
    }

    let precision = label_precision(bin_size);
    let bins: Vec<HistogramBin> = members
        .into_iter()
        .map(|(index, members)| {
            let start = edges.edge(index);
            let end = edges.edge(index.saturating_add(1));
            HistogramBin {
                label: format!("{:.*}-{:.*}", precision, start, precision, end),
                start,
                end,
                count: members.ids.len(),
                heating_ids: members.ids,
                count_heating: members.ids_heating.len(),
                heating_ids_heating: members.ids_heating,
            }
        })
        .collect();

    log::debug!(
        "Histogram over {:?}: {} values in {} bins (size {})",
        primary_field,
        stats.count,
        bins.len(),
        bin_size
    );

    HistogramResult { bins, stats }
}

/// Automatic bin width for value ranges in kWh.
///
/// Aims at roughly `target_bins` bins, rounded up to a multiple of `step`,
/// never below `minimum`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutoBinSizing {
    pub target_bins: usize,
    pub step: f64,
    pub minimum: f64,
}

impl Default for AutoBinSizing {
    fn default() -> Self {
        Self {
            target_bins: 15,
            step: 50.0,
            minimum: 50.0,
        }
    }
}

impl AutoBinSizing {
    pub fn bin_size(&self, values: &[f64]) -> f64 {
        let finite = values.iter().copied().filter(|v| v.is_finite());
        let (min, max) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });

        let range = max - min;
        if !(range.is_finite() && range > 0.0) || self.target_bins == 0 || self.step <= 0.0 {
            return self.minimum;
        }

        let raw = range / self.target_bins as f64;
        let rounded = (raw / self.step).ceil() * self.step;
        rounded.max(self.minimum)
    }
}

/// `ceil((range / 15) / 50) * 50`, at least 50.
pub fn auto_energy_bin_size(values: &[f64]) -> f64 {
    AutoBinSizing::default().bin_size(values)
}

/// Histogram with the bin width chosen by `sizing` from the values shown.
pub fn create_auto_sized_histogram<T: HistogramSource>(
    systems: &[T],
    field: HistogramField,
    combined: bool,
    sizing: &AutoBinSizing,
) -> HistogramResult {
    let fields = if combined {
        let (total, heating) = field.combined_pair();
        vec![total, heating]
    } else {
        vec![field]
    };

    let values: Vec<f64> = fields
        .into_iter()
        .flat_map(|f| collect_values(systems, f).into_iter().map(|(_, v)| v))
        .collect();

    create_histogram_bins(systems, field, sizing.bin_size(&values), combined)
}
