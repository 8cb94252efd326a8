//! Input rows and chart-level records.
//!
//! These are the plain records that cross the library boundary: measurement
//! rows supplied by the data-fetch layer, regression points, and the
//! index-keyed rows handed to a charting library.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One energy/temperature observation for a heating system.
///
/// Energy fields are either period totals (monthly, yearly) or cumulative
/// counter readings (hourly, daily). A `None` field means "no data", which is
/// never the same as a reading of zero.
///
/// # Examples
///
/// ```
/// use heatpump_analytics::models::MeasurementRow;
///
/// let row = MeasurementRow::new("hp-1")
///     .with_energy(350.0, 100.0)
///     .with_heating_energy(300.0, 90.0);
/// assert_eq!(row.electrical_energy_kwh, Some(100.0));
/// assert!(row.timestamp.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeasurementRow {
    pub heating_id: String,
    pub thermal_energy_kwh: Option<f64>,
    pub electrical_energy_kwh: Option<f64>,
    pub thermal_energy_heating_kwh: Option<f64>,
    pub electrical_energy_heating_kwh: Option<f64>,
    pub outdoor_temperature_c: Option<f64>,
    pub flow_temperature_c: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl MeasurementRow {
    /// Creates an empty row for a heating system.
    pub fn new(heating_id: impl Into<String>) -> Self {
        Self {
            heating_id: heating_id.into(),
            ..Default::default()
        }
    }

    /// Sets the total thermal and electrical energy.
    pub fn with_energy(mut self, thermal_kwh: f64, electrical_kwh: f64) -> Self {
        self.thermal_energy_kwh = Some(thermal_kwh);
        self.electrical_energy_kwh = Some(electrical_kwh);
        self
    }

    /// Sets the heating-only thermal and electrical energy.
    pub fn with_heating_energy(mut self, thermal_kwh: f64, electrical_kwh: f64) -> Self {
        self.thermal_energy_heating_kwh = Some(thermal_kwh);
        self.electrical_energy_heating_kwh = Some(electrical_kwh);
        self
    }

    /// Sets the outdoor and flow temperatures.
    pub fn with_temperatures(mut self, outdoor_c: Option<f64>, flow_c: Option<f64>) -> Self {
        self.outdoor_temperature_c = outdoor_c;
        self.flow_temperature_c = flow_c;
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// All four energy fields in a fixed order: thermal, electrical,
    /// thermal heating, electrical heating.
    pub fn energy_fields(&self) -> [Option<f64>; 4] {
        [
            self.thermal_energy_kwh,
            self.electrical_energy_kwh,
            self.thermal_energy_heating_kwh,
            self.electrical_energy_heating_kwh,
        ]
    }
}

/// Generic regression input/output unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
}

impl DataPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A regression point carrying an external confidence weight
/// (for example the share of the period covered by measurements).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedDataPoint {
    pub x: f64,
    pub y: f64,
    pub weight: f64,
}

impl WeightedDataPoint {
    pub fn new(x: f64, y: f64, weight: f64) -> Self {
        Self { x, y, weight }
    }
}

impl From<DataPoint> for WeightedDataPoint {
    fn from(point: DataPoint) -> Self {
        Self::new(point.x, point.y, 1.0)
    }
}

/// One chart observation keyed by an index label (month, hour, date, ...).
///
/// `az` and `az_heating` are efficiency ratios. Zero or negative values mark
/// periods without heat demand and are not efficiency data.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IndexedObservation {
    pub index: String,
    pub heating_id: String,
    pub az: Option<f64>,
    pub az_heating: Option<f64>,
    pub outdoor_temperature_c: Option<f64>,
    pub flow_temperature_c: Option<f64>,
}

impl IndexedObservation {
    pub fn new(index: impl Into<String>, heating_id: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            heating_id: heating_id.into(),
            ..Default::default()
        }
    }

    pub fn with_az(mut self, az: Option<f64>, az_heating: Option<f64>) -> Self {
        self.az = az;
        self.az_heating = az_heating;
        self
    }

    pub fn with_temperatures(mut self, outdoor_c: Option<f64>, flow_c: Option<f64>) -> Self {
        self.outdoor_temperature_c = outdoor_c;
        self.flow_temperature_c = flow_c;
        self
    }
}

/// Aggregated chart row for one index value.
///
/// A bucket without any positive efficiency observation carries `0.0` in
/// `az`/`az_heating`; temperatures stay `None` when nothing was observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketRow {
    pub index: String,
    pub az: f64,
    pub az_heating: f64,
    pub outdoor_temperature_c: Option<f64>,
    pub flow_temperature_c: Option<f64>,
    pub sample_count: usize,
}

impl BucketRow {
    /// Placeholder row for an index value without data.
    pub fn empty(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            az: 0.0,
            az_heating: 0.0,
            outdoor_temperature_c: None,
            flow_temperature_c: None,
            sample_count: 0,
        }
    }

    pub fn has_positive_value(&self) -> bool {
        self.az > 0.0 || self.az_heating > 0.0
    }
}

/// Comparison chart row: shared index plus group-suffixed series values,
/// e.g. `"az (Neubau)"`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MergedRow {
    pub index: String,
    pub values: BTreeMap<String, f64>,
}

impl MergedRow {
    pub fn new(index: impl Into<String>) -> Self {
        Self {
            index: index.into(),
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }
}
