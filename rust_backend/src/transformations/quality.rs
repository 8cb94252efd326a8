//! Data quality classification for efficiency and energy readings.
//!
//! A COP outside `[0.0, 8.0]` or a negative energy reading is physically
//! impossible for a heat pump and indicates a metering or entry error. A
//! missing value is absence of data, not bad data, and always passes.

use serde::{Deserialize, Serialize};

use crate::models::{efficiency_ratio, EnergyTotals, MeasurementRow};

/// Lowest realistic COP.
pub const MIN_REALISTIC_COP: f64 = 0.0;
/// Highest realistic COP.
pub const MAX_REALISTIC_COP: f64 = 8.0;

/// Inclusive range of COP values considered realistic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CopRange {
    pub min: f64,
    pub max: f64,
}

impl Default for CopRange {
    fn default() -> Self {
        Self {
            min: MIN_REALISTIC_COP,
            max: MAX_REALISTIC_COP,
        }
    }
}

impl CopRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `None` passes; a value passes when it lies inside the inclusive range.
    pub fn accepts(&self, cop: Option<f64>) -> bool {
        match cop {
            None => true,
            Some(value) => value >= self.min && value <= self.max,
        }
    }
}

/// Counts of kept and dropped records from one filter pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub total: usize,
    pub kept: usize,
    pub unrealistic_cop: usize,
    pub negative_energy: usize,
}

impl QualityReport {
    pub fn dropped(&self) -> usize {
        self.total - self.kept
    }
}

/// Classify a COP value against the default realistic range.
///
/// # Examples
///
/// ```
/// use heatpump_analytics::transformations::quality::is_realistic_cop;
///
/// assert!(is_realistic_cop(Some(3.5)));
/// assert!(is_realistic_cop(Some(8.0)));
/// assert!(!is_realistic_cop(Some(9.0)));
/// assert!(is_realistic_cop(None));
/// ```
pub fn is_realistic_cop(cop: Option<f64>) -> bool {
    CopRange::default().accepts(cop)
}

fn has_negative_energy(row: &MeasurementRow) -> bool {
    row.energy_fields()
        .iter()
        .any(|field| matches!(field, Some(value) if *value < 0.0))
}

fn row_cop(thermal: Option<f64>, electrical: Option<f64>) -> Option<f64> {
    match (thermal, electrical) {
        (Some(t), Some(e)) => efficiency_ratio(t, e),
        _ => None,
    }
}

/// Remove rows with an unrealistic total or heating COP or any negative
/// energy field, against the default range.
pub fn filter_realistic_rows(rows: &[MeasurementRow]) -> Vec<MeasurementRow> {
    filter_realistic_rows_in(rows, &CopRange::default()).0
}

/// Like [`filter_realistic_rows`] with an explicit range, also returning a
/// [`QualityReport`].
pub fn filter_realistic_rows_in(
    rows: &[MeasurementRow],
    range: &CopRange,
) -> (Vec<MeasurementRow>, QualityReport) {
    let mut report = QualityReport {
        total: rows.len(),
        ..Default::default()
    };

    let kept: Vec<MeasurementRow> = rows
        .iter()
        .filter(|row| {
            if has_negative_energy(row) {
                report.negative_energy += 1;
                return false;
            }
            let az = row_cop(row.thermal_energy_kwh, row.electrical_energy_kwh);
            let az_heating = row_cop(
                row.thermal_energy_heating_kwh,
                row.electrical_energy_heating_kwh,
            );
            if !range.accepts(az) || !range.accepts(az_heating) {
                report.unrealistic_cop += 1;
                return false;
            }
            true
        })
        .cloned()
        .collect();

    report.kept = kept.len();
    log::debug!(
        "Row quality filter kept {} of {} rows ({} unrealistic COP, {} negative energy)",
        report.kept,
        report.total,
        report.unrealistic_cop,
        report.negative_energy
    );

    (kept, report)
}

/// Remove systems whose recomputed or reported COP is unrealistic.
///
/// COP is recomputed from the energy totals. Records that carry their own
/// efficiency values ([`crate::models::SystemEfficiency`]) have those checked
/// too; energy-mode records ([`crate::models::SystemEnergy`]) report none, so
/// their energy amounts are never validated as COP.
pub fn filter_systems_by_realistic_cop<T>(systems: &[T]) -> Vec<T>
where
    T: EnergyTotals + Clone,
{
    filter_systems_in(systems, true, &CopRange::default()).0
}

/// Variant with the reported-field check made explicit.
///
/// With `check_az_fields == false` only the recomputed COP is validated.
pub fn filter_systems_by_realistic_cop_with<T>(systems: &[T], check_az_fields: bool) -> Vec<T>
where
    T: EnergyTotals + Clone,
{
    filter_systems_in(systems, check_az_fields, &CopRange::default()).0
}

/// Full-control variant returning a [`QualityReport`].
pub fn filter_systems_in<T>(
    systems: &[T],
    check_az_fields: bool,
    range: &CopRange,
) -> (Vec<T>, QualityReport)
where
    T: EnergyTotals + Clone,
{
    let mut report = QualityReport {
        total: systems.len(),
        ..Default::default()
    };

    let kept: Vec<T> = systems
        .iter()
        .filter(|system| {
            let computed_ok =
                range.accepts(system.computed_az()) && range.accepts(system.computed_az_heating());
            let reported_ok = if check_az_fields {
                let (az, az_heating) = system.reported_cop();
                range.accepts(az) && range.accepts(az_heating)
            } else {
                true
            };

            if computed_ok && reported_ok {
                true
            } else {
                log::trace!("Excluding system {} with unrealistic COP", system.heating_id());
                report.unrealistic_cop += 1;
                false
            }
        })
        .cloned()
        .collect();

    report.kept = kept.len();
    log::debug!(
        "System quality filter kept {} of {} systems",
        report.kept,
        report.total
    );

    (kept, report)
}
