//! Per-system derived records.
//!
//! [`SystemEfficiency`] holds efficiency ratios (COP), [`SystemEnergy`] holds
//! raw energy amounts. They are separate types so an energy amount can never
//! be mistaken for (or validated as) a COP value.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::records::MeasurementRow;

/// `thermal / electrical` when the electrical energy is positive.
///
/// Returns `None` instead of dividing by zero or producing a non-finite value.
pub fn efficiency_ratio(thermal_kwh: f64, electrical_kwh: f64) -> Option<f64> {
    if electrical_kwh > 0.0 && thermal_kwh.is_finite() && electrical_kwh.is_finite() {
        Some(thermal_kwh / electrical_kwh)
    } else {
        None
    }
}

/// Read access to the four energy totals of a per-system record.
pub trait EnergyTotals {
    fn heating_id(&self) -> &str;
    fn thermal_total_kwh(&self) -> f64;
    fn electrical_total_kwh(&self) -> f64;
    fn thermal_heating_total_kwh(&self) -> f64;
    fn electrical_heating_total_kwh(&self) -> f64;

    /// Efficiency values reported by the record itself, if it carries any.
    fn reported_cop(&self) -> (Option<f64>, Option<f64>) {
        (None, None)
    }

    /// Total COP recomputed from the energy totals.
    fn computed_az(&self) -> Option<f64> {
        efficiency_ratio(self.thermal_total_kwh(), self.electrical_total_kwh())
    }

    /// Heating-only COP recomputed from the energy totals.
    fn computed_az_heating(&self) -> Option<f64> {
        efficiency_ratio(
            self.thermal_heating_total_kwh(),
            self.electrical_heating_total_kwh(),
        )
    }
}

/// Running sums of the four energy fields.
///
/// A missing reading adds nothing; `readings` counts the values that were
/// actually present so "no data at all" stays distinguishable from zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EnergySums {
    pub thermal_kwh: f64,
    pub electrical_kwh: f64,
    pub thermal_heating_kwh: f64,
    pub electrical_heating_kwh: f64,
    pub readings: usize,
}

impl EnergySums {
    pub fn add_row(&mut self, row: &MeasurementRow) {
        Self::accumulate(&mut self.thermal_kwh, row.thermal_energy_kwh, &mut self.readings);
        Self::accumulate(&mut self.electrical_kwh, row.electrical_energy_kwh, &mut self.readings);
        Self::accumulate(
            &mut self.thermal_heating_kwh,
            row.thermal_energy_heating_kwh,
            &mut self.readings,
        );
        Self::accumulate(
            &mut self.electrical_heating_kwh,
            row.electrical_energy_heating_kwh,
            &mut self.readings,
        );
    }

    fn accumulate(total: &mut f64, value: Option<f64>, readings: &mut usize) {
        if let Some(v) = value {
            *total += v;
            *readings += 1;
        }
    }

    pub fn into_efficiency(self, heating_id: impl Into<String>) -> SystemEfficiency {
        SystemEfficiency::from_totals(
            heating_id,
            self.thermal_kwh,
            self.electrical_kwh,
            self.thermal_heating_kwh,
            self.electrical_heating_kwh,
        )
    }
}

/// Efficiency of one system over one period.
///
/// Invariant: `az == thermal / electrical` when `electrical > 0`, else `None`
/// (same rule for `az_heating` with the heating-only totals).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemEfficiency {
    pub heating_id: String,
    pub az: Option<f64>,
    pub az_heating: Option<f64>,
    pub thermal_energy_total_kwh: f64,
    pub electrical_energy_total_kwh: f64,
    pub thermal_energy_heating_total_kwh: f64,
    pub electrical_energy_heating_total_kwh: f64,
}

impl SystemEfficiency {
    /// Builds the record and derives both COP values from the totals.
    pub fn from_totals(
        heating_id: impl Into<String>,
        thermal_kwh: f64,
        electrical_kwh: f64,
        thermal_heating_kwh: f64,
        electrical_heating_kwh: f64,
    ) -> Self {
        Self {
            heating_id: heating_id.into(),
            az: efficiency_ratio(thermal_kwh, electrical_kwh),
            az_heating: efficiency_ratio(thermal_heating_kwh, electrical_heating_kwh),
            thermal_energy_total_kwh: thermal_kwh,
            electrical_energy_total_kwh: electrical_kwh,
            thermal_energy_heating_total_kwh: thermal_heating_kwh,
            electrical_energy_heating_total_kwh: electrical_heating_kwh,
        }
    }

    /// Energy view of this record for the given metric.
    pub fn to_energy(&self, metric: EnergyMetric) -> SystemEnergy {
        SystemEnergy::from_efficiency(self, metric)
    }
}

impl EnergyTotals for SystemEfficiency {
    fn heating_id(&self) -> &str {
        &self.heating_id
    }

    fn thermal_total_kwh(&self) -> f64 {
        self.thermal_energy_total_kwh
    }

    fn electrical_total_kwh(&self) -> f64 {
        self.electrical_energy_total_kwh
    }

    fn thermal_heating_total_kwh(&self) -> f64 {
        self.thermal_energy_heating_total_kwh
    }

    fn electrical_heating_total_kwh(&self) -> f64 {
        self.electrical_energy_heating_total_kwh
    }

    fn reported_cop(&self) -> (Option<f64>, Option<f64>) {
        (self.az, self.az_heating)
    }
}

/// Which energy amount an energy-mode chart shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnergyMetric {
    Thermal,
    Electrical,
}

/// Energy amounts of one system over one period ("energy mode").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemEnergy {
    pub heating_id: String,
    pub metric: EnergyMetric,
    pub energy_kwh: f64,
    pub energy_heating_kwh: f64,
    pub thermal_energy_total_kwh: f64,
    pub electrical_energy_total_kwh: f64,
    pub thermal_energy_heating_total_kwh: f64,
    pub electrical_energy_heating_total_kwh: f64,
}

impl SystemEnergy {
    pub fn from_efficiency(system: &SystemEfficiency, metric: EnergyMetric) -> Self {
        let (energy_kwh, energy_heating_kwh) = match metric {
            EnergyMetric::Thermal => (
                system.thermal_energy_total_kwh,
                system.thermal_energy_heating_total_kwh,
            ),
            EnergyMetric::Electrical => (
                system.electrical_energy_total_kwh,
                system.electrical_energy_heating_total_kwh,
            ),
        };

        Self {
            heating_id: system.heating_id.clone(),
            metric,
            energy_kwh,
            energy_heating_kwh,
            thermal_energy_total_kwh: system.thermal_energy_total_kwh,
            electrical_energy_total_kwh: system.electrical_energy_total_kwh,
            thermal_energy_heating_total_kwh: system.thermal_energy_heating_total_kwh,
            electrical_energy_heating_total_kwh: system.electrical_energy_heating_total_kwh,
        }
    }
}

impl EnergyTotals for SystemEnergy {
    fn heating_id(&self) -> &str {
        &self.heating_id
    }

    fn thermal_total_kwh(&self) -> f64 {
        self.thermal_energy_total_kwh
    }

    fn electrical_total_kwh(&self) -> f64 {
        self.electrical_energy_total_kwh
    }

    fn thermal_heating_total_kwh(&self) -> f64 {
        self.thermal_energy_heating_total_kwh
    }

    fn electrical_heating_total_kwh(&self) -> f64 {
        self.electrical_energy_heating_total_kwh
    }
}

/// Day-scoped efficiency (TAZ) for one system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEfficiency {
    pub date: NaiveDate,
    pub system: SystemEfficiency,
}

/// Descriptive metadata of a heating system, used for comparison filters.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SystemProfile {
    pub heating_id: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub heat_pump_type: Option<String>,
    pub building_type: Option<String>,
    pub construction_year: Option<i32>,
    pub heated_area_m2: Option<f64>,
    pub heating_load_kw: Option<f64>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl SystemProfile {
    pub fn new(heating_id: impl Into<String>) -> Self {
        Self {
            heating_id: heating_id.into(),
            ..Default::default()
        }
    }
}
