//! Heat pump efficiency analytics.
//!
//! Turns raw energy and temperature readings of heat pump systems into
//! chart-ready data: per-system efficiency (COP, "Arbeitszahl"), histogram
//! bins with summary statistics, robust efficiency-versus-temperature
//! regressions with LOESS curves, and two-group comparisons.
//!
//! Data flows rows → quality filter → aggregation → histogram or regression.
//! Every computation is pure and total: too little data yields `None` or an
//! empty result, never a panic.
//!
//! ```
//! use heatpump_analytics::models::MeasurementRow;
//! use heatpump_analytics::services::{calculate_system_az, create_histogram_bins, HistogramField};
//! use heatpump_analytics::transformations::filter_systems_by_realistic_cop;
//!
//! let rows = vec![
//!     MeasurementRow::new("hp-1").with_energy(350.0, 100.0),
//!     MeasurementRow::new("hp-2").with_energy(1200.0, 100.0),
//! ];
//! let systems = filter_systems_by_realistic_cop(&calculate_system_az(&rows));
//! let histogram = create_histogram_bins(&systems, HistogramField::Az, 0.5, false);
//! assert_eq!(histogram.stats.count, 1);
//! ```

pub mod algorithms;
pub mod config;
pub mod error;
pub mod models;
pub mod parsing;
pub mod services;
pub mod transformations;

pub use config::AnalyticsConfig;
pub use error::{AnalyticsError, AnalyticsResult};
