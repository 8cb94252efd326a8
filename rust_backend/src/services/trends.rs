//! Efficiency-versus-temperature trends.
//!
//! Entry points that prepare regression input, fit the robust line and the
//! LOESS smoother, and sample both into display curves.

use serde::{Deserialize, Serialize};

use crate::algorithms::loess::{loess_smooth_weighted, DEFAULT_BANDWIDTH};
use crate::algorithms::regression::{
    robust_linear_regression, CurveModel, RegressionResult, RobustRegressionOptions,
};
use crate::models::{DataPoint, IndexedObservation, WeightedDataPoint};

/// Parameters for [`compute_temperature_trend`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendOptions {
    pub robust: RobustRegressionOptions,
    pub loess_bandwidth: f64,
    /// Samples per display curve.
    pub curve_points: usize,
}

impl Default for TrendOptions {
    fn default() -> Self {
        Self {
            robust: RobustRegressionOptions::default(),
            loess_bandwidth: DEFAULT_BANDWIDTH,
            curve_points: 50,
        }
    }
}

/// Which efficiency value is plotted against temperature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CopSeries {
    #[default]
    Az,
    AzHeating,
}

/// Fitted trend of one series, ready for plotting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureTrend {
    pub regression: RegressionResult,
    pub regression_curve: Vec<DataPoint>,
    /// Empty when there are too few points to smooth.
    pub loess_curve: Vec<DataPoint>,
    pub sample_size: usize,
    pub x_min: f64,
    pub x_max: f64,
}

/// Keep points with finite coordinates and a positive efficiency.
///
/// A COP at or below zero is physically invalid and is dropped, not clamped.
pub fn prepare_regression_points(points: &[DataPoint]) -> Vec<DataPoint> {
    points
        .iter()
        .copied()
        .filter(|p| p.is_finite() && p.y > 0.0)
        .collect()
}

/// Weighted counterpart of [`prepare_regression_points`].
pub fn prepare_weighted_points(points: &[WeightedDataPoint]) -> Vec<WeightedDataPoint> {
    points
        .iter()
        .copied()
        .filter(|p| p.x.is_finite() && p.y.is_finite() && p.y > 0.0)
        .collect()
}

/// `(outdoor temperature, efficiency)` points from chart observations.
///
/// Observations lacking either value are skipped.
pub fn points_from_observations(
    observations: &[IndexedObservation],
    series: CopSeries,
) -> Vec<DataPoint> {
    observations
        .iter()
        .filter_map(|o| {
            let y = match series {
                CopSeries::Az => o.az,
                CopSeries::AzHeating => o.az_heating,
            };
            match (o.outdoor_temperature_c, y) {
                (Some(x), Some(y)) => Some(DataPoint::new(x, y)),
                _ => None,
            }
        })
        .collect()
}

/// Sample `model` at `n` evenly spaced x values from `x_min` to `x_max`.
///
/// `n == 0` gives no points and `n == 1` a single point at `x_min`. Samples
/// where the model is undefined are skipped.
pub fn generate_curve_points<M>(model: &M, x_min: f64, x_max: f64, n: usize) -> Vec<DataPoint>
where
    M: CurveModel + ?Sized,
{
    if n == 0 || !x_min.is_finite() || !x_max.is_finite() {
        return Vec::new();
    }
    if n == 1 {
        return model
            .predict_at(x_min)
            .map(|y| vec![DataPoint::new(x_min, y)])
            .unwrap_or_default();
    }

    let step = (x_max - x_min) / (n - 1) as f64;
    (0..n)
        .filter_map(|i| {
            let x = if i == n - 1 {
                x_max
            } else {
                x_min + step * i as f64
            };
            model.predict_at(x).map(|y| DataPoint::new(x, y))
        })
        .collect()
}

/// Robust line and LOESS curve of efficiency over temperature.
///
/// Returns `None` when fewer than two valid points remain.
pub fn compute_temperature_trend(
    points: &[DataPoint],
    options: &TrendOptions,
) -> Option<TemperatureTrend> {
    let weighted: Vec<WeightedDataPoint> = points.iter().copied().map(Into::into).collect();
    compute_weighted_temperature_trend(&weighted, options)
}

/// Like [`compute_temperature_trend`], with per-point confidence weights
/// applied to the LOESS curve. The robust line ignores the weights.
pub fn compute_weighted_temperature_trend(
    points: &[WeightedDataPoint],
    options: &TrendOptions,
) -> Option<TemperatureTrend> {
    let prepared = prepare_weighted_points(points);
    let plain: Vec<DataPoint> = prepared.iter().map(|p| DataPoint::new(p.x, p.y)).collect();

    let regression = robust_linear_regression(&plain, &options.robust)?;

    let (x_min, x_max) = plain
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
            (lo.min(p.x), hi.max(p.x))
        });

    let regression_curve = generate_curve_points(&regression, x_min, x_max, options.curve_points);
    let loess_curve = loess_smooth_weighted(&prepared, options.loess_bandwidth)
        .map(|smoother| generate_curve_points(&smoother, x_min, x_max, options.curve_points))
        .unwrap_or_default();

    log::debug!(
        "Temperature trend over {} points: slope {:.4}, r² {:.3}",
        regression.sample_size,
        regression.slope,
        regression.r_squared
    );

    Some(TemperatureTrend {
        sample_size: regression.sample_size,
        regression,
        regression_curve,
        loess_curve,
        x_min,
        x_max,
    })
}
